use std::cmp::min;
use std::io::{Error, ErrorKind, Read, Result, Write};
use std::sync::{Arc, Mutex};

/// A scripted byte stream standing in for the server side of a connection.
///
/// Everything the client writes is kept in a buffer that stays reachable through
/// [`MockStream::written`] after the stream has been moved into an `imap::Session`.
#[derive(Debug, Default)]
pub struct MockStream {
    read_buf: Vec<u8>,
    read_pos: usize,
    written_buf: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    pub fn new(read_buf: impl Into<Vec<u8>>) -> MockStream {
        MockStream {
            read_buf: read_buf.into(),
            ..MockStream::default()
        }
    }

    /// A handle on everything written to this stream so far.
    pub fn written(&self) -> Written {
        Written(Arc::clone(&self.written_buf))
    }
}

#[derive(Debug, Clone)]
pub struct Written(Arc<Mutex<Vec<u8>>>);

impl Written {
    /// The written bytes, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// The tag-less command lines that have been written.
    pub fn commands(&self) -> Vec<String> {
        self.text()
            .lines()
            .map(|line| match line.split_once(' ') {
                Some((_tag, command)) => command.to_string(),
                None => line.to_string(),
            })
            .collect()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.read_pos >= self.read_buf.len() {
            return Err(Error::new(ErrorKind::UnexpectedEof, "EOF"));
        }
        let write_len = min(buf.len(), self.read_buf.len() - self.read_pos);
        let max_pos = self.read_pos + write_len;
        buf[..write_len].copy_from_slice(&self.read_buf[self.read_pos..max_pos]);
        self.read_pos = max_pos;
        Ok(write_len)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written_buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
