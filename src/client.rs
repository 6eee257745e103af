use std::io::{Read, Write};

use crate::batch::{Chunk, Uid};
use crate::session::{FlagChange, RawMessage, Session, SessionResult};

/// What is fetched for every message: its UID and its full content, without setting `\Seen`.
const FETCH_QUERY: &str = "(UID BODY.PEEK[])";

/// The extensions that change how bulk operations are issued.
#[derive(Debug, Clone, Copy)]
struct Extensions {
    unselect: bool,
    uidplus: bool,
}

/// A [`Session`] backed by a logged-in [`imap::Session`].
///
/// Every primitive maps to one UID command: `UID COPY`, `UID STORE`, `UID EXPUNGE` (which needs
/// the UIDPLUS extension), `UID SEARCH` and `UID FETCH`. The server's capabilities are asked for
/// once and remembered.
///
/// Leaving a mailbox never expunges it. With `UNSELECT` the mailbox is simply left; without it,
/// a mailbox opened read-write is examined again before `CLOSE`, since `CLOSE` on a read-write
/// mailbox removes every message flagged `\Deleted`. Mailboxes opened through
/// [`get_mut`](Self::get_mut) are not tracked.
#[derive(Debug)]
pub struct ImapSession<T: Read + Write> {
    inner: imap::Session<T>,
    extensions: Option<Extensions>,
    selected: Option<(String, bool)>,
}

impl<T: Read + Write> ImapSession<T> {
    /// Wrap an authenticated session.
    pub fn new(inner: imap::Session<T>) -> Self {
        ImapSession {
            inner,
            extensions: None,
            selected: None,
        }
    }

    /// Access the underlying session, e.g. to issue commands bulk operations do not cover.
    pub fn get_mut(&mut self) -> &mut imap::Session<T> {
        &mut self.inner
    }

    /// Unwrap the underlying session.
    pub fn into_inner(self) -> imap::Session<T> {
        self.inner
    }

    /// Log out; the session cannot be used afterwards.
    pub fn logout(&mut self) -> SessionResult<()> {
        self.inner.logout()
    }

    fn extensions(&mut self) -> SessionResult<Extensions> {
        if let Some(extensions) = self.extensions {
            return Ok(extensions);
        }
        let capabilities = self.inner.capabilities()?;
        let extensions = Extensions {
            unselect: capabilities.has_str("UNSELECT"),
            uidplus: capabilities.has_str("UIDPLUS"),
        };
        self.extensions = Some(extensions);
        Ok(extensions)
    }
}

impl<T: Read + Write> Session for ImapSession<T> {
    fn open(&mut self, mailbox: &str, read_only: bool) -> SessionResult<()> {
        // a failed SELECT or EXAMINE leaves nothing selected
        self.selected = None;
        if read_only {
            self.inner.examine(mailbox)?;
        } else {
            self.inner.select(mailbox)?;
        }
        self.selected = Some((mailbox.to_string(), read_only));
        Ok(())
    }

    fn create(&mut self, mailbox: &str) -> SessionResult<()> {
        self.inner.create(mailbox)
    }

    fn delete(&mut self, mailbox: &str) -> SessionResult<()> {
        self.inner.delete(mailbox)
    }

    fn close(&mut self) -> SessionResult<()> {
        let unselect = self.extensions()?.unselect;
        let selected = self.selected.take();
        if unselect {
            return self.inner.run_command_and_check_ok("UNSELECT");
        }
        if let Some((mailbox, false)) = selected {
            self.inner.examine(&mailbox)?;
        }
        self.inner.close()
    }

    fn supports_uid_expunge(&mut self) -> SessionResult<bool> {
        Ok(self.extensions()?.uidplus)
    }

    fn copy(&mut self, chunk: &Chunk, destination: &str) -> SessionResult<()> {
        self.inner.uid_copy(chunk.to_string(), destination)
    }

    fn set_flags(
        &mut self,
        chunk: &Chunk,
        flag: &str,
        change: FlagChange,
        silent: bool,
    ) -> SessionResult<()> {
        let sign = match change {
            FlagChange::Add => '+',
            FlagChange::Remove => '-',
        };
        let silent = if silent { ".SILENT" } else { "" };
        self.inner
            .uid_store(chunk.to_string(), format!("{}FLAGS{} ({})", sign, silent, flag))
            .map(|_| ())
    }

    fn expunge(&mut self, chunk: &Chunk) -> SessionResult<()> {
        self.inner.uid_expunge(chunk.to_string()).map(|_| ())
    }

    fn search(&mut self, query: &str) -> SessionResult<Vec<Uid>> {
        let mut uids: Vec<Uid> = self.inner.uid_search(query)?.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    fn fetch_raw(&mut self, chunk: &Chunk) -> SessionResult<Vec<RawMessage>> {
        let fetches = self.inner.uid_fetch(chunk.to_string(), FETCH_QUERY)?;
        Ok(fetches
            .iter()
            .filter_map(|fetch| match (fetch.uid, fetch.body()) {
                (Some(uid), Some(body)) => Some(RawMessage {
                    uid,
                    body: body.to_vec(),
                }),
                _ => None,
            })
            .collect())
    }
}
