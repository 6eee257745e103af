use std::fmt;
use std::time::Duration;

use crate::batch::Chunk;

/// The primitive that failed for a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// `UID COPY`
    Copy,
    /// `UID STORE`
    Store,
    /// `UID EXPUNGE`
    Expunge,
    /// `UID FETCH`
    Fetch,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Step::Copy => write!(f, "copy"),
            Step::Store => write!(f, "store"),
            Step::Expunge => write!(f, "expunge"),
            Step::Fetch => write!(f, "fetch"),
        }
    }
}

/// A chunk whose program stopped early. The steps after `step` were not attempted.
#[derive(Debug)]
pub struct ChunkFailure {
    /// The chunk that failed.
    pub chunk: Chunk,
    /// The step that failed.
    pub step: Step,
    /// What the server (or the connection) said.
    pub error: imap::Error,
}

/// What a bulk operation did, and how fast.
#[derive(Debug, Default)]
pub struct OperationReport {
    /// How many UIDs the operation was asked to process.
    pub messages: usize,
    /// How many chunks were attempted.
    pub chunks: usize,
    /// The chunks that did not complete, in the order they were attempted.
    pub failures: Vec<ChunkFailure>,
    /// Wall-clock time from opening the mailbox to closing it.
    pub elapsed: Duration,
}

impl OperationReport {
    /// Whether every chunk completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Messages processed per second, or `None` if there was nothing to measure.
    pub fn messages_per_second(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if self.messages == 0 || secs == 0.0 {
            return None;
        }
        Some(self.messages as f64 / secs)
    }

    /// Milliseconds spent per message, or `None` if there were no messages.
    pub fn ms_per_message(&self) -> Option<f64> {
        if self.messages == 0 {
            return None;
        }
        Some(self.elapsed.as_secs_f64() * 1000.0 / self.messages as f64)
    }
}

/// `12 messages in 0.53s (44.2ms per message; 22.6 messages per second)`
impl fmt::Display for OperationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} messages in {:.2}s",
            self.messages,
            self.elapsed.as_secs_f64()
        )?;
        if let (Some(ms), Some(rate)) = (self.ms_per_message(), self.messages_per_second()) {
            write!(f, " ({:.1}ms per message; {:.1} messages per second)", ms, rate)?;
        }
        if !self.failures.is_empty() {
            write!(f, ", {} of {} chunks failed", self.failures.len(), self.chunks)?;
        }
        Ok(())
    }
}
