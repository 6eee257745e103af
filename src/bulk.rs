//! Copy, move, delete, mark and unmark many messages at once.

use std::fmt;
use std::time::Instant;

use log::Log;

use crate::batch::{plan, Chunk, ChunkSize, Uid};
use crate::error::{Error, Result};
use crate::mailbox::ensure_mailbox;
use crate::report::{ChunkFailure, OperationReport, Step};
use crate::session::{FlagChange, Session, SessionResult};
use crate::utils::{validate_flag, validate_mailbox};

/// The flag that marks a message for removal by the next expunge.
pub const DELETED: &str = "\\Deleted";

/// A bulk operation together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Copy messages to `destination`, creating it if needed.
    Copy {
        /// Where the copies go.
        destination: String,
    },
    /// Copy messages to `destination`, then flag them `\Deleted` and expunge them from the
    /// source. A message is only flagged once its copy succeeded, and only expunged once it is
    /// flagged.
    Move {
        /// Where the messages go.
        destination: String,
    },
    /// Flag messages `\Deleted` and expunge them.
    Delete,
    /// Add `flag` to messages.
    Mark {
        /// Any system flag (`\Seen`) or keyword (`$Junk`).
        flag: String,
    },
    /// Remove `flag` from messages.
    Unmark {
        /// Any system flag (`\Seen`) or keyword (`$Junk`).
        flag: String,
    },
}

/// The kind of an [`Operation`], without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Copy,
    Move,
    Delete,
    Mark,
    Unmark,
}

impl Operation {
    /// The kind of this operation.
    pub fn kind(&self) -> OperationKind {
        match *self {
            Operation::Copy { .. } => OperationKind::Copy,
            Operation::Move { .. } => OperationKind::Move,
            Operation::Delete => OperationKind::Delete,
            Operation::Mark { .. } => OperationKind::Mark,
            Operation::Unmark { .. } => OperationKind::Unmark,
        }
    }

    /// The mailbox the messages are copied to, if any.
    pub fn destination(&self) -> Option<&str> {
        match self {
            Operation::Copy { destination } | Operation::Move { destination } => {
                Some(destination)
            }
            _ => None,
        }
    }

    /// Whether messages are expunged from the source.
    pub fn expunges(&self) -> bool {
        matches!(self, Operation::Move { .. } | Operation::Delete)
    }

    /// Whether the source mailbox has to be opened read-write.
    pub fn mutates_source(&self) -> bool {
        !matches!(self, Operation::Copy { .. })
    }

    fn validate(&self, source: &str) -> Result<()> {
        validate_mailbox("source", source)?;
        match self {
            Operation::Copy { destination } | Operation::Move { destination } => {
                validate_mailbox("destination", destination)?
            }
            Operation::Mark { flag } | Operation::Unmark { flag } => validate_flag(flag)?,
            Operation::Delete => {}
        }
        Ok(())
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            OperationKind::Copy => write!(f, "copying"),
            OperationKind::Move => write!(f, "moving"),
            OperationKind::Delete => write!(f, "deleting"),
            OperationKind::Mark => write!(f, "marking"),
            OperationKind::Unmark => write!(f, "unmarking"),
        }
    }
}

/// Runs an [`Operation`] over a list of UIDs, one chunk at a time.
///
/// A chunk that fails is logged and recorded in the returned [`OperationReport`], and the
/// executor moves on to the next one. Only failing to prepare the destination, or to open or
/// close the source, aborts the whole operation.
///
/// ```no_run
/// # use imap_bulk::{BulkExecutor, ChunkSize, Operation, Session};
/// # fn run(session: &mut impl Session) -> imap_bulk::Result<()> {
/// let op = Operation::Move { destination: "Archive".into() };
/// let report = BulkExecutor::new(ChunkSize::new(50)).execute(session, &op, "INBOX", &[1, 2, 3])?;
/// if !report.is_complete() {
///     eprintln!("{} chunks were not moved", report.failures.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct BulkExecutor<'l> {
    chunk_size: ChunkSize,
    logger: &'l dyn Log,
}

impl BulkExecutor<'static> {
    /// An executor that logs through the global [`log`] facade.
    pub fn new(chunk_size: ChunkSize) -> Self {
        BulkExecutor {
            chunk_size,
            logger: log::logger(),
        }
    }
}

impl<'l> BulkExecutor<'l> {
    /// Log to `logger` instead.
    pub fn with_logger<'m>(self, logger: &'m dyn Log) -> BulkExecutor<'m> {
        BulkExecutor {
            chunk_size: self.chunk_size,
            logger,
        }
    }

    /// Apply `op` to `uids` in the `source` mailbox.
    ///
    /// Move and Delete need a server that can expunge by UID; without one they fail with
    /// [`Error::Unsupported`] before any message is touched.
    pub fn execute<S>(
        &self,
        session: &mut S,
        op: &Operation,
        source: &str,
        uids: &[Uid],
    ) -> Result<OperationReport>
    where
        S: Session + ?Sized,
    {
        op.validate(source)?;

        if op.expunges() && !session.supports_uid_expunge().map_err(Error::Capabilities)? {
            return Err(Error::Unsupported("UIDPLUS"));
        }

        if let Some(destination) = op.destination() {
            ensure_mailbox(session, destination, self.logger)?;
        }

        let started = Instant::now();
        session
            .open(source, !op.mutates_source())
            .map_err(|e| Error::Select {
                mailbox: source.to_string(),
                source: e,
            })?;

        let chunks = plan(uids, self.chunk_size);
        log_to!(
            self.logger,
            Info,
            "{} {} UIDs in {}, {} chunks of size <= {}",
            op.kind(),
            uids.len(),
            source,
            chunks.len(),
            self.chunk_size.get()
        );

        let mut report = OperationReport {
            messages: uids.len(),
            ..OperationReport::default()
        };
        for chunk in chunks {
            log_to!(self.logger, Debug, "{} {}", op.kind(), chunk);
            report.chunks += 1;
            if let Err((step, error)) = self.run_chunk(session, op, &chunk) {
                log_to!(
                    self.logger,
                    Warn,
                    "{} {} from {}: {} failed: {}",
                    op.kind(),
                    chunk,
                    source,
                    step,
                    error
                );
                report.failures.push(ChunkFailure { chunk, step, error });
            }
        }

        session.close().map_err(|e| Error::Close {
            mailbox: source.to_string(),
            source: e,
        })?;
        report.elapsed = started.elapsed();

        log_to!(self.logger, Info, "Finished {} {}", op.kind(), report);
        Ok(report)
    }

    /// The primitive program for one chunk. Each step runs only if the previous one succeeded.
    fn run_chunk<S>(
        &self,
        session: &mut S,
        op: &Operation,
        chunk: &Chunk,
    ) -> std::result::Result<(), (Step, imap::Error)>
    where
        S: Session + ?Sized,
    {
        match op {
            Operation::Copy { destination } => at(Step::Copy, session.copy(chunk, destination)),
            Operation::Move { destination } => {
                at(Step::Copy, session.copy(chunk, destination))?;
                at(
                    Step::Store,
                    session.set_flags(chunk, DELETED, FlagChange::Add, true),
                )?;
                at(Step::Expunge, session.expunge(chunk))
            }
            Operation::Delete => {
                at(
                    Step::Store,
                    session.set_flags(chunk, DELETED, FlagChange::Add, true),
                )?;
                at(Step::Expunge, session.expunge(chunk))
            }
            Operation::Mark { flag } => at(
                Step::Store,
                session.set_flags(chunk, flag, FlagChange::Add, true),
            ),
            Operation::Unmark { flag } => at(
                Step::Store,
                session.set_flags(chunk, flag, FlagChange::Remove, true),
            ),
        }
    }
}

fn at<T>(step: Step, result: SessionResult<T>) -> std::result::Result<T, (Step, imap::Error)> {
    result.map_err(|e| (step, e))
}
