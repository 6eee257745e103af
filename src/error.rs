//! IMAP bulk operation error types.

use std::result;

use thiserror::Error;

/// A convenience wrapper around `Result` for `imap_bulk::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that abort a bulk operation.
///
/// Failures confined to a single chunk or a single message never show up here; they are recorded
/// in the [`OperationReport`](crate::OperationReport) and logged instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument was rejected before anything was sent to the server.
    #[error(transparent)]
    Validate(#[from] ValidateError),
    /// The connection to the IMAP server could not be established.
    #[error("could not connect: {0}")]
    Connect(#[source] imap::Error),
    /// The server rejected our credentials.
    #[error("could not log in: {0}")]
    Login(#[source] imap::Error),
    /// The server's capabilities could not be listed.
    #[error("could not list capabilities: {0}")]
    Capabilities(#[source] imap::Error),
    /// The server lacks an extension the operation needs.
    #[error("server does not support {0}")]
    Unsupported(&'static str),
    /// A mailbox could not be created.
    #[error("could not create mailbox {mailbox:?}: {source}")]
    Create {
        /// The mailbox we tried to create.
        mailbox: String,
        /// What the server said.
        source: imap::Error,
    },
    /// A mailbox could not be selected (or examined).
    #[error("could not select mailbox {mailbox:?}: {source}")]
    Select {
        /// The mailbox we tried to select.
        mailbox: String,
        /// What the server said.
        source: imap::Error,
    },
    /// A mailbox could not be closed, so the session is in an unknown state.
    #[error("could not close mailbox {mailbox:?}: {source}")]
    Close {
        /// The mailbox that was selected.
        mailbox: String,
        /// What the server said.
        source: imap::Error,
    },
    /// A mailbox could not be deleted.
    #[error("could not delete mailbox {mailbox:?}: {source}")]
    Delete {
        /// The mailbox we tried to delete.
        mailbox: String,
        /// What the server said.
        source: imap::Error,
    },
    /// A search query could not be resolved to a set of UIDs.
    #[error("search {query:?} failed: {source}")]
    Search {
        /// The query as given by the caller.
        query: String,
        /// What the server said.
        source: imap::Error,
    },
    /// A message record could not be serialized.
    #[error("could not serialize message: {0}")]
    Json(#[from] serde_json::Error),
}

/// An argument that cannot be turned into a valid command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidateError {
    /// A mailbox name was empty.
    #[error("no {0} mailbox provided")]
    EmptyMailbox(&'static str),
    /// No flag was given to a mark or unmark operation.
    #[error("no flag provided")]
    EmptyFlag,
    /// The flag contains characters that are not allowed in a flag.
    #[error("invalid flag {0:?}")]
    InvalidFlag(String),
}
