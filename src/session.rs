//! The protocol primitives bulk operations are built from.

use crate::batch::{Chunk, Uid};

/// Result of a single protocol primitive.
pub type SessionResult<T> = std::result::Result<T, imap::Error>;

/// Whether a `STORE` adds or removes a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagChange {
    /// `+FLAGS`
    Add,
    /// `-FLAGS`
    Remove,
}

/// The full RFC 822 bytes of one message, as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// The message's UID in the mailbox it was fetched from.
    pub uid: Uid,
    /// The message, headers and body.
    pub body: Vec<u8>,
}

/// An authenticated IMAP session, reduced to what bulk operations need.
///
/// Every method is one blocking round-trip. Messages are always addressed by UID, never by
/// sequence number. Implemented for [`ImapSession`](crate::client::ImapSession); tests use
/// [`ScriptedSession`](crate::testing::ScriptedSession).
pub trait Session {
    /// Select `mailbox`, or examine it when `read_only` is set.
    fn open(&mut self, mailbox: &str, read_only: bool) -> SessionResult<()>;

    /// Create `mailbox`.
    fn create(&mut self, mailbox: &str) -> SessionResult<()>;

    /// Delete `mailbox`.
    fn delete(&mut self, mailbox: &str) -> SessionResult<()>;

    /// Leave the selected mailbox and return to the authenticated state.
    fn close(&mut self) -> SessionResult<()>;

    /// Copy the messages in `chunk` to `destination`.
    fn copy(&mut self, chunk: &Chunk, destination: &str) -> SessionResult<()>;

    /// Add or remove `flag` on every message in `chunk`. A `silent` store asks the server not to
    /// echo the resulting flags back.
    fn set_flags(
        &mut self,
        chunk: &Chunk,
        flag: &str,
        change: FlagChange,
        silent: bool,
    ) -> SessionResult<()>;

    /// Whether [`expunge`](Self::expunge) can be limited to a chunk (the UIDPLUS extension).
    fn supports_uid_expunge(&mut self) -> SessionResult<bool> {
        Ok(true)
    }

    /// Permanently remove the messages in `chunk` that are flagged `\Deleted`. Requires
    /// [`supports_uid_expunge`](Self::supports_uid_expunge).
    fn expunge(&mut self, chunk: &Chunk) -> SessionResult<()>;

    /// Resolve a search expression (RFC 3501 section 6.4.4) to UIDs.
    fn search(&mut self, query: &str) -> SessionResult<Vec<Uid>>;

    /// Fetch the full content of every message in `chunk`.
    fn fetch_raw(&mut self, chunk: &Chunk) -> SessionResult<Vec<RawMessage>>;
}
