//! Bulk operations on IMAP mailboxes.
//!
//! This crate copies, moves, deletes, flags and fetches large numbers of messages, addressed by
//! UID. Long UID lists are split into chunks (see [`plan`]) so that no single command grows past
//! what a server is willing to accept, and a chunk the server rejects does not stop the others.
//!
//! The protocol itself is spoken by the [`imap`] crate. Everything here is written against the
//! small [`Session`] trait, which [`ImapSession`] implements for a logged-in [`imap::Session`].
//!
//! # Usage
//!
//! ```no_run
//! use imap_bulk::{Account, BulkClient, ChunkSize, Server};
//!
//! fn main() -> imap_bulk::Result<()> {
//!     let account = Account::new("username", "password", Server::new("imap.example.com", 993));
//!     let client = BulkClient::new(account, ChunkSize::new(50));
//!
//!     let fetched = client.get_emails("FROM newsletter@example.com", None)?;
//!     for message in &fetched.messages {
//!         println!("{} {}", message.uid, message.subject().unwrap_or_default());
//!     }
//!
//!     let uids: Vec<_> = fetched.messages.iter().map(|m| m.uid).collect();
//!     let report = client.move_emails("INBOX", "Newsletters", &uids)?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! To run several operations over one connection, use [`Account::connect`] and drive a
//! [`BulkExecutor`] or [`MessageFetcher`] directly.
//!
//! # Logging
//!
//! Progress is reported through the [`log`] facade: `info` when an operation starts and
//! finishes, `debug` for every chunk and `warn` for every chunk or message that failed.
//! Components log to [`log::logger()`] unless given a logger of their own with `with_logger`.

#![warn(rust_2018_idioms)]

#[macro_use]
mod logging;

mod account;
mod batch;
mod body;
mod bulk;
mod client;
mod error;
mod fetch;
mod mailbox;
mod record;
mod report;
mod session;
mod utils;

pub use crate::account::{Account, BulkClient, Connection, Server};
pub use crate::batch::{plan, Chunk, ChunkSize, Uid};
pub use crate::body::Bodies;
pub use crate::bulk::{BulkExecutor, Operation, OperationKind, DELETED};
pub use crate::client::ImapSession;
pub use crate::error::{Error, Result, ValidateError};
pub use crate::fetch::{all_uids, Fetched, MessageFetcher, DEFAULT_MAILBOX};
pub use crate::mailbox::{delete_mailbox, ensure_mailbox};
pub use crate::record::MessageRecord;
pub use crate::report::{ChunkFailure, OperationReport, Step};
pub use crate::session::{FlagChange, RawMessage, Session, SessionResult};

#[cfg(any(test, feature = "test_helpers"))]
pub mod testing;

#[cfg(test)]
mod mock_stream;
