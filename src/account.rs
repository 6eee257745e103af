//! One-shot workflows: connect, log in, run a single operation, log out.

use std::fmt;

use log::Log;

use crate::batch::{ChunkSize, Uid};
use crate::bulk::{BulkExecutor, Operation};
use crate::client::ImapSession;
use crate::error::{Error, Result};
use crate::fetch::{self, Fetched, MessageFetcher};
use crate::mailbox;
use crate::report::OperationReport;

/// The session type the account workflows run on.
pub type Connection = ImapSession<imap::Connection>;

/// Where an IMAP server listens. Connections always use implicit TLS.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Server {
    /// Host name, also used to verify the server certificate.
    pub host: String,
    /// Usually 993.
    pub port: u16,
}

impl Server {
    /// A server at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Server {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Credentials for one mailbox store.
#[derive(Clone)]
pub struct Account {
    /// The login name.
    pub username: String,
    /// The password, sent with `LOGIN`.
    pub password: String,
    /// The server the account lives on.
    pub server: Server,
    /// Accept any certificate, e.g. a self-signed one on a test server.
    pub skip_tls_verify: bool,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

impl Account {
    /// An account that verifies the server certificate.
    pub fn new(username: impl Into<String>, password: impl Into<String>, server: Server) -> Self {
        Account {
            username: username.into(),
            password: password.into(),
            server,
            skip_tls_verify: false,
        }
    }

    /// Connect over TLS and log in.
    pub fn connect(&self) -> Result<Connection> {
        let client = imap::ClientBuilder::new(self.server.host.as_str(), self.server.port)
            .mode(imap::ConnectionMode::Tls)
            .danger_skip_tls_verify(self.skip_tls_verify)
            .connect()
            .map_err(Error::Connect)?;
        let session = client
            .login(&self.username, &self.password)
            .map_err(|(e, _)| Error::Login(e))?;
        Ok(ImapSession::new(session))
    }
}

/// Runs each operation on a fresh connection to an [`Account`].
///
/// ```no_run
/// # use imap_bulk::{Account, BulkClient, ChunkSize, Server};
/// # fn main() -> imap_bulk::Result<()> {
/// let account = Account::new("me", "secret", Server::new("imap.example.com", 993));
/// let client = BulkClient::new(account, ChunkSize::new(50));
/// let unseen = client.get_emails("UNSEEN", None)?;
/// let uids: Vec<_> = unseen.messages.iter().map(|m| m.uid).collect();
/// client.move_emails("INBOX", "Archive", &uids)?;
/// # Ok(())
/// # }
/// ```
pub struct BulkClient<'l> {
    account: Account,
    chunk_size: ChunkSize,
    logger: &'l dyn Log,
}

impl BulkClient<'static> {
    /// A client that logs through the global [`log`] facade.
    pub fn new(account: Account, chunk_size: ChunkSize) -> Self {
        BulkClient {
            account,
            chunk_size,
            logger: log::logger(),
        }
    }
}

impl<'l> BulkClient<'l> {
    /// Log to `logger` instead.
    pub fn with_logger<'m>(self, logger: &'m dyn Log) -> BulkClient<'m> {
        BulkClient {
            account: self.account,
            chunk_size: self.chunk_size,
            logger,
        }
    }

    /// The account operations run against.
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Copy `uids` from `source` to `destination`, creating `destination` if needed.
    pub fn copy_emails(
        &self,
        source: &str,
        destination: &str,
        uids: &[Uid],
    ) -> Result<OperationReport> {
        self.execute(
            &Operation::Copy {
                destination: destination.to_string(),
            },
            source,
            uids,
        )
    }

    /// Move `uids` from `source` to `destination`, creating `destination` if needed.
    pub fn move_emails(
        &self,
        source: &str,
        destination: &str,
        uids: &[Uid],
    ) -> Result<OperationReport> {
        self.execute(
            &Operation::Move {
                destination: destination.to_string(),
            },
            source,
            uids,
        )
    }

    /// Delete `uids` from `source`.
    pub fn delete_emails(&self, source: &str, uids: &[Uid]) -> Result<OperationReport> {
        self.execute(&Operation::Delete, source, uids)
    }

    /// Add `flag` to `uids` in `source`.
    pub fn mark_emails(&self, source: &str, uids: &[Uid], flag: &str) -> Result<OperationReport> {
        self.execute(
            &Operation::Mark {
                flag: flag.to_string(),
            },
            source,
            uids,
        )
    }

    /// Remove `flag` from `uids` in `source`.
    pub fn unmark_emails(
        &self,
        source: &str,
        uids: &[Uid],
        flag: &str,
    ) -> Result<OperationReport> {
        self.execute(
            &Operation::Unmark {
                flag: flag.to_string(),
            },
            source,
            uids,
        )
    }

    /// Fetch the messages in `mailbox` (by default `INBOX`) matching `query`.
    pub fn get_emails(&self, query: &str, mailbox: Option<&str>) -> Result<Fetched> {
        self.with_session("fetching", |session, logger| {
            MessageFetcher::new(self.chunk_size)
                .with_logger(logger)
                .fetch(session, query, mailbox)
        })
    }

    /// Every UID in `mailbox`.
    pub fn all_uids(&self, mailbox: &str) -> Result<Vec<Uid>> {
        self.with_session("listing", |session, _| fetch::all_uids(session, mailbox))
    }

    /// Create `name` unless it already exists.
    pub fn create_mailbox(&self, name: &str) -> Result<()> {
        self.with_session("creating a mailbox", |session, logger| {
            mailbox::ensure_mailbox(session, name, logger)
        })
    }

    /// Delete `name` if it exists.
    pub fn delete_mailbox(&self, name: &str) -> Result<()> {
        self.with_session("deleting a mailbox", |session, logger| {
            mailbox::delete_mailbox(session, name, logger)
        })
    }

    fn execute(&self, op: &Operation, source: &str, uids: &[Uid]) -> Result<OperationReport> {
        let what = op.kind().to_string();
        self.with_session(&what, |session, logger| {
            BulkExecutor::new(self.chunk_size)
                .with_logger(logger)
                .execute(session, op, source, uids)
        })
    }

    fn with_session<R, F>(&self, what: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Connection, &dyn Log) -> Result<R>,
    {
        log_to!(
            self.logger,
            Info,
            "Starting {} for {} on {}",
            what,
            self.account.username,
            self.account.server
        );
        let mut session = self.account.connect()?;
        let result = f(&mut session, self.logger);
        if let Err(e) = session.logout() {
            log_to!(
                self.logger,
                Warn,
                "logging out of {} failed: {}",
                self.account.server,
                e
            );
        }
        result
    }
}
