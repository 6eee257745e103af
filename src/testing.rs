//! Enable the test_helpers feature to expose an in-memory [`Session`] and a capturing logger for
//! testing code that drives bulk operations.
//!
//! To use add a dev-dependency on the imap-bulk crate adding the feature "test_helpers"
//! e.g.
//!
//! ```toml
//! [dependencies]
//! imap-bulk = { version = "0.1" }
//!
//! [dev-dependencies]
//! # mirror the same configuration your dependencies and add test_helpers
//! imap-bulk = { version = "0.1", features = ["test_helpers"] }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::sync::Mutex;

use log::{Level, Log, Metadata, Record};

use crate::batch::{Chunk, Uid};
use crate::session::{FlagChange, RawMessage, Session, SessionResult};

/// A primitive issued against a [`ScriptedSession`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    /// [`Session::open`]
    Open {
        /// The mailbox to select or examine.
        mailbox: String,
        /// Whether it was examined.
        read_only: bool,
    },
    /// [`Session::create`] of the named mailbox.
    Create(String),
    /// [`Session::delete`] of the named mailbox.
    Delete(String),
    /// [`Session::close`]
    Close,
    /// [`Session::copy`]
    Copy {
        /// The chunk that was copied.
        uids: Vec<Uid>,
        /// Where it was copied to.
        destination: String,
    },
    /// [`Session::set_flags`]
    Store {
        /// The chunk whose flags changed.
        uids: Vec<Uid>,
        /// The flag added or removed.
        flag: String,
        /// Added or removed.
        change: FlagChange,
        /// Whether the server was asked not to echo the new flags.
        silent: bool,
    },
    /// [`Session::expunge`] of a chunk.
    Expunge(Vec<Uid>),
    /// [`Session::search`] with the given query.
    Search(String),
    /// [`Session::fetch_raw`] of a chunk.
    Fetch(Vec<Uid>),
}

impl Call {
    /// An open of `mailbox`, read-only or not.
    pub fn open(mailbox: &str, read_only: bool) -> Call {
        Call::Open {
            mailbox: mailbox.to_string(),
            read_only,
        }
    }

    /// A copy of `uids` to `destination`.
    pub fn copy(uids: &[Uid], destination: &str) -> Call {
        Call::Copy {
            uids: uids.to_vec(),
            destination: destination.to_string(),
        }
    }

    /// A silent store, which is what bulk operations issue.
    pub fn store(uids: &[Uid], flag: &str, change: FlagChange) -> Call {
        Call::Store {
            uids: uids.to_vec(),
            flag: flag.to_string(),
            change,
            silent: true,
        }
    }

    /// An expunge of `uids`.
    pub fn expunge(uids: &[Uid]) -> Call {
        Call::Expunge(uids.to_vec())
    }

    /// A fetch of `uids`.
    pub fn fetch(uids: &[Uid]) -> Call {
        Call::Fetch(uids.to_vec())
    }
}

#[derive(Debug, Clone, Default)]
struct Message {
    raw: Vec<u8>,
    flags: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
struct Mailbox {
    messages: BTreeMap<Uid, Message>,
    uid_next: Uid,
}

impl Mailbox {
    fn append(&mut self, message: Message) {
        self.uid_next = self.uid_next.max(1);
        self.messages.insert(self.uid_next, message);
        self.uid_next += 1;
    }
}

/// An in-memory mail store that behaves like a small IMAP server and records every call.
///
/// Calls registered with [`ScriptedSession::failing`] are refused every time they are issued,
/// before they have any effect.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    mailboxes: BTreeMap<String, Mailbox>,
    selected: Option<(String, bool)>,
    searches: HashMap<String, Vec<Uid>>,
    failing: Vec<Call>,
    calls: Vec<Call>,
    no_uid_expunge: bool,
}

fn refused(what: impl Into<String>) -> imap::Error {
    imap::Error::Io(io::Error::new(io::ErrorKind::Other, what.into()))
}

impl ScriptedSession {
    /// A session with no mailboxes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty mailbox.
    pub fn with_mailbox(mut self, name: &str) -> Self {
        self.mailboxes.entry(name.to_string()).or_default();
        self
    }

    /// Add a message with a fixed UID, creating the mailbox if needed.
    pub fn with_message(mut self, mailbox: &str, uid: Uid, raw: impl Into<Vec<u8>>) -> Self {
        let mailbox = self.mailboxes.entry(mailbox.to_string()).or_default();
        mailbox.messages.insert(
            uid,
            Message {
                raw: raw.into(),
                flags: BTreeSet::new(),
            },
        );
        mailbox.uid_next = mailbox.uid_next.max(uid + 1);
        self
    }

    /// Answer `query` with `uids`. Other queries match every message in the mailbox.
    pub fn with_search(mut self, query: &str, uids: &[Uid]) -> Self {
        self.searches.insert(query.to_string(), uids.to_vec());
        self
    }

    /// Refuse `call` whenever it is issued.
    pub fn failing(mut self, call: Call) -> Self {
        self.failing.push(call);
        self
    }

    /// Behave like a server without UIDPLUS.
    pub fn without_uid_expunge(mut self) -> Self {
        self.no_uid_expunge = true;
        self
    }

    /// Every call issued so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// The selected mailbox, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_ref().map(|(name, _)| name.as_str())
    }

    /// Whether `name` exists.
    pub fn has_mailbox(&self, name: &str) -> bool {
        self.mailboxes.contains_key(name)
    }

    /// The names of all mailboxes, sorted.
    pub fn mailbox_names(&self) -> Vec<String> {
        self.mailboxes.keys().cloned().collect()
    }

    /// The UIDs in `mailbox`, ascending.
    pub fn uids(&self, mailbox: &str) -> Vec<Uid> {
        self.mailboxes
            .get(mailbox)
            .map(|m| m.messages.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The flags set on a message, sorted.
    pub fn flags(&self, mailbox: &str, uid: Uid) -> Vec<String> {
        self.mailboxes
            .get(mailbox)
            .and_then(|m| m.messages.get(&uid))
            .map(|m| m.flags.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&mut self, call: Call) -> SessionResult<()> {
        let refuse = self.failing.contains(&call);
        self.calls.push(call);
        if refuse {
            return Err(refused("refused by script"));
        }
        Ok(())
    }

    fn current(&mut self, writable: bool) -> SessionResult<&mut Mailbox> {
        let (name, read_only) = self
            .selected
            .as_ref()
            .ok_or_else(|| refused("no mailbox selected"))?;
        if writable && *read_only {
            return Err(refused("mailbox is read-only"));
        }
        self.mailboxes
            .get_mut(name)
            .ok_or_else(|| refused("selected mailbox is gone"))
    }
}

impl Session for ScriptedSession {
    fn open(&mut self, mailbox: &str, read_only: bool) -> SessionResult<()> {
        self.record(Call::open(mailbox, read_only))?;
        if !self.mailboxes.contains_key(mailbox) {
            self.selected = None;
            return Err(refused(format!("no such mailbox {}", mailbox)));
        }
        self.selected = Some((mailbox.to_string(), read_only));
        Ok(())
    }

    fn create(&mut self, mailbox: &str) -> SessionResult<()> {
        self.record(Call::Create(mailbox.to_string()))?;
        if self.mailboxes.contains_key(mailbox) {
            return Err(refused(format!("mailbox {} already exists", mailbox)));
        }
        self.mailboxes.insert(mailbox.to_string(), Mailbox::default());
        Ok(())
    }

    fn delete(&mut self, mailbox: &str) -> SessionResult<()> {
        self.record(Call::Delete(mailbox.to_string()))?;
        self.mailboxes
            .remove(mailbox)
            .map(|_| ())
            .ok_or_else(|| refused(format!("no such mailbox {}", mailbox)))
    }

    fn close(&mut self) -> SessionResult<()> {
        self.record(Call::Close)?;
        self.selected
            .take()
            .map(|_| ())
            .ok_or_else(|| refused("no mailbox selected"))
    }

    fn copy(&mut self, chunk: &Chunk, destination: &str) -> SessionResult<()> {
        self.record(Call::copy(chunk, destination))?;
        let copies: Vec<Message> = {
            let source = self.current(false)?;
            chunk
                .iter()
                .filter_map(|uid| source.messages.get(uid))
                .map(|m| Message {
                    raw: m.raw.clone(),
                    flags: m.flags.clone(),
                })
                .collect()
        };
        let destination = self
            .mailboxes
            .get_mut(destination)
            .ok_or_else(|| refused(format!("[TRYCREATE] no such mailbox {}", destination)))?;
        for message in copies {
            destination.append(message);
        }
        Ok(())
    }

    fn set_flags(
        &mut self,
        chunk: &Chunk,
        flag: &str,
        change: FlagChange,
        silent: bool,
    ) -> SessionResult<()> {
        self.record(Call::Store {
            uids: chunk.to_vec(),
            flag: flag.to_string(),
            change,
            silent,
        })?;
        let mailbox = self.current(true)?;
        for uid in chunk.iter() {
            if let Some(message) = mailbox.messages.get_mut(uid) {
                match change {
                    FlagChange::Add => message.flags.insert(flag.to_string()),
                    FlagChange::Remove => message.flags.remove(flag),
                };
            }
        }
        Ok(())
    }

    fn supports_uid_expunge(&mut self) -> SessionResult<bool> {
        Ok(!self.no_uid_expunge)
    }

    fn expunge(&mut self, chunk: &Chunk) -> SessionResult<()> {
        self.record(Call::expunge(chunk))?;
        if self.no_uid_expunge {
            return Err(refused("UID EXPUNGE needs UIDPLUS"));
        }
        let mailbox = self.current(true)?;
        for uid in chunk.iter() {
            let deleted = mailbox
                .messages
                .get(uid)
                .map_or(false, |m| m.flags.contains(crate::bulk::DELETED));
            if deleted {
                mailbox.messages.remove(uid);
            }
        }
        Ok(())
    }

    fn search(&mut self, query: &str) -> SessionResult<Vec<Uid>> {
        self.record(Call::Search(query.to_string()))?;
        if let Some(uids) = self.searches.get(query).cloned() {
            self.current(false)?;
            return Ok(uids);
        }
        Ok(self.current(false)?.messages.keys().copied().collect())
    }

    fn fetch_raw(&mut self, chunk: &Chunk) -> SessionResult<Vec<RawMessage>> {
        self.record(Call::fetch(chunk))?;
        let mailbox = self.current(false)?;
        Ok(chunk
            .iter()
            .filter_map(|uid| {
                mailbox.messages.get(uid).map(|m| RawMessage {
                    uid: *uid,
                    body: m.raw.clone(),
                })
            })
            .collect())
    }
}

/// A [`Log`] that keeps every record it is given.
#[derive(Debug, Default)]
pub struct CaptureLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl CaptureLogger {
    /// Everything logged so far, as level and message.
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Whether a record at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{plan, ChunkSize};

    #[test]
    fn refused_calls_have_no_effect() {
        let mut s = ScriptedSession::new()
            .with_message("INBOX", 1, "Subject: one\r\n\r\n")
            .with_message("INBOX", 2, "Subject: two\r\n\r\n")
            .failing(Call::expunge(&[2]));
        s.open("INBOX", false).unwrap();
        for chunk in plan(&[1, 2], ChunkSize::new(1)) {
            s.set_flags(&chunk, crate::bulk::DELETED, FlagChange::Add, true)
                .unwrap();
            let _ = s.expunge(&chunk);
        }
        assert_eq!(s.uids("INBOX"), vec![2]);
        assert_eq!(s.flags("INBOX", 2), vec!["\\Deleted".to_string()]);
        assert_eq!(s.calls().len(), 5);
    }

    #[test]
    fn copies_get_fresh_uids() {
        let mut s = ScriptedSession::new()
            .with_message("INBOX", 7, "a")
            .with_message("Archive", 3, "b");
        s.open("INBOX", true).unwrap();
        let chunk = plan(&[7], ChunkSize::default()).remove(0);
        s.copy(&chunk, "Archive").unwrap();
        assert_eq!(s.uids("Archive"), vec![3, 4]);
        // examined, so read-only
        assert!(s.set_flags(&chunk, "x", FlagChange::Add, true).is_err());
    }
}
