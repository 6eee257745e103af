//! Searching a mailbox and decoding the messages that match.

use std::time::Instant;

use log::Log;

use crate::batch::{plan, ChunkSize, Uid};
use crate::error::{Error, Result};
use crate::record::MessageRecord;
use crate::report::{ChunkFailure, OperationReport, Step};
use crate::session::Session;
use crate::utils::validate_mailbox;

/// The mailbox searched when none is given.
pub const DEFAULT_MAILBOX: &str = "INBOX";

/// The messages a [`MessageFetcher`] returned, and how the fetch went.
#[derive(Debug, Default)]
pub struct Fetched {
    /// One record per message that was fetched and decoded, in ascending UID order.
    pub messages: Vec<MessageRecord>,
    /// Timing, and the chunks that could not be fetched.
    pub report: OperationReport,
    /// Messages that were fetched but could not be parsed.
    pub skipped: usize,
}

/// Fetches the messages matching a search query, one chunk at a time.
pub struct MessageFetcher<'l> {
    chunk_size: ChunkSize,
    logger: &'l dyn Log,
}

impl MessageFetcher<'static> {
    /// A fetcher that logs through the global [`log`] facade.
    pub fn new(chunk_size: ChunkSize) -> Self {
        MessageFetcher {
            chunk_size,
            logger: log::logger(),
        }
    }
}

impl<'l> MessageFetcher<'l> {
    /// Log to `logger` instead.
    pub fn with_logger<'m>(self, logger: &'m dyn Log) -> MessageFetcher<'m> {
        MessageFetcher {
            chunk_size: self.chunk_size,
            logger,
        }
    }

    /// Fetch every message in `mailbox` (by default `INBOX`) that matches `query`.
    ///
    /// The mailbox is examined, so no flags change, not even `\Seen`. Chunks that cannot be
    /// fetched are recorded in [`Fetched::report`]; messages that cannot be parsed are counted
    /// in [`Fetched::skipped`]. Both are logged.
    pub fn fetch<S>(&self, session: &mut S, query: &str, mailbox: Option<&str>) -> Result<Fetched>
    where
        S: Session + ?Sized,
    {
        let mailbox = mailbox.unwrap_or(DEFAULT_MAILBOX);
        validate_mailbox("source", mailbox)?;

        let started = Instant::now();
        session.open(mailbox, true).map_err(|source| Error::Select {
            mailbox: mailbox.to_string(),
            source,
        })?;
        let uids = session.search(query).map_err(|source| Error::Search {
            query: query.to_string(),
            source,
        })?;

        let chunks = plan(&uids, self.chunk_size);
        log_to!(
            self.logger,
            Info,
            "Fetching {} messages matching {:?} from {}, {} chunks of size <= {}",
            uids.len(),
            query,
            mailbox,
            chunks.len(),
            self.chunk_size.get()
        );

        let mut fetched = Fetched {
            report: OperationReport {
                messages: uids.len(),
                ..OperationReport::default()
            },
            ..Fetched::default()
        };
        for chunk in chunks {
            log_to!(self.logger, Debug, "fetching {}", chunk);
            fetched.report.chunks += 1;
            let raw = match session.fetch_raw(&chunk) {
                Ok(raw) => raw,
                Err(error) => {
                    log_to!(
                        self.logger,
                        Warn,
                        "fetching {} from {} failed: {}",
                        chunk,
                        mailbox,
                        error
                    );
                    fetched.report.failures.push(ChunkFailure {
                        chunk,
                        step: Step::Fetch,
                        error,
                    });
                    continue;
                }
            };
            for message in raw {
                match mailparse::parse_mail(&message.body) {
                    Ok(parsed) => fetched
                        .messages
                        .push(MessageRecord::from_parsed(message.uid, &parsed)),
                    Err(e) => {
                        log_to!(
                            self.logger,
                            Warn,
                            "skipping message {} in {}: {}",
                            message.uid,
                            mailbox,
                            e
                        );
                        fetched.skipped += 1;
                    }
                }
            }
        }

        session.close().map_err(|source| Error::Close {
            mailbox: mailbox.to_string(),
            source,
        })?;
        fetched.report.elapsed = started.elapsed();

        log_to!(self.logger, Info, "Finished fetching {}", fetched.report);
        Ok(fetched)
    }
}

/// Every UID in `mailbox`, ascending.
pub fn all_uids<S>(session: &mut S, mailbox: &str) -> Result<Vec<Uid>>
where
    S: Session + ?Sized,
{
    validate_mailbox("source", mailbox)?;
    session.open(mailbox, true).map_err(|source| Error::Select {
        mailbox: mailbox.to_string(),
        source,
    })?;
    let uids = session.search("ALL").map_err(|source| Error::Search {
        query: "ALL".to_string(),
        source,
    })?;
    session.close().map_err(|source| Error::Close {
        mailbox: mailbox.to_string(),
        source,
    })?;
    Ok(uids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, CaptureLogger, ScriptedSession};
    use log::Level;

    fn message(subject: &str, body: &str) -> String {
        format!(
            "From: a@example.com\r\nSubject: {}\r\nContent-Type: text/plain\r\n\r\n{}\r\n",
            subject, body
        )
    }

    fn mailbox(name: &str, uids: &[Uid]) -> ScriptedSession {
        uids.iter().fold(ScriptedSession::new(), |s, &uid| {
            s.with_message(name, uid, message(&format!("m{}", uid), "hello"))
        })
    }

    #[test]
    fn defaults_to_inbox_and_reads_only() {
        let mut s = mailbox("INBOX", &[1, 2, 3]);
        let fetched = MessageFetcher::new(ChunkSize::new(2))
            .fetch(&mut s, "ALL", None)
            .unwrap();
        let uids: Vec<Uid> = fetched.messages.iter().map(|m| m.uid).collect();
        assert_eq!(uids, vec![1, 2, 3]);
        assert_eq!(fetched.messages[2].subject(), Some("m3"));
        assert_eq!(
            fetched.messages[0].text_body.as_deref().map(str::trim_end),
            Some("hello")
        );
        assert_eq!(fetched.skipped, 0);
        assert!(fetched.report.is_complete());
        assert_eq!(
            s.calls(),
            &[
                Call::open("INBOX", true),
                Call::Search("ALL".into()),
                Call::fetch(&[1, 2]),
                Call::fetch(&[3]),
                Call::Close,
            ][..]
        );
    }

    #[test]
    fn only_matching_messages() {
        let mut s = mailbox("Lists", &[1, 2, 3, 4]).with_search("UNSEEN", &[2, 4]);
        let fetched = MessageFetcher::new(ChunkSize::default())
            .fetch(&mut s, "UNSEEN", Some("Lists"))
            .unwrap();
        assert_eq!(fetched.report.messages, 2);
        assert_eq!(fetched.report.chunks, 1);
        let uids: Vec<Uid> = fetched.messages.iter().map(|m| m.uid).collect();
        assert_eq!(uids, vec![2, 4]);
    }

    #[test]
    fn failed_chunk_is_left_out() {
        let logger = CaptureLogger::default();
        let mut s = mailbox("INBOX", &[1, 2, 3]).failing(Call::fetch(&[1, 2]));
        let fetched = MessageFetcher::new(ChunkSize::new(2))
            .with_logger(&logger)
            .fetch(&mut s, "ALL", None)
            .unwrap();
        assert_eq!(fetched.messages.len(), 1);
        assert_eq!(fetched.messages[0].uid, 3);
        assert_eq!(fetched.report.failures.len(), 1);
        assert_eq!(fetched.report.failures[0].step, Step::Fetch);
        assert!(logger.contains(Level::Warn, "fetching 1,2 from INBOX failed"));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn unparseable_message_is_skipped() {
        let logger = CaptureLogger::default();
        // a message cannot open with a folded header line
        let mut s = mailbox("INBOX", &[1, 3]).with_message("INBOX", 2, " broken\r\n\r\nbody\r\n");
        let fetched = MessageFetcher::new(ChunkSize::default())
            .with_logger(&logger)
            .fetch(&mut s, "ALL", None)
            .unwrap();
        let uids: Vec<Uid> = fetched.messages.iter().map(|m| m.uid).collect();
        assert_eq!(uids, vec![1, 3]);
        assert_eq!(fetched.skipped, 1);
        assert!(fetched.report.is_complete());
        assert!(logger.contains(Level::Warn, "skipping message 2"));
    }

    #[test]
    fn empty_search() {
        let mut s = ScriptedSession::new()
            .with_mailbox("INBOX")
            .with_search("FROM nobody", &[]);
        let fetched = MessageFetcher::new(ChunkSize::default())
            .fetch(&mut s, "FROM nobody", None)
            .unwrap();
        assert!(fetched.messages.is_empty());
        assert_eq!(fetched.report.chunks, 0);
        assert_eq!(fetched.report.messages_per_second(), None);
        assert!(!s.calls().iter().any(|c| matches!(c, Call::Fetch(_))));
    }

    #[test]
    fn missing_mailbox_is_fatal() {
        let mut s = ScriptedSession::new();
        match MessageFetcher::new(ChunkSize::default()).fetch(&mut s, "ALL", Some("Nope")) {
            Err(Error::Select { mailbox, .. }) => assert_eq!(mailbox, "Nope"),
            r => panic!("expected a select error, got {:?}", r),
        }
    }

    #[test]
    fn search_failure_is_fatal() {
        let mut s = mailbox("INBOX", &[1]).failing(Call::Search("BOGUS".into()));
        match MessageFetcher::new(ChunkSize::default()).fetch(&mut s, "BOGUS", None) {
            Err(Error::Search { query, .. }) => assert_eq!(query, "BOGUS"),
            r => panic!("expected a search error, got {:?}", r),
        }
    }

    #[test]
    fn lists_every_uid() {
        let mut s = mailbox("Archive", &[4, 8, 15]);
        assert_eq!(all_uids(&mut s, "Archive").unwrap(), vec![4, 8, 15]);
        assert_eq!(s.calls()[1], Call::Search("ALL".into()));
        assert_eq!(s.selected(), None);
    }
}
