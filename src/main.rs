//! Fetch the messages matching a query, print them, then flag, delete, move or copy them.
//!
//! To copy every message read since April 1st 2014 from INBOX to Processed:
//!
//! ```text
//! imap-bulk --query SEEN --since 2014-04-01 --dbox Processed imap.example.com 993 me@example.com
//! ```

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use imap_bulk::{Account, BulkClient, ChunkSize, MessageRecord, OperationReport, Server};

#[derive(Parser, Debug)]
#[command(name = "imap-bulk", version, about)]
struct Args {
    /// IMAP server host name
    host: String,
    /// IMAP server port (implicit TLS)
    port: u16,
    /// Login name
    username: String,
    /// Password
    #[arg(env = "IMAP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Search query selecting the messages to process
    #[arg(long, default_value = "ALL")]
    query: String,
    /// Only messages received on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    since: Option<NaiveDate>,
    /// Mailbox to fetch from
    #[arg(long, default_value = "INBOX")]
    mbox: String,
    /// Mailbox to copy (or move) the fetched messages to
    #[arg(long)]
    dbox: Option<String>,
    /// Number of messages per command
    #[arg(long, default_value_t = 2)]
    jobsize: i64,
    /// Move instead of copy when --dbox is given
    #[arg(long = "move")]
    move_: bool,
    /// Delete the fetched messages, and do nothing else with them
    #[arg(long)]
    delete: bool,
    /// Accept self-signed or otherwise invalid certificates
    #[arg(long)]
    skip_certi: bool,
    /// Flag to set on the fetched messages
    #[arg(long)]
    imapflag: Option<String>,
    /// Remove --imapflag instead of setting it
    #[arg(long, requires = "imapflag")]
    unmark: bool,
    /// Print every message as a JSON object
    #[arg(long)]
    json: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{}: expected YYYY-MM-DD", e))
}

impl Args {
    fn search_query(&self) -> String {
        match self.since {
            Some(date) => format!("{} SINCE {}", self.query, date.format("%d-%b-%Y")),
            None => self.query.clone(),
        }
    }
}

fn print_record(record: &MessageRecord, json: bool) -> imap_bulk::Result<()> {
    if json {
        println!("{}", record.to_json()?);
    } else {
        println!(
            "[{}] | {} | {} | {} | {} | {} | {}",
            record.uid,
            record.from().unwrap_or_default(),
            record.to().unwrap_or_default(),
            record.subject().unwrap_or_default(),
            record.text_body.as_deref().unwrap_or_default().trim(),
            record.html_body.as_deref().unwrap_or_default().trim(),
            record.alternate_body.as_deref().unwrap_or_default().trim(),
        );
    }
    Ok(())
}

/// Print the outcome of one operation. Returns whether it failed, wholly or for some chunks.
fn report(what: &str, result: imap_bulk::Result<OperationReport>) -> bool {
    match result {
        Ok(report) if report.is_complete() => {
            log::info!("{}: {}", what, report);
            false
        }
        Ok(report) => {
            for failure in &report.failures {
                log::error!(
                    "{}: {} of {} failed: {}",
                    what,
                    failure.step,
                    failure.chunk,
                    failure.error
                );
            }
            eprintln!("{}: {}", what, report);
            true
        }
        Err(e) => {
            eprintln!("error while {}: {}", what, e);
            true
        }
    }
}

/// Returns whether every operation succeeded.
fn run(args: &Args) -> imap_bulk::Result<bool> {
    let account = Account {
        skip_tls_verify: args.skip_certi,
        ..Account::new(
            args.username.as_str(),
            args.password.as_str(),
            Server::new(args.host.as_str(), args.port),
        )
    };
    let client = BulkClient::new(account, ChunkSize::new(args.jobsize));

    let fetched = client.get_emails(&args.search_query(), Some(&args.mbox))?;
    eprintln!(
        "Fetched {} messages ({} could not be decoded)",
        fetched.messages.len(),
        fetched.skipped
    );
    if !args.json {
        println!("UID | From | To | Subject | Body | HTML body | GPG body");
    }
    let mut uids = Vec::with_capacity(fetched.messages.len());
    for record in &fetched.messages {
        print_record(record, args.json)?;
        uids.push(record.uid);
    }

    let mut failed = false;
    if let Some(flag) = &args.imapflag {
        failed |= if args.unmark {
            report("unmarking", client.unmark_emails(&args.mbox, &uids, flag))
        } else {
            report("marking", client.mark_emails(&args.mbox, &uids, flag))
        };
    }

    if args.delete {
        failed |= report("deleting", client.delete_emails(&args.mbox, &uids));
        return Ok(!failed);
    }

    if let Some(dbox) = &args.dbox {
        failed |= if args.move_ {
            report("moving", client.move_emails(&args.mbox, dbox, &uids))
        } else {
            report("copying", client.copy_emails(&args.mbox, dbox, &uids))
        };
    }
    Ok(!failed)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_is_appended() {
        let args = Args::parse_from([
            "imap-bulk",
            "--query",
            "SEEN",
            "--since",
            "2014-04-01",
            "imap.example.com",
            "993",
            "me",
            "pw",
        ]);
        assert_eq!(args.search_query(), "SEEN SINCE 01-Apr-2014");
        assert_eq!(args.mbox, "INBOX");
        assert_eq!(args.jobsize, 2);
    }

    #[test]
    fn unmark_needs_a_flag() {
        let parsed = Args::try_parse_from(["imap-bulk", "--unmark", "h", "993", "me", "pw"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn failures_are_reported() {
        assert!(!report("marking", Ok(OperationReport::default())));
        assert!(report(
            "deleting",
            Err(imap_bulk::Error::Unsupported("UIDPLUS"))
        ));
        let partial = OperationReport {
            messages: 1,
            chunks: 1,
            failures: vec![imap_bulk::ChunkFailure {
                chunk: imap_bulk::plan(&[1], ChunkSize::default()).remove(0),
                step: imap_bulk::Step::Store,
                error: imap::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "no")),
            }],
            ..OperationReport::default()
        };
        assert!(report("moving", Ok(partial)));
    }

    #[test]
    fn bad_date() {
        assert!(parse_date("01/04/2014").is_err());
    }
}
