//! Creating and removing mailboxes.

use log::Log;

use crate::error::{Error, Result};
use crate::session::Session;
use crate::utils::validate_mailbox;

/// Make sure `name` exists, creating it if it cannot be opened.
///
/// The mailbox is closed again before returning, so the session is left with nothing selected.
/// Calling this on a mailbox that already exists only opens and closes it.
pub fn ensure_mailbox<S>(session: &mut S, name: &str, logger: &dyn Log) -> Result<()>
where
    S: Session + ?Sized,
{
    validate_mailbox("destination", name)?;

    if let Err(e) = session.open(name, true) {
        log_to!(logger, Info, "Mailbox {:?} not available ({}), creating it", name, e);
        session.create(name).map_err(|source| Error::Create {
            mailbox: name.to_string(),
            source,
        })?;
        session.open(name, true).map_err(|source| Error::Select {
            mailbox: name.to_string(),
            source,
        })?;
    }

    session.close().map_err(|source| Error::Close {
        mailbox: name.to_string(),
        source,
    })
}

/// Delete `name` if it exists.
///
/// A mailbox that cannot be opened is taken to be absent and left alone.
pub fn delete_mailbox<S>(session: &mut S, name: &str, logger: &dyn Log) -> Result<()>
where
    S: Session + ?Sized,
{
    validate_mailbox("target", name)?;

    if let Err(e) = session.open(name, true) {
        log_to!(logger, Info, "Mailbox {:?} not available ({}), nothing to delete", name, e);
        return Ok(());
    }
    session.close().map_err(|source| Error::Close {
        mailbox: name.to_string(),
        source,
    })?;
    session.delete(name).map_err(|source| Error::Delete {
        mailbox: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidateError;
    use crate::testing::{Call, ScriptedSession};

    #[test]
    fn existing_mailbox_is_opened_and_closed() {
        let mut s = ScriptedSession::new().with_mailbox("Archive");
        ensure_mailbox(&mut s, "Archive", log::logger()).unwrap();
        assert_eq!(
            s.calls(),
            &[Call::open("Archive", true), Call::Close][..],
        );
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn missing_mailbox_is_created() {
        let mut s = ScriptedSession::new();
        ensure_mailbox(&mut s, "Archive", log::logger()).unwrap();
        assert!(s.has_mailbox("Archive"));
        assert_eq!(
            s.calls(),
            &[
                Call::open("Archive", true),
                Call::Create("Archive".into()),
                Call::open("Archive", true),
                Call::Close,
            ][..],
        );
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn idempotent() {
        let mut s = ScriptedSession::new();
        ensure_mailbox(&mut s, "Archive", log::logger()).unwrap();
        let mailboxes = s.mailbox_names();
        ensure_mailbox(&mut s, "Archive", log::logger()).unwrap();
        assert_eq!(s.mailbox_names(), mailboxes);
        assert_eq!(s.selected(), None);
        assert_eq!(
            s.calls()
                .iter()
                .filter(|c| matches!(c, Call::Create(_)))
                .count(),
            1
        );
    }

    #[test]
    fn create_failure_is_fatal() {
        let mut s = ScriptedSession::new().failing(Call::Create("Archive".into()));
        match ensure_mailbox(&mut s, "Archive", log::logger()) {
            Err(Error::Create { mailbox, .. }) => assert_eq!(mailbox, "Archive"),
            r => panic!("expected a create error, got {:?}", r),
        }
        assert_eq!(s.calls().len(), 2);
    }

    #[test]
    fn second_open_failure_is_fatal() {
        let mut s = ScriptedSession::new().failing(Call::open("Archive", true));
        match ensure_mailbox(&mut s, "Archive", log::logger()) {
            Err(Error::Select { mailbox, .. }) => assert_eq!(mailbox, "Archive"),
            r => panic!("expected a select error, got {:?}", r),
        }
        assert!(!s.calls().contains(&Call::Close));
    }

    #[test]
    fn empty_name() {
        let mut s = ScriptedSession::new();
        match ensure_mailbox(&mut s, "", log::logger()) {
            Err(Error::Validate(ValidateError::EmptyMailbox(_))) => {}
            r => panic!("expected a validation error, got {:?}", r),
        }
        assert!(s.calls().is_empty());
    }

    #[test]
    fn delete_existing() {
        let mut s = ScriptedSession::new().with_mailbox("Old");
        delete_mailbox(&mut s, "Old", log::logger()).unwrap();
        assert!(!s.has_mailbox("Old"));
        assert_eq!(s.calls().last(), Some(&Call::Delete("Old".into())));
    }

    #[test]
    fn delete_missing_is_a_noop() {
        let mut s = ScriptedSession::new();
        delete_mailbox(&mut s, "Old", log::logger()).unwrap();
        assert_eq!(s.calls(), &[Call::open("Old", true)][..]);
    }
}
