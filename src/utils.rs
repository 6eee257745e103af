use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidateError;

lazy_static! {
    // flag = "\" atom / atom, where atom excludes ( ) { SP CTL % * " \ ]
    static ref FLAG: Regex = Regex::new(r#"^\\?[^\x00-\x20\x7f(){%*"\\\]]+$"#).unwrap();
}

/// Joins an iterator of [std::fmt::Display]'ables into an output writable
pub(crate) fn iter_join_onto<W, I, T>(mut w: W, iter: I, delim: &str) -> std::fmt::Result
where
    W: std::fmt::Write,
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let mut it = iter.into_iter().peekable();
    while let Some(n) = it.next() {
        write!(w, "{}", n)?;
        if it.peek().is_some() {
            write!(w, "{}", delim)?;
        }
    }
    Ok(())
}

/// Rejects empty mailbox names. `role` names the mailbox in the error ("source", ...).
pub(crate) fn validate_mailbox(role: &'static str, name: &str) -> Result<(), ValidateError> {
    if name.is_empty() {
        return Err(ValidateError::EmptyMailbox(role));
    }
    Ok(())
}

/// Accepts any single system flag or keyword, and nothing that would spill into the rest of a
/// `STORE` command.
pub(crate) fn validate_flag(flag: &str) -> Result<(), ValidateError> {
    if flag.is_empty() {
        return Err(ValidateError::EmptyFlag);
    }
    if !FLAG.is_match(flag) {
        return Err(ValidateError::InvalidFlag(flag.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_uids() {
        let mut s = String::new();
        iter_join_onto(&mut s, [1, 2, 30], ",").unwrap();
        assert_eq!(s, "1,2,30");
    }

    #[test]
    fn system_and_custom_flags() {
        assert!(validate_flag("\\Seen").is_ok());
        assert!(validate_flag("\\Deleted").is_ok());
        assert!(validate_flag("$Junk").is_ok());
        assert!(validate_flag("processed").is_ok());
    }

    #[test]
    fn bad_flags() {
        assert_eq!(validate_flag(""), Err(ValidateError::EmptyFlag));
        for flag in ["\\Seen \\Deleted", "a)b", "\\*", "x\r\n", "\"quoted\""] {
            assert_eq!(
                validate_flag(flag),
                Err(ValidateError::InvalidFlag(flag.to_string())),
                "{:?} should be rejected",
                flag
            );
        }
    }

    #[test]
    fn empty_mailbox() {
        assert_eq!(
            validate_mailbox("destination", ""),
            Err(ValidateError::EmptyMailbox("destination"))
        );
        assert!(validate_mailbox("source", "INBOX").is_ok());
    }
}
