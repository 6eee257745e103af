use std::collections::BTreeMap;

use mailparse::ParsedMail;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::batch::Uid;
use crate::body::Bodies;
use crate::error::Result;

/// A fetched message, flattened for consumption by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRecord {
    /// The UID of the message in the mailbox it was fetched from.
    pub uid: Uid,
    /// Every header of the message. A header that occurs more than once keeps its last value.
    pub headers: BTreeMap<String, String>,
    /// The first `text/plain` part.
    pub text_body: Option<String>,
    /// The first `text/html` part.
    pub html_body: Option<String>,
    /// The first signed or encrypted part. See [`Bodies::alternate`].
    pub alternate_body: Option<String>,
}

impl MessageRecord {
    /// Build a record from a parsed message.
    pub fn from_parsed(uid: Uid, mail: &ParsedMail<'_>) -> Self {
        let headers = mail
            .headers
            .iter()
            .map(|h| (h.get_key(), h.get_value()))
            .collect();
        let bodies = Bodies::select(mail);
        MessageRecord {
            uid,
            headers,
            text_body: bodies.text,
            html_body: bodies.html,
            alternate_body: bodies.alternate,
        }
    }

    /// Look up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }

    /// The `From` header.
    pub fn from(&self) -> Option<&str> {
        self.header("From")
    }

    /// The `To` header.
    pub fn to(&self) -> Option<&str> {
        self.header("To")
    }

    /// The `Subject` header.
    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }

    /// The flat string mapping a record serializes to: all headers, plus `imap_uid`, and
    /// `text_body`, `html_body` and `gpg_body` for the bodies that are present and non-empty.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.headers.clone();
        map.insert("imap_uid".to_string(), self.uid.to_string());
        let bodies = [
            ("text_body", &self.text_body),
            ("html_body", &self.html_body),
            ("gpg_body", &self.alternate_body),
        ];
        for (key, body) in bodies {
            if let Some(body) = body.as_ref().filter(|b| !b.is_empty()) {
                map.insert(key.to_string(), body.clone());
            }
        }
        map
    }

    /// Serialize this record as a single JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for MessageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let map = self.to_map();
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (k, v) in &map {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const SIGNED: &str = concat!(
        "From: alice@example.com\r\n",
        "To: bob@example.com\r\n",
        "Subject: =?utf-8?q?caf=C3=A9?=\r\n",
        "X-Tag: one\r\n",
        "X-Tag: two\r\n",
        "Content-Type: multipart/signed; protocol=\"application/pgp-signature\"; ",
        "boundary=\"sig\"\r\n",
        "\r\n",
        "--sig\r\n",
        "Content-Type: multipart/alternative; boundary=\"alt\"\r\n",
        "\r\n",
        "--alt\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "plain\r\n",
        "--alt\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<i>html</i>\r\n",
        "--alt--\r\n",
        "--sig\r\n",
        "Content-Type: application/pgp-signature\r\n",
        "\r\n",
        "-----BEGIN PGP SIGNATURE-----\r\n",
        "--sig--\r\n",
    );

    fn record(raw: &str, uid: Uid) -> MessageRecord {
        MessageRecord::from_parsed(uid, &mailparse::parse_mail(raw.as_bytes()).unwrap())
    }

    #[test]
    fn headers() {
        let r = record(SIGNED, 42);
        assert_eq!(r.uid, 42);
        assert_eq!(r.from(), Some("alice@example.com"));
        assert_eq!(r.to(), Some("bob@example.com"));
        assert_eq!(r.subject(), Some("café"));
        assert_eq!(r.header("x-tag"), Some("two"));
    }

    #[test]
    fn json_keys() {
        let r = record(SIGNED, 42);
        let v: Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(v["imap_uid"], "42");
        assert_eq!(v["From"], "alice@example.com");
        assert_eq!(v["X-Tag"], "two");
        assert_eq!(v["text_body"].as_str().map(str::trim_end), Some("plain"));
        assert_eq!(v["html_body"].as_str().map(str::trim_end), Some("<i>html</i>"));
        let gpg = v["gpg_body"].as_str().unwrap();
        assert!(gpg.starts_with("-----BEGIN PGP SIGNATURE-----"));
        assert_ne!(v["gpg_body"], v["html_body"]);
    }

    #[test]
    fn empty_bodies_are_left_out() {
        let r = MessageRecord {
            uid: 7,
            text_body: Some(String::new()),
            ..MessageRecord::default()
        };
        let map = r.to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["imap_uid"], "7");
    }
}
