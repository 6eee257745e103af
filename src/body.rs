//! Picking the interesting bodies out of a MIME tree.

use mailparse::ParsedMail;

const PGP_ARMOR: &str = "-----BEGIN PGP ";

/// Media types whose content is a signature, a key or an encrypted payload.
const SIGNED_OR_ENCRYPTED: &[&str] = &[
    "application/pgp-signature",
    "application/pgp-keys",
    "application/pkcs7-mime",
    "application/pkcs7-signature",
    "application/x-pkcs7-mime",
    "application/x-pkcs7-signature",
];

/// The bodies of a message, as shown to a reader.
///
/// Each field holds the decoded content of the first matching part, in depth-first order starting
/// from the message itself. A missing or undecodable part is `None`; selection never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bodies {
    /// The first `text/plain` part.
    pub text: Option<String>,
    /// The first `text/html` part.
    pub html: Option<String>,
    /// The first signed or encrypted payload: the encrypted half of a `multipart/encrypted`
    /// message, a PGP or S/MIME signature part, or inline PGP armor.
    pub alternate: Option<String>,
}

impl Bodies {
    /// Walk `mail` and collect its text, HTML and alternate bodies.
    pub fn select(mail: &ParsedMail<'_>) -> Bodies {
        let mut bodies = Bodies::default();
        bodies.visit(mail);
        bodies
    }

    fn visit(&mut self, part: &ParsedMail<'_>) {
        let mimetype = part.ctype.mimetype.to_ascii_lowercase();
        match mimetype.as_str() {
            "text/plain" => {
                let body = part.get_body().ok();
                if self.alternate.is_none() && is_armored(body.as_deref()) {
                    self.alternate = body.clone();
                }
                if self.text.is_none() {
                    self.text = body;
                }
            }
            "text/html" => {
                if self.html.is_none() {
                    self.html = part.get_body().ok();
                }
            }
            // RFC 3156: a control part, then the encrypted data
            "multipart/encrypted" => {
                if self.alternate.is_none() {
                    self.alternate = part.subparts.get(1).and_then(|p| p.get_body().ok());
                }
            }
            m if SIGNED_OR_ENCRYPTED.contains(&m) => {
                if self.alternate.is_none() {
                    self.alternate = part.get_body().ok();
                }
            }
            _ => {}
        }

        for sub in &part.subparts {
            self.visit(sub);
        }
    }
}

fn is_armored(body: Option<&str>) -> bool {
    body.map_or(false, |b| b.trim_start().starts_with(PGP_ARMOR))
}
