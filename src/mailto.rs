use std::fmt::{Display, Formatter};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters left as-is inside a query component, matching `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SCHEME: &str = "mailto:";

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("mail recipient is empty")]
    EmptyRecipient,
    #[error("mail recipient {0:?} is not a plain address")]
    InvalidRecipient(String),
    #[error("link does not use the mailto scheme")]
    NotMailto,
    #[error("link component {0:?} is not valid UTF-8 once decoded")]
    InvalidEncoding(String),
}

/// A pre-filled compose request for the platform mail handler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MailtoLink {
    recipient: String,
    subject: String,
    body: String,
}

impl MailtoLink {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, LinkError> {
        let recipient = recipient.into();
        validate_recipient(&recipient)?;
        Ok(Self {
            recipient,
            subject: subject.into(),
            body: body.into(),
        })
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Renders `mailto:<recipient>?subject=<..>&body=<..>`.
    ///
    /// Subject and body are percent-encoded so `&`, `?`, `#` and line breaks
    /// in user text stay inside their component.
    pub fn to_uri(&self) -> String {
        format!(
            "{SCHEME}{}?subject={}&body={}",
            self.recipient,
            utf8_percent_encode(&self.subject, COMPONENT),
            utf8_percent_encode(&self.body, COMPONENT),
        )
    }

    /// Reads back a link produced by [`MailtoLink::to_uri`].
    ///
    /// Unknown query parameters are ignored and missing ones read as empty.
    pub fn parse(uri: &str) -> Result<Self, LinkError> {
        let rest = uri
            .get(..SCHEME.len())
            .filter(|scheme| scheme.eq_ignore_ascii_case(SCHEME))
            .map(|_| &uri[SCHEME.len()..])
            .ok_or(LinkError::NotMailto)?;
        let (recipient, query) = rest.split_once('?').unwrap_or((rest, ""));

        let mut subject = String::new();
        let mut body = String::new();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            match name {
                "subject" => subject = decode_component(name, value)?,
                "body" => body = decode_component(name, value)?,
                _ => {}
            }
        }

        Self::new(decode_component("recipient", recipient)?, subject, body)
    }
}

impl Display for MailtoLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_uri())
    }
}

/// A recipient is written into the link verbatim, so it must be a bare
/// address with nothing that would open a new link component.
pub fn validate_recipient(recipient: &str) -> Result<(), LinkError> {
    if recipient.is_empty() {
        return Err(LinkError::EmptyRecipient);
    }
    let has_reserved = recipient
        .chars()
        .any(|ch| ch.is_whitespace() || matches!(ch, '?' | '&' | '#' | '/' | '%'));
    if has_reserved || !recipient.contains('@') {
        return Err(LinkError::InvalidRecipient(recipient.to_string()));
    }
    Ok(())
}

fn decode_component(name: &str, value: &str) -> Result<String, LinkError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| LinkError::InvalidEncoding(name.to_string()))
}
