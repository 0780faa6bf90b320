//! Payload definition.

use serde::Serialize;

use crate::error::EncodeError;

/// One opaque unit of producer output: body bytes plus a content-type tag.
///
/// A payload is immutable once produced. Ownership moves into the session
/// when the producer hands it over; the session is then responsible for
/// writing and releasing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    content_type: String,
    body: Vec<u8>,
}

impl Payload {
    /// Create a payload from raw bytes.
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Serialize a value as an `application/json` payload.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, EncodeError> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new("application/json", body))
    }

    /// Create a `text/plain` payload.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new("text/plain", body.into().into_bytes())
    }

    /// The content-type tag written into the frame headers.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty. An empty body is a legal payload,
    /// distinct from producer closure.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Split into content-type and body.
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.content_type, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_payload() {
        let payload = Payload::json(&serde_json::json!({"id": "p1"})).unwrap();
        assert_eq!(payload.content_type(), "application/json");
        assert_eq!(payload.body(), br#"{"id":"p1"}"#);
    }

    #[test]
    fn test_text_payload() {
        let payload = Payload::text("hello");
        assert_eq!(payload.content_type(), "text/plain");
        assert_eq!(payload.body(), b"hello");
    }

    #[test]
    fn test_empty_body_is_a_legal_payload() {
        let payload = Payload::new("application/octet-stream", Vec::new());
        assert!(payload.is_empty());
        assert_eq!(payload.len(), 0);
    }

    #[test]
    fn test_into_parts() {
        let (ct, body) = Payload::new("text/html", b"<p>hi</p>".to_vec()).into_parts();
        assert_eq!(ct, "text/html");
        assert_eq!(body, b"<p>hi</p>");
    }
}
