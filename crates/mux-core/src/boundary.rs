//! Frame boundary token.

use std::fmt;

use crate::context::{entropy32, now_nanos};
use crate::error::BoundaryError;

/// RFC 2046 caps boundary tokens at 70 characters.
const MAX_LEN: usize = 70;

/// The boundary token that delimits frames on the wire.
///
/// The caller contract is that the token never occurs inside payload
/// bytes; `generate()` produces a high-entropy token that makes an
/// accidental collision implausible. The session additionally scans each
/// body before framing and applies the configured encode policy if the
/// contract is violated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
    /// Validate and wrap a caller-chosen token.
    ///
    /// Accepts the RFC 2046 boundary character set minus spaces.
    pub fn new(token: impl Into<String>) -> Result<Self, BoundaryError> {
        let token = token.into();
        if token.is_empty() {
            return Err(BoundaryError::Empty);
        }
        if token.len() > MAX_LEN {
            return Err(BoundaryError::TooLong(token.len()));
        }
        if let Some(c) = token.chars().find(|c| !is_boundary_char(*c)) {
            return Err(BoundaryError::InvalidChar(c));
        }
        Ok(Self(token))
    }

    /// Generate a random high-entropy token.
    pub fn generate() -> Self {
        Self(format!(
            "mux-{:016x}{:08x}{:08x}",
            now_nanos() as u64,
            entropy32(),
            entropy32()
        ))
    }

    /// The token string, without the leading `--` dashes.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_boundary_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?')
}
