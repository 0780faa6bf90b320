//! Session identity for log correlation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique session identifier attached to tracing output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new session ID.
    pub fn generate() -> Self {
        let id = format!("{:x}-{:x}-{:x}", now_nanos(), entropy32(), entropy32());
        Self(id)
    }

    /// Create from an existing ID string (e.g. a request ID from a proxy).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

/// Cheap process-local entropy for IDs and boundary tokens. Not
/// cryptographic; uniqueness is what matters here.
pub(crate) fn entropy32() -> u32 {
    static SEED: AtomicU32 = AtomicU32::new(0x1234_5678);
    let seed = SEED
        .fetch_add(0x9e37_79b9, Ordering::Relaxed)
        .wrapping_add(now_nanos() as u32);
    seed.wrapping_mul(1_103_515_245).wrapping_add(12345)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_string_roundtrip() {
        let id = SessionId::from_string("req-42");
        assert_eq!(id.to_string(), "req-42");
    }
}
