//! Error taxonomy for the multiplexer.
//!
//! Producer- and encoding-level errors are recovered locally by the
//! session; transport errors are terminal. `SessionError` is the only
//! error type that escapes to the caller.

use thiserror::Error;

/// Boundary token validation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("boundary token is empty")]
    Empty,

    #[error("boundary token is {0} characters, maximum is 70")]
    TooLong(usize),

    #[error("boundary token contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A payload could not be framed.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload body contains the boundary token")]
    BoundaryCollision,
}

/// One producer failed. Isolated from the rest of the session unless the
/// error policy escalates it.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("producer failed: {0}")]
    Failed(#[from] anyhow::Error),

    #[error("producer task ended without signaling completion")]
    Aborted,

    #[error("session cancelled")]
    Cancelled,
}

impl ProducerError {
    /// Convenience constructor for message-only failures.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(anyhow::anyhow!(message.into()))
    }
}

/// Write or flush to the output sink failed. Always fatal to the
/// session; never retried at this layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("write failed: {0}")]
    Write(String),

    #[error("flush failed: {0}")]
    Flush(String),

    #[error("output closed by peer")]
    Closed,
}

/// Terminal outcome of a session that did not complete.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Reachable only under `ErrorPolicy::Abort`.
    #[error("producer '{name}' failed: {source}")]
    Producer {
        name: String,
        #[source]
        source: ProducerError,
    },

    /// Reachable only under `EncodePolicy::Abort`.
    #[error("payload from producer '{name}' could not be framed: {source}")]
    Encode {
        name: String,
        #[source]
        source: EncodeError,
    },
}
