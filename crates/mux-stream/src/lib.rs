//! Stream multiplexer: merges concurrent producers into one framed,
//! incrementally-flushed output stream.
//!
//! - `StreamSession` - The merge loop
//! - `ProducerScope` - The seam producer tasks write through
//! - `OutputSink` - Transport abstraction, with ready-made adapters
//! - `SessionReport` - Per-session outcome and timing

mod producer;
mod report;
mod session;
mod sink;

pub use producer::*;
pub use report::*;
pub use session::*;
pub use sink::*;

// Re-export the core types sessions are built from, for convenience.
pub use mux_core::{
    Boundary, EncodePolicy, ErrorPolicy, FlushPolicy, Payload, ProducerError, SessionConfig,
    SessionError, SessionId, TransportError,
};
