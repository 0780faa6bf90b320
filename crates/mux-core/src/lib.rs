//! Core abstractions for the multipart stream multiplexer.
//!
//! This crate provides the fundamental types and the error taxonomy:
//! - `Payload` - Opaque body bytes with a content-type tag
//! - `Boundary` - Validated frame boundary token
//! - `SessionConfig` - Per-session policy knobs
//! - `SessionId` / `TimingContext` - Correlation and timing

mod boundary;
mod config;
mod context;
mod error;
mod lifecycle;
mod payload;

pub use boundary::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use payload::*;
