//! Wire framing for the multipart stream.
//!
//! This crate is the pure, transport-free layer:
//! - `encode_frame` / `terminal_marker` - byte-exact frame encoding
//! - `StreamParser` - incremental reference parser for the reader side

mod encode;
mod parse;

pub use encode::*;
pub use parse::*;
