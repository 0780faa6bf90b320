//! Incremental reference parser for the reader side.
//!
//! Feeds on arbitrary byte chunks as they arrive off the transport and
//! recovers the ordered frame sequence by scanning for the boundary
//! token, never by waiting for connection close.

use mux_core::Boundary;
use thiserror::Error;

use crate::encode::CRLF;

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    /// Value of the frame's `Content-Type` header.
    pub content_type: String,
    /// The payload bytes.
    pub body: Vec<u8>,
}

/// Parse failure. The stream is unrecoverable past the first error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("stream does not start with the expected boundary delimiter")]
    BoundaryMismatch,

    #[error("malformed frame headers: {0}")]
    MalformedHeaders(String),

    #[error("data received after the terminal marker")]
    AfterTerminal,

    #[error("stream ended before the terminal marker")]
    Truncated,
}

/// Incremental multipart stream parser.
///
/// Push chunks with [`push`](Self::push); each call returns the frames
/// completed by that chunk. A frame is only complete once the *next*
/// delimiter has been seen, since the body is delimited by the boundary
/// itself.
#[derive(Debug)]
pub struct StreamParser {
    /// `--<token>`.
    delimiter: Vec<u8>,
    /// `\r\n--<token>`, the body terminator.
    body_end: Vec<u8>,
    buf: Vec<u8>,
    complete: bool,
}

impl StreamParser {
    /// Create a parser for the given boundary.
    pub fn new(boundary: &Boundary) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.as_str().len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(boundary.as_str().as_bytes());
        let mut body_end = Vec::with_capacity(delimiter.len() + 2);
        body_end.extend_from_slice(CRLF);
        body_end.extend_from_slice(&delimiter);
        Self {
            delimiter,
            body_end,
            buf: Vec::new(),
            complete: false,
        }
    }

    /// Whether the terminal marker has been consumed.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Feed one chunk, returning any frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<ParsedFrame>, ParseError> {
        if self.complete {
            if chunk.is_empty() {
                return Ok(Vec::new());
            }
            return Err(ParseError::AfterTerminal);
        }
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            let d = self.delimiter.len();

            // Every parse position sits at a delimiter. Reject as soon as
            // the available bytes diverge from it.
            let common = self.buf.len().min(d);
            if self.buf[..common] != self.delimiter[..common] {
                return Err(ParseError::BoundaryMismatch);
            }
            if self.buf.len() < d + 2 {
                break;
            }

            match &self.buf[d..d + 2] {
                b"--" => {
                    if self.buf.len() < d + 4 {
                        break;
                    }
                    if &self.buf[d + 2..d + 4] != CRLF {
                        return Err(ParseError::BoundaryMismatch);
                    }
                    self.buf.drain(..d + 4);
                    self.complete = true;
                    if !self.buf.is_empty() {
                        return Err(ParseError::AfterTerminal);
                    }
                    break;
                }
                b"\r\n" => {
                    let headers_from = d + 2;
                    let Some(h) = find(&self.buf[headers_from..], b"\r\n\r\n") else {
                        break;
                    };
                    let body_from = headers_from + h + 4;
                    let Some(j) = find(&self.buf[body_from..], &self.body_end) else {
                        break;
                    };
                    let content_type =
                        parse_content_type(&self.buf[headers_from..headers_from + h])?;
                    let body = self.buf[body_from..body_from + j].to_vec();
                    frames.push(ParsedFrame { content_type, body });
                    // Consume up to and including the body's CRLF; the
                    // next delimiter stays at the front of the buffer.
                    self.buf.drain(..body_from + j + 2);
                }
                _ => return Err(ParseError::BoundaryMismatch),
            }
        }
        Ok(frames)
    }

    /// Parse a complete in-memory stream. Fails if the terminal marker
    /// is missing.
    pub fn parse_complete(boundary: &Boundary, bytes: &[u8]) -> Result<Vec<ParsedFrame>, ParseError> {
        let mut parser = Self::new(boundary);
        let frames = parser.push(bytes)?;
        if !parser.is_complete() {
            return Err(ParseError::Truncated);
        }
        Ok(frames)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_content_type(headers: &[u8]) -> Result<String, ParseError> {
    let text = std::str::from_utf8(headers)
        .map_err(|_| ParseError::MalformedHeaders("headers are not valid UTF-8".to_string()))?;
    for line in text.split("\r\n") {
        if let Some(value) = line.strip_prefix("Content-Type:") {
            return Ok(value.trim().to_string());
        }
    }
    Err(ParseError::MalformedHeaders(
        "missing Content-Type header".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_frame, terminal_marker};
    use mux_core::Payload;

    fn boundary() -> Boundary {
        Boundary::new("boundary123abc").unwrap()
    }

    fn stream_of(payloads: &[Payload]) -> Vec<u8> {
        let b = boundary();
        let mut out = Vec::new();
        for p in payloads {
            out.extend_from_slice(&encode_frame(&b, p));
        }
        out.extend_from_slice(&terminal_marker(&b));
        out
    }

    #[test]
    fn test_marker_only_stream() {
        let frames = StreamParser::parse_complete(&boundary(), &stream_of(&[])).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn test_single_frame_roundtrip() {
        let payload = Payload::json(&serde_json::json!({"type": "post"})).unwrap();
        let frames = StreamParser::parse_complete(&boundary(), &stream_of(&[payload.clone()]))
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].content_type, "application/json");
        assert_eq!(frames[0].body, payload.body());
    }

    #[test]
    fn test_multi_frame_order_roundtrip() {
        let payloads = vec![
            Payload::text("first"),
            Payload::new("application/json", br#"{"n":2}"#.to_vec()),
            Payload::new("application/octet-stream", vec![0, 1, 2, 255]),
        ];
        let frames = StreamParser::parse_complete(&boundary(), &stream_of(&payloads)).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].body, b"first");
        assert_eq!(frames[1].body, br#"{"n":2}"#);
        assert_eq!(frames[2].body, [0, 1, 2, 255]);
    }

    #[test]
    fn test_byte_at_a_time_delivery() {
        let payloads = vec![Payload::text("alpha"), Payload::text("beta")];
        let wire = stream_of(&payloads);

        let mut parser = StreamParser::new(&boundary());
        let mut frames = Vec::new();
        for byte in &wire {
            frames.extend(parser.push(std::slice::from_ref(byte)).unwrap());
        }
        assert!(parser.is_complete());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].body, b"alpha");
        assert_eq!(frames[1].body, b"beta");
    }

    #[test]
    fn test_frame_with_crlf_in_body_survives() {
        // CRLF inside the body must not end the frame; only
        // CRLF + delimiter does.
        let payload = Payload::text("line one\r\nline two");
        let frames =
            StreamParser::parse_complete(&boundary(), &stream_of(&[payload])).unwrap();
        assert_eq!(frames[0].body, b"line one\r\nline two");
    }

    #[test]
    fn test_boundary_mismatch_detected_early() {
        let mut parser = StreamParser::new(&boundary());
        assert_eq!(parser.push(b"--wrong"), Err(ParseError::BoundaryMismatch));
    }

    #[test]
    fn test_data_after_terminal_rejected() {
        let mut parser = StreamParser::new(&boundary());
        parser.push(&stream_of(&[])).unwrap();
        assert!(parser.is_complete());
        assert_eq!(parser.push(b"x"), Err(ParseError::AfterTerminal));
    }

    #[test]
    fn test_missing_content_type_header() {
        let wire = b"--boundary123abc\r\nX-Other: nope\r\n\r\nbody\r\n--boundary123abc--\r\n";
        let err = StreamParser::parse_complete(&boundary(), wire).unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaders(_)));
    }

    #[test]
    fn test_truncated_stream() {
        let payload = Payload::text("partial");
        let b = boundary();
        let wire = encode_frame(&b, &payload);
        assert_eq!(
            StreamParser::parse_complete(&b, &wire),
            Err(ParseError::Truncated)
        );
    }
}
