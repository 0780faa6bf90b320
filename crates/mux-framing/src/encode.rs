//! Frame encoding.
//!
//! Byte-exact wire format:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Type: <mime-type>\r\n
//! \r\n
//! <payload-bytes>\r\n
//! ```
//!
//! followed, after the last frame, by exactly one terminal marker
//! `--<boundary>--\r\n`.

use mux_core::{Boundary, Payload};

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Encode one payload as a wire frame.
///
/// Pure and infallible. The caller contract that the body does not
/// contain the boundary token is checked separately with
/// [`body_contains_boundary`].
pub fn encode_frame(boundary: &Boundary, payload: &Payload) -> Vec<u8> {
    let token = boundary.as_str().as_bytes();
    let mut out = Vec::with_capacity(payload.len() + token.len() + 32);
    out.extend_from_slice(b"--");
    out.extend_from_slice(token);
    out.extend_from_slice(CRLF);
    out.extend_from_slice(b"Content-Type: ");
    out.extend_from_slice(payload.content_type().as_bytes());
    out.extend_from_slice(CRLF);
    out.extend_from_slice(CRLF);
    out.extend_from_slice(payload.body());
    out.extend_from_slice(CRLF);
    out
}

/// Encode the terminal marker that ends the stream.
pub fn terminal_marker(boundary: &Boundary) -> Vec<u8> {
    let token = boundary.as_str().as_bytes();
    let mut out = Vec::with_capacity(token.len() + 6);
    out.extend_from_slice(b"--");
    out.extend_from_slice(token);
    out.extend_from_slice(b"--");
    out.extend_from_slice(CRLF);
    out
}

/// Scan a payload body for the boundary token.
///
/// A hit means the encoded stream would be unparseable downstream; the
/// session maps it to its encode policy.
pub fn body_contains_boundary(boundary: &Boundary, payload: &Payload) -> bool {
    let needle = boundary.as_str().as_bytes();
    payload.body().windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary() -> Boundary {
        Boundary::new("boundary123abc").unwrap()
    }

    #[test]
    fn test_frame_is_byte_exact() {
        let payload = Payload::new("application/json", br#"{"id":"p1"}"#.to_vec());
        let frame = encode_frame(&boundary(), &payload);
        assert_eq!(
            frame,
            b"--boundary123abc\r\nContent-Type: application/json\r\n\r\n{\"id\":\"p1\"}\r\n"
        );
    }

    #[test]
    fn test_empty_body_frame() {
        let payload = Payload::new("text/plain", Vec::new());
        let frame = encode_frame(&boundary(), &payload);
        assert_eq!(frame, b"--boundary123abc\r\nContent-Type: text/plain\r\n\r\n\r\n");
    }

    #[test]
    fn test_terminal_marker() {
        assert_eq!(terminal_marker(&boundary()), b"--boundary123abc--\r\n");
    }

    #[test]
    fn test_boundary_collision_detection() {
        let clean = Payload::text("no token here");
        assert!(!body_contains_boundary(&boundary(), &clean));

        let dirty = Payload::text("oops boundary123abc embedded");
        assert!(body_contains_boundary(&boundary(), &dirty));

        // A body shorter than the token cannot contain it.
        let short = Payload::text("x");
        assert!(!body_contains_boundary(&boundary(), &short));
    }
}
