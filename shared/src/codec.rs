//! Length-prefixed codec for TCP framing
//!
//! All messages are framed as:
//! ```text
//! [ 4 bytes: length (u32, big-endian) ][ N bytes: payload ]
//! ```
//!
//! Command payloads are JSON objects. Reply payloads are opaque bytes that
//! may or may not be JSON (detection images are sent as binary blobs).

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Largest payload accepted in either direction (10 MiB)
pub const MAX_MESSAGE_SIZE: u32 = 10 * 1024 * 1024;

/// Size of the big-endian length header
const HEADER_LEN: usize = 4;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Payload of {0} bytes exceeds the {MAX_MESSAGE_SIZE} byte limit")]
    MessageTooLarge(usize),

    #[error("Frame header announces {0} bytes, over the {MAX_MESSAGE_SIZE} byte limit")]
    InvalidLength(u32),
}

/// Frame one payload
pub fn encode(payload: &[u8]) -> Result<Bytes, CodecError> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_MESSAGE_SIZE)
        .ok_or(CodecError::MessageTooLarge(payload.len()))?;

    let mut frame = BytesMut::with_capacity(HEADER_LEN + payload.len());
    frame.put_u32(len);
    frame.put_slice(payload);
    Ok(frame.freeze())
}

/// Split one complete payload off the front of `buf`.
///
/// `Ok(None)` means the frame is incomplete; `buf` is then left untouched.
pub fn decode(buf: &mut BytesMut) -> Result<Option<Bytes>, CodecError> {
    let Some(len) = peek_len(buf) else {
        return Ok(None);
    };
    if len > MAX_MESSAGE_SIZE {
        return Err(CodecError::InvalidLength(len));
    }
    if buf.len() < HEADER_LEN + len as usize {
        return Ok(None);
    }

    buf.advance(HEADER_LEN);
    Ok(Some(buf.split_to(len as usize).freeze()))
}

fn peek_len(buf: &[u8]) -> Option<u32> {
    let header: [u8; HEADER_LEN] = buf.get(..HEADER_LEN)?.try_into().ok()?;
    Some(u32::from_be_bytes(header))
}

/// Accumulates stream reads and yields complete payloads
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            pending: BytesMut::with_capacity(4096),
        }
    }

    /// Append bytes read from the stream
    pub fn extend(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
    }

    /// Next complete payload, if any. Call until `Ok(None)` to drain.
    pub fn decode_next(&mut self) -> Result<Option<Bytes>, CodecError> {
        decode(&mut self.pending)
    }

    /// Bytes received but not yet returned as a payload
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_big_endian_length() {
        let encoded = encode(br#"{"command":"Ping"}"#).unwrap();

        assert_eq!(&encoded[..4], &[0, 0, 0, 18]);
        assert_eq!(&encoded[4..], br#"{"command":"Ping"}"#);
    }

    #[test]
    fn test_incomplete_frame_is_not_consumed() {
        let encoded = encode(b"partial payload").unwrap();

        for cut in [0, 3, 5] {
            let mut buf = BytesMut::from(&encoded[..cut]);
            assert!(decode(&mut buf).unwrap().is_none());
            assert_eq!(buf.len(), cut);
        }
    }

    #[test]
    fn test_frame_decoder() {
        let encoded = encode(b"\x89PNG\r\n\x1a\nbinary").expect("encode failed");

        let mut decoder = FrameDecoder::new();

        // Feed data in chunks
        decoder.extend(&encoded[..6]);
        assert!(decoder.decode_next().expect("decode error").is_none());

        decoder.extend(&encoded[6..]);
        let decoded = decoder
            .decode_next()
            .expect("decode error")
            .expect("should have message");

        assert_eq!(&decoded[..], b"\x89PNG\r\n\x1a\nbinary");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_multiple_frames() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&encode(b"first").expect("encode failed"));
        decoder.extend(&encode(b"second").expect("encode failed"));

        assert_eq!(&decoder.decode_next().unwrap().unwrap()[..], b"first");
        assert_eq!(&decoder.decode_next().unwrap().unwrap()[..], b"second");
        assert!(decoder.decode_next().expect("decode error").is_none());
    }

    #[test]
    fn test_empty_payload_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&encode(b"").expect("encode failed"));

        let decoded = decoder.decode_next().unwrap().expect("empty frame is a frame");
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_oversized_header_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32(MAX_MESSAGE_SIZE + 1);
        buf.put_bytes(0, 100);

        assert!(matches!(decode(&mut buf), Err(CodecError::InvalidLength(_))));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let payload = vec![0u8; MAX_MESSAGE_SIZE as usize + 1];

        assert!(matches!(encode(&payload), Err(CodecError::MessageTooLarge(_))));
    }
}
