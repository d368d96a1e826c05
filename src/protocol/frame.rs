//! Wire frame codec.
//!
//! Every request and response is a single frame: a one-byte type code, a
//! four-byte big-endian payload length, and the payload itself. Responses
//! reuse the request's type byte, whether success or error.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Denial-of-service guard: frames above this payload size are rejected.
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Request type codes carried in the frame's first byte.
///
/// Any byte outside this table is an `INVALID_REQUEST` at dispatch time;
/// the offending byte is still echoed back in the error frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    CreateTopic = 1,
    Produce = 2,
    Fetch = 3,
    Commit = 4,
    Heartbeat = 5,
}

impl RequestType {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(RequestType::CreateTopic),
            2 => Some(RequestType::Produce),
            3 => Some(RequestType::Fetch),
            4 => Some(RequestType::Commit),
            5 => Some(RequestType::Heartbeat),
            _ => None,
        }
    }

    /// Stable label used by the `cafelog_requests_total{type}` counter.
    pub fn metric_label(self) -> &'static str {
        match self {
            RequestType::CreateTopic => "CREATE_TOPIC",
            RequestType::Produce => "PRODUCE",
            RequestType::Fetch => "FETCH",
            RequestType::Commit => "COMMIT",
            RequestType::Heartbeat => "HEARTBEAT",
        }
    }
}

/// One protocol message: the raw type byte and its opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: u8,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(frame_type: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_type,
            payload: payload.into(),
        }
    }
}

/// Codec implementing the frame layout over a byte stream.
///
/// The decoder consumes exactly `1 + 4 + length` bytes per frame and fails
/// on oversize lengths; a stream ending mid-frame surfaces as an error from
/// `decode_eof`, which the connection loop maps to `INVALID_REQUEST`.
#[derive(Debug, Default)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        // Type byte plus length prefix.
        if src.len() < 5 {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
        if length > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame too large: {length} bytes (limit {MAX_FRAME_SIZE})"),
            ));
        }

        if src.len() < 5 + length {
            src.reserve(5 + length - src.len());
            return Ok(None);
        }

        let frame_type = src[0];
        src.advance(5);
        let payload = src.split_to(length).freeze();

        Ok(Some(Frame {
            frame_type,
            payload,
        }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), io::Error> {
        dst.reserve(5 + frame.payload.len());
        dst.put_u8(frame.frame_type);
        dst.put_u32(frame.payload.len() as u32);
        dst.extend_from_slice(&frame.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(frame_type: u8, payload: &[u8]) -> Frame {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(Frame::new(frame_type, payload.to_vec()), &mut buf)
            .unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());
        decoded
    }

    #[test]
    fn test_roundtrip_preserves_type_and_payload() {
        let payload = br#"{"hello":"world"}"#;
        let frame = roundtrip(RequestType::Produce as u8, payload);
        assert_eq!(frame.frame_type, 2);
        assert_eq!(frame.payload.as_ref(), payload);
    }

    #[test]
    fn test_roundtrip_all_type_bytes() {
        // Type codes are opaque to the codec, including unknown ones.
        for frame_type in [0u8, 1, 3, 5, 6, 127, 255] {
            let frame = roundtrip(frame_type, b"payload");
            assert_eq!(frame.frame_type, frame_type);
        }
    }

    #[test]
    fn test_roundtrip_empty_payload() {
        let frame = roundtrip(5, b"");
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::from(&[2u8, 0, 0][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        buf.put_u8(2);
        buf.put_u32(100);
        buf.extend_from_slice(&[0u8; 10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_split_delivery() {
        // A frame arriving in two chunks decodes once the tail lands.
        let mut codec = FrameCodec;
        let mut full = BytesMut::new();
        codec
            .encode(Frame::new(3, b"0123456789".to_vec()), &mut full)
            .unwrap();

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&full[..7]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&full[7..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"0123456789");
    }

    #[test]
    fn test_decode_rejects_oversize_length() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        buf.put_u8(2);
        buf.put_u32((MAX_FRAME_SIZE + 1) as u32);
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_decode_accepts_limit_length() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        buf.put_u8(2);
        buf.put_u32(MAX_FRAME_SIZE as u32);
        buf.extend_from_slice(&vec![0u8; MAX_FRAME_SIZE]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.payload.len(), MAX_FRAME_SIZE);
    }

    #[test]
    fn test_decode_eof_mid_frame_is_error() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        buf.put_u8(2);
        buf.put_u32(50);
        buf.extend_from_slice(&[0u8; 5]);
        // The stream ended with a partial frame buffered.
        assert!(codec.decode_eof(&mut buf).is_err());
    }

    #[test]
    fn test_decode_multiple_frames() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        codec.encode(Frame::new(1, b"a".to_vec()), &mut buf).unwrap();
        codec.encode(Frame::new(4, b"bb".to_vec()), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.frame_type, 1);
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.frame_type, 4);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_request_type_table() {
        assert_eq!(RequestType::from_u8(1), Some(RequestType::CreateTopic));
        assert_eq!(RequestType::from_u8(5), Some(RequestType::Heartbeat));
        assert_eq!(RequestType::from_u8(0), None);
        assert_eq!(RequestType::from_u8(6), None);
        assert_eq!(RequestType::Fetch.metric_label(), "FETCH");
    }
}
