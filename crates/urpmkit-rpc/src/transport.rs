//! Length-prefixed transport codec for the urpmd socket.
//!
//! Messages are framed with a 4-byte big-endian length prefix followed by
//! the JSON payload. Package file lists can run large but are bounded; the
//! codec rejects frames above 16 MB.

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::Message;

/// Maximum frame payload size.
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Length prefix size in bytes.
const LENGTH_PREFIX_SIZE: usize = 4;

/// Codec for length-prefixed JSON-RPC messages.
#[derive(Debug, Default)]
pub struct BusCodec {
    current_length: Option<usize>,
}

impl BusCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for BusCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.current_length.is_none() {
            if src.len() < LENGTH_PREFIX_SIZE {
                return Ok(None);
            }

            let len = src.get_u32() as usize;
            if len > MAX_MESSAGE_SIZE {
                return Err(CodecError::MessageTooLarge(len));
            }
            self.current_length = Some(len);
        }

        let Some(length) = self.current_length else {
            return Ok(None);
        };

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let payload = src.split_to(length);
        self.current_length = None;

        let json_str = std::str::from_utf8(&payload)?;
        let message: Message = serde_json::from_str(json_str)?;
        Ok(Some(message))
    }
}

impl Encoder<Message> for BusCodec {
    type Error = CodecError;

    // Message size is checked against MAX_MESSAGE_SIZE (fits in u32)
    #[allow(clippy::cast_possible_truncation)]
    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_string(&item)?;
        let json_bytes = json.as_bytes();

        if json_bytes.len() > MAX_MESSAGE_SIZE {
            return Err(CodecError::MessageTooLarge(json_bytes.len()));
        }

        dst.reserve(LENGTH_PREFIX_SIZE + json_bytes.len());
        dst.put_u32(json_bytes.len() as u32);
        dst.put_slice(json_bytes);
        Ok(())
    }
}

/// Errors that can occur during codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Message too large: {0} bytes (max: {MAX_MESSAGE_SIZE})")]
    MessageTooLarge(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Notification, Request, Response};

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut codec = BusCodec::new();
        let mut buf = BytesMut::new();

        let msg = Message::Request(Request::new(
            "ResolvePackages",
            Some(serde_json::json!({"names": ["bash"]})),
            1.into(),
        ));
        codec.encode(msg, &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        let Message::Request(req) = decoded else {
            panic!("expected request");
        };
        assert_eq!(req.method, "ResolvePackages");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_frame_returns_none() {
        let mut codec = BusCodec::new();
        let mut buf = BytesMut::new();
        let msg = Message::Response(Response::success(1.into(), serde_json::json!("[]")));
        codec.encode(msg, &mut buf).unwrap();

        let full = buf.clone();
        let mut partial = BytesMut::from(&full[..3]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full[3..7]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full[7..]);
        assert!(codec.decode(&mut partial).unwrap().is_some());
    }

    #[test]
    fn test_multiple_frames_in_buffer() {
        let mut codec = BusCodec::new();
        let mut buf = BytesMut::new();
        for method in ["GetUpdates", "RefreshMetadata"] {
            codec
                .encode(Message::Request(Request::new(method, None, 1.into())), &mut buf)
                .unwrap();
        }

        for expected in ["GetUpdates", "RefreshMetadata"] {
            let Message::Request(req) = codec.decode(&mut buf).unwrap().unwrap() else {
                panic!("expected request");
            };
            assert_eq!(req.method, expected);
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut codec = BusCodec::new();
        let mut buf = BytesMut::new();
        #[allow(clippy::cast_possible_truncation)] // bounded test constant
        buf.put_u32((MAX_MESSAGE_SIZE + 1) as u32);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::MessageTooLarge(_))
        ));
    }

    #[test]
    fn test_invalid_json_payload() {
        let mut codec = BusCodec::new();
        let mut buf = BytesMut::new();
        let payload = b"not valid json";
        #[allow(clippy::cast_possible_truncation)] // bounded test constant
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(payload);
        assert!(matches!(codec.decode(&mut buf), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_notification_frame() {
        let mut codec = BusCodec::new();
        let mut buf = BytesMut::new();
        let msg = Message::Notification(Notification::new(
            "OperationProgress",
            Some(serde_json::json!({"phase": "installing", "current": 1, "total": 2})),
        ));
        codec.encode(msg, &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(decoded, Message::Notification(_)));
    }
}
