//! Error type for the urpmd RPC client.

use crate::transport::CodecError;

/// Errors that can occur talking to the urpmd service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error: {code} - {message}")]
    Rpc { code: i32, message: String },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected response type")]
    UnexpectedResponse,
}

impl From<crate::protocol::RpcError> for ClientError {
    fn from(e: crate::protocol::RpcError) -> Self {
        ClientError::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RpcError;

    #[test]
    fn test_from_rpc_error() {
        let err: ClientError = RpcError::method_not_found("Bogus").into();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, crate::protocol::METHOD_NOT_FOUND);
                assert!(message.contains("Bogus"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ClientError::ConnectionClosed.to_string(), "Connection closed");
        assert_eq!(ClientError::Timeout.to_string(), "Request timeout");
    }
}
