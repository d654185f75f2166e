//! Error type for backend operations.

use urpmkit_types::ErrorKind;

/// Failure of one backend operation.
///
/// Variants map one-to-one onto the error codes reported to the frontend;
/// [`BackendError::error_kind`] gives the code for an event emission.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No connection to the urpmd service could be established.
    #[error("Cannot connect to urpm service: {0}")]
    ServiceUnavailable(String),

    /// The RPC call itself failed (transport error or timeout).
    #[error("{0}")]
    OperationFailed(String),

    /// The service answered but reported the operation failed.
    #[error("{message}")]
    Verb { kind: ErrorKind, message: String },

    /// Local file check failed during a simulated file install.
    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl BackendError {
    /// Error code to report to the frontend for this failure.
    #[must_use]
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Self::OperationFailed(_) => ErrorKind::InternalError,
            Self::Verb { kind, .. } => *kind,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
        }
    }

    /// Prefix a transport failure with the verb that hit it.
    ///
    /// Connection failures keep their own message so the frontend sees the
    /// connect diagnostics unchanged.
    #[must_use]
    pub fn context(self, prefix: &str) -> Self {
        match self {
            Self::OperationFailed(msg) => Self::OperationFailed(format!("{prefix}: {msg}")),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BackendError::ServiceUnavailable("refused".into()).error_kind(),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(
            BackendError::OperationFailed("timeout".into()).error_kind(),
            ErrorKind::InternalError
        );
        assert_eq!(
            BackendError::Verb {
                kind: ErrorKind::InstallFailed,
                message: "broken deps".into()
            }
            .error_kind(),
            ErrorKind::InstallFailed
        );
        assert_eq!(
            BackendError::FileNotFound("/tmp/x.rpm".into()).error_kind(),
            ErrorKind::FileNotFound
        );
    }

    #[test]
    fn test_context_prefixes_transport_only() {
        let err = BackendError::OperationFailed("Request timeout".into()).context("Install failed");
        assert_eq!(err.to_string(), "Install failed: Request timeout");

        let err = BackendError::ServiceUnavailable("refused".into()).context("Install failed");
        assert_eq!(err.to_string(), "Cannot connect to urpm service: refused");
    }
}
