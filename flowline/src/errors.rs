//! Error types for the flowline crate.
//!
//! Failures in the signing workflow ride on the item that hit them instead of
//! aborting the stream, so every variant here must be inspectable by the
//! terminal consumer.

use thiserror::Error;

/// The main error type for flowline operations.
#[derive(Debug, Error)]
pub enum FlowlineError {
    /// Payload construction or encryption failed before the request was sent.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A remote call failed, possibly after exhausting the retry budget.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading key material from disk failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for FlowlineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl FlowlineError {
    /// Returns true if this error came from the transport layer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if this error came from decoding a response body.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FlowlineError::Encoding("bad padding".to_string());
        assert_eq!(err.to_string(), "encoding error: bad padding");

        let err = FlowlineError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn test_decode_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json")
            .expect_err("should fail to parse");
        let err = FlowlineError::from(parse_err);
        assert!(err.is_decode());
        assert!(err.to_string().starts_with("decode error:"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing key file");
        let err = FlowlineError::from(io_err);
        assert!(err.to_string().contains("missing key file"));
    }

    #[test]
    fn test_classification() {
        assert!(FlowlineError::Transport("x".into()).is_transport());
        assert!(!FlowlineError::Encoding("x".into()).is_transport());
    }
}
