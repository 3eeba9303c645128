//! Cipher engine error types.

use crate::primitive::PrimitiveError;
use thiserror::Error;

/// Errors reported by descriptor resolution and cipher sessions.
///
/// `CipherOperationFailed` and `TagMismatch` are fatal to the session that
/// produced them; every other variant is reported before any state changes.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The name does not resolve to any known primitive
    #[error("unknown cipher: {0}")]
    UnknownCipher(String),

    /// The name resolves, but its mode is not supported by this engine
    #[error("unsupported cipher mode: {0}")]
    UnsupportedMode(String),

    /// Key length does not match the descriptor
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// IV length does not match the descriptor
    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Direction flag other than 0 (decrypt) or 1 (encrypt)
    #[error("invalid direction flag: {0}")]
    InvalidDirection(i32),

    /// Operation called out of the allowed order
    #[error("invalid session state: {0}")]
    InvalidSessionState(&'static str),

    /// Requested or supplied tag length outside 1..=16
    #[error("invalid tag length: {0}")]
    InvalidTagLength(usize),

    /// The underlying primitive rejected an init, update or finalize call
    #[error("cipher operation failed: {0}")]
    CipherOperationFailed(#[source] PrimitiveError),

    /// Authentication tag verification failed
    #[error("authentication failed: tag mismatch")]
    TagMismatch,

    /// Session configuration could not be loaded or is out of range
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<PrimitiveError> for CipherError {
    fn from(err: PrimitiveError) -> Self {
        match err {
            PrimitiveError::AuthenticationFailed => Self::TagMismatch,
            PrimitiveError::TagLength(len) => Self::InvalidTagLength(len),
            other => Self::CipherOperationFailed(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_failure_maps_to_tag_mismatch() {
        let err = CipherError::from(PrimitiveError::AuthenticationFailed);
        assert!(matches!(err, CipherError::TagMismatch));
    }

    #[test]
    fn test_tag_length_maps_to_invalid_tag_length() {
        let err = CipherError::from(PrimitiveError::TagLength(17));
        assert!(matches!(err, CipherError::InvalidTagLength(17)));
    }

    #[test]
    fn test_other_primitive_errors_are_operation_failures() {
        let err = CipherError::from(PrimitiveError::BadDecrypt);
        assert!(matches!(
            err,
            CipherError::CipherOperationFailed(PrimitiveError::BadDecrypt)
        ));
        assert!(err.to_string().contains("cipher operation failed"));
    }

    #[test]
    fn test_display_includes_lengths() {
        let err = CipherError::InvalidKeyLength {
            expected: 16,
            actual: 15,
        };
        assert_eq!(err.to_string(), "invalid key length: expected 16, got 15");
    }
}
