//! Crypto layer error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from codec, envelope, and cipher operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("invalid salt length: expected {expected}, got {actual}")]
    InvalidSaltLength { expected: usize, actual: usize },

    #[error("invalid iv length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("envelope too short: {actual} bytes")]
    EnvelopeTooShort { actual: usize },

    #[error("decryption failed: wrong password or corrupted data")]
    DecryptionFailed,
}
