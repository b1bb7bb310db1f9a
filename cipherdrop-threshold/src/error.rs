//! Error types for threshold encryption and session authorization.

use thiserror::Error;

/// Convenience alias for threshold operations.
pub type ThresholdResult<T> = Result<T, ThresholdError>;

/// Errors surfaced by the threshold client and the decryption flow.
#[derive(Debug, Error)]
pub enum ThresholdError {
    /// The signer declined to sign the session's personal message.
    #[error("signature request rejected: {0}")]
    SignatureRejected(String),

    /// A signature was already attached to this session.
    #[error("session key already carries a signature")]
    SessionAlreadySigned,

    /// The session's time-to-live has elapsed.
    #[error("session key expired")]
    SessionExpired,

    /// The session has no signature attached yet.
    #[error("session key has no signature attached")]
    SessionNotSigned,

    /// At least one key server explicitly refused to release its share.
    #[error("authorization denied by key servers")]
    AuthorizationDenied,

    /// Too few key servers answered to reach the threshold.
    #[error("only {responded} of {required} required key servers responded")]
    ThresholdUnreachable { responded: usize, required: usize },

    /// The identity string gating the payload was empty.
    #[error("identity string must not be empty")]
    EmptyIdentity,

    /// The requested threshold cannot be met by the configured servers.
    #[error("invalid threshold {threshold} for {servers} key servers")]
    InvalidThreshold { threshold: u8, servers: usize },

    /// A flow step was invoked out of order.
    #[error("invalid flow state: {0}")]
    InvalidState(String),

    /// Combining shares back into the content key failed.
    #[error("share recovery failed: {0}")]
    ShareRecovery(String),

    /// Sealing a share to a server key, or opening one, failed.
    #[error("share sealing failed: {0}")]
    Sealing(String),

    /// A key server returned an unusable response.
    #[error("key server error: {0}")]
    KeyServer(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("decryption error: {0}")]
    Decryption(String),

    /// Invalid backup key material.
    #[error("invalid backup key: {0}")]
    InvalidBackupKey(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] cipherdrop_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
