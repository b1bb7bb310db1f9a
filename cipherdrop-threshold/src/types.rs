//! Shared types for threshold encryption operations.

use crate::config::{DEFAULT_OBJECT_ID, DEFAULT_SESSION_TTL_MIN};
use crate::error::{ThresholdError, ThresholdResult};
use crate::progress::{NullProgressSink, ProgressSink};
use crate::sealing::SealedShare;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The content key, handed back at encryption time as a recovery secret.
///
/// It bypasses the key servers entirely, so it is exactly as sensitive as
/// the plaintext. Never logged; the hex accessor exists for showing it to
/// the user once.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BackupKey([u8; 32]);

impl BackupKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        cipherdrop_crypto::bytes_to_hex(&self.0)
    }

    pub fn from_hex(encoded: &str) -> ThresholdResult<Self> {
        let bytes = cipherdrop_crypto::hex_to_bytes(encoded)?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ThresholdError::InvalidBackupKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for BackupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackupKey(..)")
    }
}

/// Metadata attached to an encryption result.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    /// Unix timestamp in milliseconds, set when encryption completes.
    pub timestamp_ms: i64,
}

/// Options for threshold encryption.
#[derive(Clone)]
pub struct EncryptOptions {
    /// Servers required to decrypt; `None` uses the configured default.
    pub threshold: Option<u8>,
    /// Caller-supplied metadata carried into the result.
    pub metadata: EncryptionMetadata,
    /// Sink receiving progress events.
    pub sink: Arc<dyn ProgressSink>,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            threshold: None,
            metadata: EncryptionMetadata::default(),
            sink: Arc::new(NullProgressSink),
        }
    }
}

/// Options for the gated decryption flow.
#[derive(Clone)]
pub struct DecryptOptions {
    /// Session lifetime in minutes.
    pub ttl_min: u32,
    /// Decode the plaintext as UTF-8 text instead of bytes.
    pub is_text: bool,
    /// Target object passed to the approval call.
    pub object_id: String,
    /// Sink receiving progress events.
    pub sink: Arc<dyn ProgressSink>,
}

impl Default for DecryptOptions {
    fn default() -> Self {
        Self {
            ttl_min: DEFAULT_SESSION_TTL_MIN,
            is_text: false,
            object_id: DEFAULT_OBJECT_ID.to_string(),
            sink: Arc::new(NullProgressSink),
        }
    }
}

/// Output of a successful threshold encryption.
#[derive(Clone, Debug)]
pub struct ThresholdEncryptionResult {
    /// Serialized threshold object, ready for blob storage.
    pub encrypted_data: Vec<u8>,
    /// Content key escape hatch; as sensitive as the plaintext.
    pub backup_key: BackupKey,
    /// Base64 transport encoding of `encrypted_data`.
    pub base64_data: String,
    pub metadata: EncryptionMetadata,
}

/// Decrypted payload, either raw bytes or decoded text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecryptedPayload {
    Binary(Vec<u8>),
    Text(String),
}

impl DecryptedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Output of a completed decryption flow.
#[derive(Clone, Debug)]
pub struct DecryptionResult {
    pub payload: DecryptedPayload,
    pub is_text: bool,
    /// Best-effort sniff; `None` when the payload is under four bytes.
    pub mime_type: Option<String>,
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: i64,
}

/// Wire form of a threshold-encrypted payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThresholdObject {
    /// Access-control package gating decryption.
    pub package_id: String,
    /// Hex-encoded identity string the payload was sealed under.
    pub identity_hex: String,
    /// Minimum shares required to recover the content key.
    pub threshold: u8,
    /// One sealed share per key server.
    pub shares: Vec<ShareEntry>,
    /// AEAD nonce for the payload.
    pub nonce: [u8; 12],
    /// ChaCha20-Poly1305 ciphertext with the tag appended.
    pub ciphertext: Vec<u8>,
}

/// A single server's sealed share of the content key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareEntry {
    /// Key server base URL.
    pub server_url: String,
    /// Shamir evaluation point.
    pub index: u8,
    /// Share sealed to the server's public key.
    pub sealed: SealedShare,
}
