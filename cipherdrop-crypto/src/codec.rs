//! Reversible conversions between raw bytes, hex, and base64 text.
//!
//! These are the transport encodings used at the blob-store and key-server
//! boundaries. Each pair is an exact inverse of the other; decoding is
//! strict and fails with [`CryptoError::MalformedEncoding`] on any
//! deviation, including odd-length hex.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Encodes bytes as lowercase hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes a hex string into bytes.
pub fn hex_to_bytes(s: &str) -> CryptoResult<Vec<u8>> {
    hex::decode(s).map_err(|e| CryptoError::MalformedEncoding(format!("invalid hex: {e}")))
}

/// Encodes bytes as standard padded base64.
pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes a standard base64 string into bytes.
pub fn base64_to_bytes(s: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| CryptoError::MalformedEncoding(format!("invalid base64: {e}")))
}
