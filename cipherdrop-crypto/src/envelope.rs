//! Fixed-layout binary envelope for password-encrypted payloads.
//!
//! Wire format, positional with no header and no version tag:
//!
//! ```text
//! offset 0..16   salt (16 raw bytes)
//! offset 16..32  iv   (16 raw bytes)
//! offset 32..    ciphertext (variable length)
//! ```
//!
//! Consumers must know out-of-band that a blob is an envelope; there is no
//! magic number. The layout carries no checksum or authentication tag, so
//! integrity is outside this layer's contract.

use crate::error::{CryptoError, CryptoResult};

/// Salt segment length in bytes.
pub const SALT_SIZE: usize = 16;
/// IV segment length in bytes.
pub const IV_SIZE: usize = 16;

/// A `salt ‖ iv ‖ ciphertext` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Builds an envelope from raw segments, validating segment lengths.
    pub fn new(salt: &[u8], iv: &[u8], ciphertext: Vec<u8>) -> CryptoResult<Self> {
        let salt: [u8; SALT_SIZE] =
            salt.try_into().map_err(|_| CryptoError::InvalidSaltLength {
                expected: SALT_SIZE,
                actual: salt.len(),
            })?;
        let iv: [u8; IV_SIZE] = iv.try_into().map_err(|_| CryptoError::InvalidIvLength {
            expected: IV_SIZE,
            actual: iv.len(),
        })?;
        Ok(Self { salt, iv, ciphertext })
    }

    /// Serializes to the positional wire layout.
    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_SIZE + IV_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parses the positional wire layout.
    ///
    /// Any buffer of 32 bytes or fewer is rejected: an envelope with an
    /// empty ciphertext is indistinguishable from a truncated one.
    pub fn unpack(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() <= SALT_SIZE + IV_SIZE {
            return Err(CryptoError::EnvelopeTooShort { actual: bytes.len() });
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[..SALT_SIZE]);
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&bytes[SALT_SIZE..SALT_SIZE + IV_SIZE]);

        Ok(Self {
            salt,
            iv,
            ciphertext: bytes[SALT_SIZE + IV_SIZE..].to_vec(),
        })
    }
}

/// Packs raw segments into the wire layout in one step.
pub fn pack(salt: &[u8], iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    Ok(Envelope::new(salt, iv, ciphertext.to_vec())?.pack())
}

/// Splits a packed buffer into its envelope segments.
pub fn unpack(bytes: &[u8]) -> CryptoResult<Envelope> {
    Envelope::unpack(bytes)
}
