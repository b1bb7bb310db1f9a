//! Password-based encryption core for CipherDrop.
//!
//! Provides:
//! - Transport codecs (hex, base64)
//! - The fixed-layout `salt ‖ iv ‖ ciphertext` envelope
//! - PBKDF2-SHA256 key derivation and AES-256-CBC/PKCS#7 encryption
//!
//! # Format compatibility
//!
//! The envelope layout, the PBKDF2 iteration count, and the cipher mode are
//! frozen. Envelopes carry no version field, so every constant in this
//! crate is part of the wire contract. Known gap, kept deliberately: the
//! envelope has no integrity tag (plain CBC, no HMAC); adding one would
//! invalidate every envelope already produced.

pub mod cipher;
pub mod codec;
pub mod envelope;
mod error;

pub use cipher::{
    decrypt, decrypt_from_bytes, derive_key, encrypt, encrypt_to_bytes, DerivedKey, KEY_SIZE,
    PBKDF2_ITERATIONS,
};
pub use codec::{base64_to_bytes, bytes_to_base64, bytes_to_hex, hex_to_bytes};
pub use envelope::{pack, unpack, Envelope, IV_SIZE, SALT_SIZE};
pub use error::{CryptoError, CryptoResult};
