//! Password-based symmetric encryption: PBKDF2-SHA256 key derivation plus
//! AES-256-CBC with PKCS#7 padding.
//!
//! The iteration count, hash, and cipher mode are fixed constants shared by
//! both directions. The envelope format has no version field, so changing
//! any of them breaks every envelope already produced.
//!
//! # Security notes
//!
//! The envelope carries no authentication tag (plain CBC, no HMAC). At
//! decrypt time a wrong password and corrupted ciphertext are
//! indistinguishable; both surface as [`CryptoError::DecryptionFailed`].
//! Moving to an authenticated mode would orphan existing envelopes, so the
//! gap is documented rather than fixed.

use crate::envelope::{Envelope, IV_SIZE, SALT_SIZE};
use crate::error::{CryptoError, CryptoResult};
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// PBKDF2 iteration count. Part of the wire contract; see the module docs.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derived key length in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// A 256-bit password-derived key. Zeroized on drop, never persisted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derives a 32-byte key from a password and salt via PBKDF2-HMAC-SHA256.
///
/// Deterministic for identical inputs. [`encrypt`] and [`decrypt`] always
/// pass [`PBKDF2_ITERATIONS`]; the count is a parameter here so tests can
/// use cheap values.
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> DerivedKey {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    DerivedKey(key)
}

/// Encrypts plaintext under a password, returning a fresh envelope.
///
/// Salt and IV are drawn from the OS RNG on every call. A fresh salt means
/// a fresh key, so an IV can never repeat under the same key.
pub fn encrypt(plaintext: &[u8], password: &str) -> Envelope {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt, PBKDF2_ITERATIONS);
    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Envelope { salt, iv, ciphertext }
}

/// Decrypts an envelope with the supplied password.
///
/// The key is re-derived from the envelope's embedded salt. Invalid PKCS#7
/// padding after the block decrypt means a wrong password or corrupted
/// data; the two cases cannot be told apart.
pub fn decrypt(envelope: &Envelope, password: &str) -> CryptoResult<Vec<u8>> {
    let key = derive_key(password, &envelope.salt, PBKDF2_ITERATIONS);
    Aes256CbcDec::new(key.as_bytes().into(), (&envelope.iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&envelope.ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Encrypts and packs to the wire layout in one step.
pub fn encrypt_to_bytes(plaintext: &[u8], password: &str) -> Vec<u8> {
    encrypt(plaintext, password).pack()
}

/// Unpacks a wire buffer and decrypts it in one step.
pub fn decrypt_from_bytes(bytes: &[u8], password: &str) -> CryptoResult<Vec<u8>> {
    let envelope = Envelope::unpack(bytes)?;
    decrypt(&envelope, password)
}
