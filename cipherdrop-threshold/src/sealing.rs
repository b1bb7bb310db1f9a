//! Sealing key shares to key-server public keys.
//!
//! X25519 key agreement plus XSalsa20-Poly1305. Every seal uses a fresh
//! ephemeral keypair, so sealed shares carry no sender identity and two
//! seals of the same share never look alike.

use crate::error::{ThresholdError, ThresholdResult};
use crypto_box::aead::Aead;
use crypto_box::{Nonce, PublicKey, SalsaBox, SecretKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// X25519 keypair held by a key server.
///
/// The secret half zeroizes on drop.
pub struct ServerKeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl ServerKeyPair {
    pub fn generate() -> Self {
        let secret = SecretKey::generate(&mut rand::rngs::OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Raw public key bytes, as published by the server.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Base64 form of the public key, as carried in configs.
    pub fn public_base64(&self) -> String {
        cipherdrop_crypto::bytes_to_base64(self.public.as_bytes())
    }
}

/// A key share sealed to one server's public key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SealedShare {
    /// Sender side of the key agreement, generated per seal.
    pub ephemeral_public_key: [u8; 32],
    /// XSalsa20 nonce.
    pub nonce: [u8; 24],
    /// Ciphertext with the Poly1305 tag appended.
    pub ciphertext: Vec<u8>,
}

/// Seals `share` so only the holder of `server_pk`'s secret can open it.
pub fn seal_share(share: &[u8], server_pk: &PublicKey) -> ThresholdResult<SealedShare> {
    let ephemeral = SecretKey::generate(&mut rand::rngs::OsRng);
    let ephemeral_pk = ephemeral.public_key();

    let salsa_box = SalsaBox::new(server_pk, &ephemeral);

    let mut nonce_bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = salsa_box
        .encrypt(Nonce::from_slice(&nonce_bytes), share)
        .map_err(|e| ThresholdError::Sealing(format!("seal failed: {e}")))?;

    Ok(SealedShare {
        ephemeral_public_key: *ephemeral_pk.as_bytes(),
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Opens a sealed share with the server's secret key.
pub fn open_share(sealed: &SealedShare, server_sk: &SecretKey) -> ThresholdResult<Vec<u8>> {
    let ephemeral_pk = PublicKey::from(sealed.ephemeral_public_key);
    let salsa_box = SalsaBox::new(&ephemeral_pk, server_sk);

    salsa_box
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_ref())
        .map_err(|_| {
            ThresholdError::Sealing("open failed (wrong key or tampered share)".to_string())
        })
}

/// Parses a base64-encoded 32-byte X25519 public key.
pub fn public_key_from_base64(encoded: &str) -> ThresholdResult<PublicKey> {
    let bytes = cipherdrop_crypto::base64_to_bytes(encoded)?;
    let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ThresholdError::Config(format!("public key must be 32 bytes, got {}", bytes.len()))
    })?;
    Ok(PublicKey::from(bytes))
}
