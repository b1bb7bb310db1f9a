//! Pickup code generation and validation.
//!
//! Codes double as the identity string a payload is encrypted under, so
//! the code typed at pickup must match the one used at drop exactly.

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Characters eligible for generated codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated codes unless the caller asks for another.
pub const DEFAULT_CODE_LENGTH: usize = 16;

/// Minimum length accepted at validation time.
pub const MIN_CODE_LENGTH: usize = 8;

/// Generates a random alphanumeric pickup code of `length` characters.
///
/// Draws from the OS CSPRNG. If the entropy source fails, falls back to a
/// time-seeded non-cryptographic generator and logs a warning; callers
/// that cannot accept weaker codes should treat that warning as fatal.
pub fn generate_access_code(length: usize) -> String {
    let mut raw = vec![0u8; length];
    if let Err(e) = OsRng.try_fill_bytes(&mut raw) {
        warn!("OS entropy source unavailable, falling back to a non-cryptographic generator: {e}");
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        SmallRng::seed_from_u64(seed).fill_bytes(&mut raw);
    }
    raw.iter()
        .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
        .collect()
}

/// Generates a pickup code of [`DEFAULT_CODE_LENGTH`] characters.
pub fn generate_default_access_code() -> String {
    generate_access_code(DEFAULT_CODE_LENGTH)
}

/// Checks the pickup code format: ASCII alphanumeric, at least
/// [`MIN_CODE_LENGTH`] characters.
pub fn validate_access_code(code: &str) -> bool {
    code.len() >= MIN_CODE_LENGTH && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Masks a code for progress messages: first three characters, then stars.
pub(crate) fn mask_code(code: &str) -> String {
    let prefix: String = code.chars().take(3).collect();
    format!("{prefix}****")
}
