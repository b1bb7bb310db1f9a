//! Shamir secret sharing over GF(256) for the content key.
//!
//! Each byte of the secret is shared independently with a random
//! polynomial of degree `threshold - 1` whose constant term is the secret
//! byte. Shares are evaluations at x = 1..=n; recovery is Lagrange
//! interpolation at x = 0, where any `threshold` distinct shares suffice.

use crate::error::{ThresholdError, ThresholdResult};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the secrets this module splits.
pub const SECRET_SIZE: usize = 32;

/// One share of a split secret.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyShare {
    /// Evaluation point, never zero.
    pub index: u8,
    /// Per-byte polynomial evaluations.
    pub data: [u8; SECRET_SIZE],
}

/// Multiplication in GF(2^8) with the AES reduction polynomial.
fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1B;
        }
        b >>= 1;
    }
    product
}

fn gf_pow(a: u8, mut exp: u8) -> u8 {
    let mut base = a;
    let mut result = 1u8;
    while exp != 0 {
        if exp & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exp >>= 1;
    }
    result
}

/// Multiplicative inverse via a^254; zero has none.
fn gf_inv(a: u8) -> ThresholdResult<u8> {
    if a == 0 {
        return Err(ThresholdError::ShareRecovery(
            "zero denominator in interpolation".to_string(),
        ));
    }
    Ok(gf_pow(a, 254))
}

/// Splits `secret` into `n` shares, any `threshold` of which recover it.
pub fn split_secret(
    secret: &[u8; SECRET_SIZE],
    threshold: u8,
    n: u8,
) -> ThresholdResult<Vec<KeyShare>> {
    if threshold == 0 || threshold > n {
        return Err(ThresholdError::InvalidThreshold {
            threshold,
            servers: n as usize,
        });
    }

    // Per-byte coefficients; index 0 is the secret byte, the rest random.
    let mut coefficients: Vec<Vec<u8>> = Vec::with_capacity(SECRET_SIZE);
    for byte in secret.iter() {
        let mut coeffs = vec![0u8; threshold as usize];
        coeffs[0] = *byte;
        if threshold > 1 {
            OsRng.fill_bytes(&mut coeffs[1..]);
        }
        coefficients.push(coeffs);
    }

    let mut shares = Vec::with_capacity(n as usize);
    for x in 1..=n {
        let mut data = [0u8; SECRET_SIZE];
        for (byte_idx, coeffs) in coefficients.iter().enumerate() {
            let mut acc = 0u8;
            let mut x_pow = 1u8;
            for &coeff in coeffs {
                acc ^= gf_mul(coeff, x_pow);
                x_pow = gf_mul(x_pow, x);
            }
            data[byte_idx] = acc;
        }
        shares.push(KeyShare { index: x, data });
    }

    for coeffs in coefficients.iter_mut() {
        coeffs.zeroize();
    }
    Ok(shares)
}

/// Recovers the secret from at least `threshold` distinct shares.
pub fn recover_secret(
    shares: &[KeyShare],
    threshold: u8,
) -> ThresholdResult<[u8; SECRET_SIZE]> {
    if shares.len() < threshold as usize {
        return Err(ThresholdError::ShareRecovery(format!(
            "{} shares provided, {threshold} required",
            shares.len()
        )));
    }

    let used = &shares[..threshold as usize];
    for (i, share) in used.iter().enumerate() {
        if share.index == 0 {
            return Err(ThresholdError::ShareRecovery(
                "share index must not be zero".to_string(),
            ));
        }
        if used[..i].iter().any(|other| other.index == share.index) {
            return Err(ThresholdError::ShareRecovery(format!(
                "duplicate share index {}",
                share.index
            )));
        }
    }

    let mut secret = [0u8; SECRET_SIZE];
    for byte_idx in 0..SECRET_SIZE {
        let mut acc = 0u8;
        for (i, share) in used.iter().enumerate() {
            // Lagrange basis polynomial evaluated at x = 0.
            let mut numerator = 1u8;
            let mut denominator = 1u8;
            for (j, other) in used.iter().enumerate() {
                if i == j {
                    continue;
                }
                numerator = gf_mul(numerator, other.index);
                // Subtraction in GF(2^8) is xor.
                denominator = gf_mul(denominator, other.index ^ share.index);
            }
            let basis = gf_mul(numerator, gf_inv(denominator)?);
            acc ^= gf_mul(share.data[byte_idx], basis);
        }
        secret[byte_idx] = acc;
    }
    Ok(secret)
}
