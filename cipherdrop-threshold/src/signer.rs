//! Signing capability for session authorization.

use std::future::Future;
use thiserror::Error;

/// Returned when a signer declines to sign a message.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SignerRejected(pub String);

/// A capability that signs session personal messages.
///
/// Any wallet, hardware key, or test double can implement this. One
/// invocation produces exactly one terminal outcome; the flow awaits it
/// once and never retries on the same session.
pub trait Signer: Send + Sync {
    /// Signs the canonical personal message, returning signature bytes.
    fn sign(&self, message: &[u8]) -> impl Future<Output = Result<Vec<u8>, SignerRejected>> + Send;
}
