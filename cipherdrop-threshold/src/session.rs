//! Short-lived session credentials for gated decryption.

use crate::error::{ThresholdError, ThresholdResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single-use credential authorizing one decryption session.
///
/// The TTL clock starts at construction. A signature over the personal
/// message can be attached exactly once; key servers reject certificates
/// from unsigned or expired sessions, and the client checks both before
/// contacting them.
#[derive(Clone, Debug)]
pub struct SessionKey {
    session_id: Uuid,
    address: String,
    package_id: String,
    ttl_min: u32,
    created_at: DateTime<Utc>,
    signature: Option<Vec<u8>>,
}

impl SessionKey {
    /// Creates an unsigned session for `address` scoped to `package_id`.
    pub fn new(address: impl Into<String>, package_id: impl Into<String>, ttl_min: u32) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            address: address.into(),
            package_id: package_id.into(),
            ttl_min,
            created_at: Utc::now(),
            signature: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn ttl_min(&self) -> u32 {
        self.ttl_min
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The canonical message presented to the signer.
    ///
    /// Human readable so wallets can display it, and deterministic for a
    /// given session: signing twice would produce a signature over the
    /// same bytes.
    pub fn personal_message(&self) -> Vec<u8> {
        format!(
            "Requesting access to package {} for {} min\nsession: {}\ncreated: {}",
            self.package_id,
            self.ttl_min,
            self.session_id,
            self.created_at.to_rfc3339(),
        )
        .into_bytes()
    }

    /// Attaches the signature over the personal message.
    ///
    /// A session accepts exactly one signature; a second attempt fails
    /// with [`ThresholdError::SessionAlreadySigned`].
    pub fn set_personal_message_signature(&mut self, signature: Vec<u8>) -> ThresholdResult<()> {
        if self.signature.is_some() {
            return Err(ThresholdError::SessionAlreadySigned);
        }
        self.signature = Some(signature);
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::minutes(i64::from(self.ttl_min))
    }

    /// True once the TTL has elapsed.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at()
    }

    /// Builds the certificate presented to key servers.
    ///
    /// Fails when the session is unsigned or expired.
    pub fn certificate(&self) -> ThresholdResult<SessionCertificate> {
        let signature = self
            .signature
            .as_ref()
            .ok_or(ThresholdError::SessionNotSigned)?;
        if self.is_expired() {
            return Err(ThresholdError::SessionExpired);
        }
        Ok(SessionCertificate {
            session_id: self.session_id,
            address: self.address.clone(),
            package_id: self.package_id.clone(),
            created_at: self.created_at,
            ttl_min: self.ttl_min,
            signature_b64: cipherdrop_crypto::bytes_to_base64(signature),
        })
    }

    /// Backdates the session so expiry paths can be tested without sleeping.
    #[cfg(test)]
    pub fn backdate(&mut self, minutes: i64) {
        self.created_at -= Duration::minutes(minutes);
    }
}

/// Wire form of a signed session, sent to key servers with each request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCertificate {
    pub session_id: Uuid,
    pub address: String,
    pub package_id: String,
    pub created_at: DateTime<Utc>,
    pub ttl_min: u32,
    pub signature_b64: String,
}
