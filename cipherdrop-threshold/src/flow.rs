//! Session authorization flow for gated decryption.
//!
//! Drives one decryption attempt end to end: create a session, obtain a
//! wallet signature over its personal message, build the approval intent,
//! then invoke the threshold client. A failed flow is terminal; retrying
//! means building a new flow with a fresh session.

use crate::client::ThresholdClient;
use crate::error::{ThresholdError, ThresholdResult};
use crate::intent::ApprovalIntent;
use crate::mime::detect_mime_type;
use crate::progress::ProgressEvent;
use crate::session::SessionKey;
use crate::signer::Signer;
use crate::types::{DecryptOptions, DecryptedPayload, DecryptionResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Observable state of a decryption flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    Created,
    SignaturePending,
    Signed,
    AuthorizationBuilt,
    Decrypting,
    Complete,
    Failed(String),
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed(_))
    }
}

/// One decryption attempt: a session, its signature, and the approval
/// intent, stepped through in order.
pub struct DecryptionFlow<S: Signer> {
    client: Arc<ThresholdClient>,
    signer: S,
    session: SessionKey,
    state: FlowState,
    intent: Option<ApprovalIntent>,
}

impl<S: Signer> DecryptionFlow<S> {
    /// Creates the flow and its session; the TTL clock starts now.
    pub fn new(client: Arc<ThresholdClient>, signer: S, address: &str, ttl_min: u32) -> Self {
        let package_id = client.config().package_id.clone();
        Self {
            client,
            signer,
            session: SessionKey::new(address, package_id, ttl_min),
            state: FlowState::Created,
            intent: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    /// Checks the step ordering without touching the state. An
    /// out-of-order call is a caller bug and must not poison the flow.
    fn expect_state(&self, expected: &FlowState, op: &str) -> ThresholdResult<()> {
        if &self.state != expected {
            return Err(ThresholdError::InvalidState(format!(
                "{op} requires state {expected:?}, flow is in {:?}",
                self.state
            )));
        }
        Ok(())
    }

    /// Moves the flow to its terminal failure state and passes the error
    /// through.
    fn fail(&mut self, err: ThresholdError) -> ThresholdError {
        self.state = FlowState::Failed(err.to_string());
        err
    }

    /// Requests the wallet signature over the session's personal message
    /// and attaches it. One awaited call, one terminal outcome.
    pub async fn request_signature(&mut self) -> ThresholdResult<()> {
        self.expect_state(&FlowState::Created, "request_signature")?;
        self.state = FlowState::SignaturePending;

        let message = self.session.personal_message();
        debug!(
            "requesting signature over {} byte personal message",
            message.len()
        );

        match self.signer.sign(&message).await {
            Ok(signature) => {
                self.session
                    .set_personal_message_signature(signature)
                    .map_err(|e| self.fail(e))?;
                self.state = FlowState::Signed;
                Ok(())
            }
            Err(rejected) => Err(self.fail(ThresholdError::SignatureRejected(rejected.0))),
        }
    }

    /// Builds the approval intent for one object and access-code pair.
    ///
    /// Fails fast with [`ThresholdError::SessionExpired`] when the TTL has
    /// elapsed, rather than letting a key server discover it later.
    pub fn build_authorization(&mut self, object_id: &str, access_code: &str) -> ThresholdResult<()> {
        self.expect_state(&FlowState::Signed, "build_authorization")?;

        if self.session.is_expired() {
            return Err(self.fail(ThresholdError::SessionExpired));
        }

        let config = self.client.config();
        self.intent = Some(ApprovalIntent::new(
            &config.package_id,
            &config.module_name,
            object_id,
            access_code,
        ));
        self.state = FlowState::AuthorizationBuilt;
        Ok(())
    }

    /// Runs the gated decryption and classifies the plaintext.
    pub async fn decrypt(
        &mut self,
        encrypted: &[u8],
        options: &DecryptOptions,
    ) -> ThresholdResult<DecryptionResult> {
        self.expect_state(&FlowState::AuthorizationBuilt, "decrypt")?;
        let intent = match self.intent.clone() {
            Some(intent) => intent,
            None => {
                return Err(self.fail(ThresholdError::InvalidState(
                    "authorization intent missing".to_string(),
                )))
            }
        };

        self.state = FlowState::Decrypting;
        let plaintext = match self.client.decrypt(encrypted, &self.session, &intent).await {
            Ok(plaintext) => plaintext,
            Err(e) => return Err(self.fail(e)),
        };

        let (payload, mime_type) = if options.is_text {
            (
                DecryptedPayload::Text(String::from_utf8_lossy(&plaintext).into_owned()),
                Some("text/plain".to_string()),
            )
        } else {
            let mime = detect_mime_type(&plaintext);
            (DecryptedPayload::Binary(plaintext), mime)
        };

        self.state = FlowState::Complete;
        Ok(DecryptionResult {
            payload,
            is_text: options.is_text,
            mime_type,
            timestamp_ms: Utc::now().timestamp_millis(),
        })
    }
}

/// Decrypts threshold-encrypted bytes end to end.
///
/// Creates a fresh session, obtains the signature, builds the approval
/// intent for `access_code`, and runs the gated decryption. Each call is
/// one attempt; calling again builds a new session.
pub async fn decrypt_data<S: Signer>(
    client: Arc<ThresholdClient>,
    signer: S,
    encrypted: &[u8],
    access_code: &str,
    address: &str,
    options: &DecryptOptions,
) -> ThresholdResult<DecryptionResult> {
    let sink = options.sink.clone();
    sink.emit(ProgressEvent::info(format!(
        "decrypting {} bytes with access code {}",
        encrypted.len(),
        crate::access_code::mask_code(access_code)
    )));

    let mut flow = DecryptionFlow::new(client, signer, address, options.ttl_min);
    sink.emit(ProgressEvent::info(format!(
        "session created, valid for {} min",
        options.ttl_min
    )));

    flow.request_signature().await.map_err(|e| {
        sink.emit(ProgressEvent::error(format!("signature step failed: {e}")));
        e
    })?;
    sink.emit(ProgressEvent::info("wallet signature attached"));

    flow.build_authorization(&options.object_id, access_code)
        .map_err(|e| {
            sink.emit(ProgressEvent::error(format!("authorization step failed: {e}")));
            e
        })?;
    sink.emit(ProgressEvent::info("approval intent built"));

    let result = flow.decrypt(encrypted, options).await.map_err(|e| {
        sink.emit(ProgressEvent::error(format!("decryption failed: {e}")));
        e
    })?;

    sink.emit(ProgressEvent::info(format!(
        "decryption complete, {} bytes recovered",
        result.payload.len()
    )));
    Ok(result)
}
