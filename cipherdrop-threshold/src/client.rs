//! Threshold encryption client.
//!
//! Encryption happens locally: the payload is sealed under a fresh
//! content key, the key is split into shares, and each share is sealed to
//! one key server's public key. Decryption asks each server to release
//! its share, gated on a signed session certificate and the approval
//! intent; any threshold of released shares recovers the content key.

use crate::access_code::mask_code;
use crate::config::{KeyServerEntry, ThresholdConfig};
use crate::error::{ThresholdError, ThresholdResult};
use crate::intent::ApprovalIntent;
use crate::mime::detect_file_type;
use crate::progress::ProgressEvent;
use crate::sealing::{self, SealedShare};
use crate::session::{SessionCertificate, SessionKey};
use crate::shamir::{self, KeyShare};
use crate::types::{
    BackupKey, EncryptOptions, ShareEntry, ThresholdEncryptionResult, ThresholdObject,
};
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use chrono::Utc;
use crypto_box::PublicKey;
use rand::rngs::OsRng;
use rand::RngCore;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Client for the multi-server threshold encryption scheme.
pub struct ThresholdClient {
    http: Client,
    config: ThresholdConfig,
    /// Server sealing keys, resolved once and cached.
    server_keys: Arc<RwLock<HashMap<String, PublicKey>>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceInfo {
    service_id: String,
    public_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchKeyRequest<'a> {
    certificate: &'a SessionCertificate,
    intent_b64: &'a str,
    share_index: u8,
    sealed_share: &'a SealedShare,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchKeyResponse {
    share: String,
}

enum FetchOutcome {
    Granted(KeyShare),
    Denied,
}

impl ThresholdClient {
    pub fn new(config: ThresholdConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            config,
            server_keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key server discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns a server's sealing key, resolving and caching it on miss.
    async fn server_key(&self, entry: &KeyServerEntry) -> ThresholdResult<PublicKey> {
        {
            let keys = self.server_keys.read().await;
            if let Some(key) = keys.get(&entry.url) {
                return Ok(key.clone());
            }
        }

        let key = self.resolve_server_key(entry).await?;
        let mut keys = self.server_keys.write().await;
        keys.insert(entry.url.clone(), key.clone());
        Ok(key)
    }

    /// Pinned keys are used directly unless verification is on; otherwise
    /// the key is fetched from the server, and a pin that disagrees with
    /// the reported key fails the lookup.
    async fn resolve_server_key(&self, entry: &KeyServerEntry) -> ThresholdResult<PublicKey> {
        match (&entry.public_key, self.config.verify_key_servers) {
            (Some(pinned), false) => sealing::public_key_from_base64(pinned),
            (pinned, _) => {
                let reported = self.fetch_service_key(&entry.url).await?;
                if let Some(pinned) = pinned {
                    let pinned_key = sealing::public_key_from_base64(pinned)?;
                    if pinned_key.as_bytes() != reported.as_bytes() {
                        return Err(ThresholdError::Config(format!(
                            "key server {} reported a key that does not match its pin",
                            entry.url
                        )));
                    }
                }
                Ok(reported)
            }
        }
    }

    async fn fetch_service_key(&self, url: &str) -> ThresholdResult<PublicKey> {
        let info: ServiceInfo = self
            .http
            .get(format!("{url}/v1/service"))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ThresholdError::KeyServer(e.to_string()))?
            .json()
            .await?;
        debug!("key server {url} reports service {}", info.service_id);
        sealing::public_key_from_base64(&info.public_key)
    }

    /// Resolves every configured server's key, enforcing pins.
    ///
    /// Useful at startup so a misconfigured server fails loudly instead of
    /// during the first encrypt.
    pub async fn verify_key_servers(&self) -> ThresholdResult<()> {
        for entry in &self.config.key_servers {
            let reported = self.fetch_service_key(&entry.url).await?;
            if let Some(pinned) = &entry.public_key {
                let pinned_key = sealing::public_key_from_base64(pinned)?;
                if pinned_key.as_bytes() != reported.as_bytes() {
                    return Err(ThresholdError::Config(format!(
                        "key server {} reported a key that does not match its pin",
                        entry.url
                    )));
                }
            }
            let mut keys = self.server_keys.write().await;
            keys.insert(entry.url.clone(), reported);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Encrypt
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypts `data` gated on `identity`, returning the serialized
    /// threshold object and the backup key.
    ///
    /// The identity is usually a pickup code; decryption later requires
    /// proving knowledge of the exact same string to the key servers.
    pub async fn encrypt(
        &self,
        data: &[u8],
        identity: &str,
        options: &EncryptOptions,
    ) -> ThresholdResult<ThresholdEncryptionResult> {
        if identity.is_empty() {
            return Err(ThresholdError::EmptyIdentity);
        }
        let servers = &self.config.key_servers;
        if servers.is_empty() || servers.len() > u8::MAX as usize {
            return Err(ThresholdError::Config(format!(
                "{} key servers configured, need between 1 and 255",
                servers.len()
            )));
        }
        let threshold = options.threshold.unwrap_or(self.config.default_threshold);
        if threshold == 0 || threshold as usize > servers.len() {
            return Err(ThresholdError::InvalidThreshold {
                threshold,
                servers: servers.len(),
            });
        }

        let sink = &options.sink;
        sink.emit(ProgressEvent::info(format!("encrypting {} bytes", data.len())));
        sink.emit(ProgressEvent::info(format!(
            "sealing under access code {}",
            mask_code(identity)
        )));
        sink.emit(ProgressEvent::info(format!(
            "threshold {threshold} of {} key servers",
            servers.len()
        )));

        // Fresh content key; this is also the backup key.
        let mut key_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut key_bytes);
        let mut nonce = [0u8; 12];
        OsRng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new((&key_bytes).into());
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), data)
            .map_err(|e| ThresholdError::Encryption(format!("payload seal failed: {e}")))?;

        let shares = shamir::split_secret(&key_bytes, threshold, servers.len() as u8)?;

        let mut entries = Vec::with_capacity(servers.len());
        for (server, share) in servers.iter().zip(&shares) {
            let server_pk = self.server_key(server).await?;
            let sealed = sealing::seal_share(&share.data, &server_pk)?;
            entries.push(ShareEntry {
                server_url: server.url.clone(),
                index: share.index,
                sealed,
            });
        }

        let object = ThresholdObject {
            package_id: self.config.package_id.clone(),
            identity_hex: cipherdrop_crypto::bytes_to_hex(identity.as_bytes()),
            threshold,
            shares: entries,
            nonce,
            ciphertext,
        };

        let encrypted_data = serde_json::to_vec(&object)?;
        let base64_data = cipherdrop_crypto::bytes_to_base64(&encrypted_data);
        sink.emit(ProgressEvent::info(format!(
            "encryption complete, {} bytes sealed",
            encrypted_data.len()
        )));

        let mut metadata = options.metadata.clone();
        metadata.timestamp_ms = Utc::now().timestamp_millis();

        Ok(ThresholdEncryptionResult {
            encrypted_data,
            backup_key: BackupKey::from_bytes(key_bytes),
            base64_data,
            metadata,
        })
    }

    /// Encrypts file content, deriving metadata from the filename.
    pub async fn encrypt_file(
        &self,
        data: &[u8],
        filename: &str,
        access_code: &str,
        options: &EncryptOptions,
    ) -> ThresholdResult<ThresholdEncryptionResult> {
        let mut opts = options.clone();
        opts.metadata.filename = Some(filename.to_string());
        if opts.metadata.mime_type.is_none() {
            opts.metadata.mime_type = Some(detect_file_type(Some(filename), None));
        }
        opts.metadata.file_size = Some(data.len() as u64);
        self.encrypt(data, access_code, &opts).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decrypt
    // ─────────────────────────────────────────────────────────────────────────

    /// Decrypts a threshold object by collecting shares from key servers.
    ///
    /// The session must be signed and unexpired; both are checked before
    /// any server is contacted. Shares are requested from every server at
    /// once; collection stops as soon as the threshold is met and any
    /// requests still in flight are aborted. Servers that explicitly deny
    /// dominate servers that never answered when reporting failure: a
    /// denial means the proof was judged and refused.
    pub async fn decrypt(
        &self,
        encrypted: &[u8],
        session: &SessionKey,
        intent: &ApprovalIntent,
    ) -> ThresholdResult<Vec<u8>> {
        if !session.is_signed() {
            return Err(ThresholdError::SessionNotSigned);
        }
        if session.is_expired() {
            return Err(ThresholdError::SessionExpired);
        }

        let object: ThresholdObject = serde_json::from_slice(encrypted)?;
        let certificate = session.certificate()?;
        let intent_b64 = cipherdrop_crypto::bytes_to_base64(&intent.to_bytes()?);

        // One fetch task per server, funneled through a channel so
        // collection can stop at the threshold without waiting on
        // stragglers.
        let (outcome_tx, mut outcome_rx) = mpsc::channel(object.shares.len().max(1));
        let mut fetches = Vec::with_capacity(object.shares.len());
        for entry in &object.shares {
            let http = self.http.clone();
            let entry = entry.clone();
            let certificate = certificate.clone();
            let intent_b64 = intent_b64.clone();
            let outcome_tx = outcome_tx.clone();
            fetches.push(tokio::spawn(async move {
                let outcome = fetch_share(&http, &entry, &certificate, &intent_b64).await;
                let _ = outcome_tx.send((entry.server_url, outcome)).await;
            }));
        }
        drop(outcome_tx);

        let required = object.threshold as usize;
        let mut granted: Vec<KeyShare> = Vec::new();
        let mut denied = 0usize;
        let mut responded = 0usize;

        while granted.len() < required {
            let Some((server_url, outcome)) = outcome_rx.recv().await else {
                break;
            };
            match outcome {
                Ok(FetchOutcome::Granted(share)) => {
                    responded += 1;
                    granted.push(share);
                }
                Ok(FetchOutcome::Denied) => {
                    responded += 1;
                    denied += 1;
                }
                Err(e) => {
                    warn!("key server {server_url} did not release a share: {e}");
                }
            }
        }
        // Shares past the threshold are worthless; stop asking for them.
        for fetch in &fetches {
            fetch.abort();
        }

        if granted.len() < required {
            if denied > 0 {
                return Err(ThresholdError::AuthorizationDenied);
            }
            return Err(ThresholdError::ThresholdUnreachable {
                responded,
                required,
            });
        }

        let key_bytes = shamir::recover_secret(&granted, object.threshold)?;
        open_payload(&object, &key_bytes)
    }

    /// Decrypts with the backup key, bypassing every key server.
    pub fn decrypt_with_backup_key(
        &self,
        encrypted: &[u8],
        backup_key: &BackupKey,
    ) -> ThresholdResult<Vec<u8>> {
        let object: ThresholdObject = serde_json::from_slice(encrypted)?;
        open_payload(&object, backup_key.as_bytes())
    }
}

/// Asks one key server to release its share, presenting the session
/// certificate and the approval intent as proof material.
async fn fetch_share(
    http: &Client,
    entry: &ShareEntry,
    certificate: &SessionCertificate,
    intent_b64: &str,
) -> ThresholdResult<FetchOutcome> {
    let request = FetchKeyRequest {
        certificate,
        intent_b64,
        share_index: entry.index,
        sealed_share: &entry.sealed,
    };

    let resp = http
        .post(format!("{}/v1/fetch_key", entry.server_url))
        .json(&request)
        .send()
        .await?;

    if resp.status() == StatusCode::FORBIDDEN {
        debug!("key server {} denied the request", entry.server_url);
        return Ok(FetchOutcome::Denied);
    }

    let resp = resp
        .error_for_status()
        .map_err(|e| ThresholdError::KeyServer(e.to_string()))?;
    let body: FetchKeyResponse = resp.json().await?;

    let bytes = cipherdrop_crypto::base64_to_bytes(&body.share)?;
    let data: [u8; shamir::SECRET_SIZE] = bytes.as_slice().try_into().map_err(|_| {
        ThresholdError::KeyServer(format!(
            "server {} returned a share of {} bytes",
            entry.server_url,
            bytes.len()
        ))
    })?;
    Ok(FetchOutcome::Granted(KeyShare {
        index: entry.index,
        data,
    }))
}

/// Opens the AEAD payload with a recovered or backup content key.
fn open_payload(object: &ThresholdObject, key_bytes: &[u8; 32]) -> ThresholdResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key_bytes.into());
    cipher
        .decrypt(Nonce::from_slice(&object.nonce), object.ciphertext.as_ref())
        .map_err(|_| {
            ThresholdError::Decryption(
                "payload authentication failed (wrong key or tampered data)".to_string(),
            )
        })
}
