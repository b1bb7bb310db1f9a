//! Shared fixtures for threshold integration tests.
#![allow(dead_code)]

use cipherdrop_threshold::{
    open_share, KeyServerEntry, ProgressEvent, ProgressSink, ServerKeyPair, ShareEntry, Signer,
    SignerRejected, ThresholdConfig, ThresholdObject,
};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Signer that always signs with a deterministic fake signature.
pub struct FakeSigner;

impl Signer for FakeSigner {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerRejected> {
        let mut signature = b"sig:".to_vec();
        signature.extend_from_slice(&message[..message.len().min(16)]);
        Ok(signature)
    }
}

/// Signer that always declines.
pub struct RejectingSigner(pub &'static str);

impl Signer for RejectingSigner {
    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SignerRejected> {
        Err(SignerRejected(self.0.to_string()))
    }
}

/// Sink that records every event for later assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// One mock key server with its sealing keypair.
pub struct TestKeyServer {
    pub mock: MockServer,
    pub keys: ServerKeyPair,
}

pub async fn start_key_servers(count: usize) -> Vec<TestKeyServer> {
    let mut servers = Vec::with_capacity(count);
    for _ in 0..count {
        servers.push(TestKeyServer {
            mock: MockServer::start().await,
            keys: ServerKeyPair::generate(),
        });
    }
    servers
}

/// Config with every server's key pinned, so encryption needs no network.
pub fn pinned_config(servers: &[TestKeyServer]) -> ThresholdConfig {
    let entries = servers
        .iter()
        .map(|s| KeyServerEntry::with_public_key(s.mock.uri(), s.keys.public_base64()))
        .collect();
    let mut config = ThresholdConfig::new("0xtest_package", entries);
    config.verify_key_servers = false;
    config
}

/// Serves the server's real public key on its service endpoint.
pub async fn mount_service_endpoint(server: &TestKeyServer) {
    Mock::given(method("GET"))
        .and(path("/v1/service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "serviceId": "test-service",
            "publicKey": server.keys.public_base64(),
        })))
        .mount(&server.mock)
        .await;
}

/// Parses the share entries out of a serialized threshold object.
pub fn sealed_shares(encrypted: &[u8]) -> Vec<ShareEntry> {
    let object: ThresholdObject = serde_json::from_slice(encrypted).unwrap();
    object.shares
}

/// Plays a cooperating server: opens its sealed share from `encrypted`
/// and releases it on every fetch-key request.
pub async fn mount_share_release(server: &TestKeyServer, encrypted: &[u8]) {
    let entry = sealed_shares(encrypted)
        .into_iter()
        .find(|e| e.server_url == server.mock.uri())
        .expect("no share entry for this server");
    let share = open_share(&entry.sealed, &server.keys.secret).unwrap();

    Mock::given(method("POST"))
        .and(path("/v1/fetch_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "share": cipherdrop_crypto::bytes_to_base64(&share),
        })))
        .mount(&server.mock)
        .await;
}

/// Plays a server that judges the proof and refuses.
pub async fn mount_denial(server: &TestKeyServer) {
    Mock::given(method("POST"))
        .and(path("/v1/fetch_key"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server.mock)
        .await;
}

/// Mounts a fetch-key responder that must never be hit.
pub async fn mount_untouchable(server: &TestKeyServer) {
    Mock::given(method("POST"))
        .and(path("/v1/fetch_key"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server.mock)
        .await;
}

/// Plays a server that accepts the request and then stalls far past the
/// test horizon.
pub async fn mount_stalled(server: &TestKeyServer) {
    Mock::given(method("POST"))
        .and(path("/v1/fetch_key"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_secs(60)))
        .mount(&server.mock)
        .await;
}
