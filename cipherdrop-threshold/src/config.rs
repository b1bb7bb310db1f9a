//! Threshold client configuration.

use serde::{Deserialize, Serialize};

/// Number of key servers that must cooperate to decrypt, unless overridden.
pub const DEFAULT_THRESHOLD: u8 = 2;

/// Session lifetime in minutes, unless overridden.
pub const DEFAULT_SESSION_TTL_MIN: u32 = 10;

/// Target object for access-control checks when the caller names none.
pub const DEFAULT_OBJECT_ID: &str =
    "0x99130710f132066c7a60282c0cfd9188387d645e94ffc6e0d51733d990248bcb";

/// One key server participating in threshold decryption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyServerEntry {
    /// Base URL, e.g. `https://keys-0.cipherdrop.app`.
    pub url: String,
    /// Pinned X25519 public key (base64, 32 bytes). When present, the key
    /// the server reports must match it.
    pub public_key: Option<String>,
}

impl KeyServerEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_key: None,
        }
    }

    pub fn with_public_key(url: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_key: Some(public_key.into()),
        }
    }
}

/// Configuration for [`ThresholdClient`](crate::client::ThresholdClient).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// On-chain package owning the access-control predicate.
    pub package_id: String,
    /// Module within the package exposing the approval entry point.
    pub module_name: String,
    /// Key servers holding sealed shares.
    pub key_servers: Vec<KeyServerEntry>,
    /// Minimum cooperating servers for decryption.
    pub default_threshold: u8,
    /// Cross-check pinned server keys against reported ones before sealing.
    pub verify_key_servers: bool,
}

impl ThresholdConfig {
    /// Builds a config with the standard module name and threshold.
    pub fn new(package_id: impl Into<String>, key_servers: Vec<KeyServerEntry>) -> Self {
        Self {
            package_id: package_id.into(),
            module_name: "access_control".to_string(),
            key_servers,
            default_threshold: DEFAULT_THRESHOLD,
            verify_key_servers: true,
        }
    }

    /// Test configuration pointing at localhost servers.
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            package_id: "0xtest_package".to_string(),
            module_name: "access_control".to_string(),
            key_servers: vec![
                KeyServerEntry::new("http://localhost:18771"),
                KeyServerEntry::new("http://localhost:18772"),
                KeyServerEntry::new("http://localhost:18773"),
            ],
            default_threshold: DEFAULT_THRESHOLD,
            verify_key_servers: false,
        }
    }
}
