//! Threshold encryption and session authorization for CipherDrop.
//!
//! Payloads are gated on an access code and an on-chain approval
//! predicate. Encryption seals content under a fresh key, splits that key
//! across independent key servers, and hands back a backup key that
//! bypasses the servers entirely. Decryption requires a signed,
//! short-lived session plus cooperation from a threshold of servers.
//!
//! Per decryption attempt: create a [`SessionKey`], obtain one wallet
//! signature over its personal message, build the never-submitted
//! [`ApprovalIntent`], then let [`ThresholdClient`] collect shares and
//! open the payload. [`flow::decrypt_data`] drives all of it.

pub mod access_code;
pub mod client;
pub mod config;
mod error;
pub mod flow;
pub mod intent;
pub mod mime;
pub mod progress;
pub mod sealing;
pub mod session;
mod shamir;
pub mod signer;
pub mod types;

pub use access_code::{
    generate_access_code, generate_default_access_code, validate_access_code,
    DEFAULT_CODE_LENGTH, MIN_CODE_LENGTH,
};
pub use client::ThresholdClient;
pub use config::{
    KeyServerEntry, ThresholdConfig, DEFAULT_OBJECT_ID, DEFAULT_SESSION_TTL_MIN, DEFAULT_THRESHOLD,
};
pub use error::{ThresholdError, ThresholdResult};
pub use flow::{decrypt_data, DecryptionFlow, FlowState};
pub use intent::ApprovalIntent;
pub use mime::{detect_file_type, detect_mime_type};
pub use progress::{
    NullProgressSink, ProgressEvent, ProgressLevel, ProgressSink, TracingProgressSink,
};
pub use sealing::{open_share, seal_share, SealedShare, ServerKeyPair};
pub use session::{SessionCertificate, SessionKey};
pub use signer::{Signer, SignerRejected};
pub use types::{
    BackupKey, DecryptOptions, DecryptedPayload, DecryptionResult, EncryptOptions,
    EncryptionMetadata, ShareEntry, ThresholdEncryptionResult, ThresholdObject,
};
