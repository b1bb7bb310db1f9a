//! Session authorization flow tests.

mod support;

use cipherdrop_threshold::{
    decrypt_data, DecryptOptions, DecryptedPayload, DecryptionFlow, EncryptOptions, FlowState,
    ThresholdClient, ThresholdError,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use support::*;

const CODE: &str = "Quartz7Lantern9";

async fn encrypted_fixture(
    servers: &[TestKeyServer],
    payload: &[u8],
) -> (Arc<ThresholdClient>, Vec<u8>) {
    let client = Arc::new(ThresholdClient::new(pinned_config(servers)));
    let result = client
        .encrypt(payload, CODE, &EncryptOptions::default())
        .await
        .unwrap();
    (client, result.encrypted_data)
}

#[tokio::test]
async fn flow_reaches_complete_end_to_end() {
    let servers = start_key_servers(3).await;
    // PNG magic so the sniffer has something to find.
    let mut payload = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    payload.extend_from_slice(&[0x42; 128]);

    let (client, encrypted) = encrypted_fixture(&servers, &payload).await;
    for server in &servers {
        mount_share_release(server, &encrypted).await;
    }

    let mut flow = DecryptionFlow::new(client, FakeSigner, "0xrecipient", 10);
    assert_eq!(*flow.state(), FlowState::Created);

    flow.request_signature().await.unwrap();
    assert_eq!(*flow.state(), FlowState::Signed);
    assert!(flow.session().is_signed());

    flow.build_authorization("0xobject", CODE).unwrap();
    assert_eq!(*flow.state(), FlowState::AuthorizationBuilt);

    let result = flow
        .decrypt(&encrypted, &DecryptOptions::default())
        .await
        .unwrap();
    assert_eq!(*flow.state(), FlowState::Complete);
    assert!(flow.state().is_terminal());

    assert_eq!(result.payload.as_bytes(), payload);
    assert_eq!(result.mime_type.as_deref(), Some("image/png"));
    assert!(!result.is_text);
    assert!(result.timestamp_ms > 0);
}

#[tokio::test]
async fn rejected_signature_is_terminal() {
    let servers = start_key_servers(2).await;
    let (client, _encrypted) = encrypted_fixture(&servers, b"payload").await;

    let mut flow = DecryptionFlow::new(client, RejectingSigner("user declined"), "0xrecipient", 10);
    let err = flow.request_signature().await.unwrap_err();

    assert!(matches!(err, ThresholdError::SignatureRejected(_)));
    assert_eq!(err.to_string(), "signature request rejected: user declined");
    assert!(matches!(flow.state(), FlowState::Failed(_)));
    assert!(flow.state().is_terminal());
    assert!(!flow.session().is_signed());
}

#[tokio::test]
async fn out_of_order_steps_do_not_poison_the_flow() {
    let servers = start_key_servers(2).await;
    let (client, encrypted) = encrypted_fixture(&servers, b"payload").await;
    for server in &servers {
        mount_share_release(server, &encrypted).await;
    }

    let mut flow = DecryptionFlow::new(client, FakeSigner, "0xrecipient", 10);

    // Skipping straight to decrypt is a caller bug, not a flow failure.
    let err = flow
        .decrypt(&encrypted, &DecryptOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ThresholdError::InvalidState(_)));
    assert_eq!(*flow.state(), FlowState::Created);

    // The flow still works when driven in order.
    flow.request_signature().await.unwrap();
    flow.build_authorization("0xobject", CODE).unwrap();
    let result = flow
        .decrypt(&encrypted, &DecryptOptions::default())
        .await
        .unwrap();
    assert_eq!(result.payload.as_bytes(), b"payload");
}

#[tokio::test]
async fn second_signature_request_is_rejected_in_place() {
    let servers = start_key_servers(2).await;
    let (client, _encrypted) = encrypted_fixture(&servers, b"payload").await;

    let mut flow = DecryptionFlow::new(client, FakeSigner, "0xrecipient", 10);
    flow.request_signature().await.unwrap();

    let err = flow.request_signature().await.unwrap_err();
    assert!(matches!(err, ThresholdError::InvalidState(_)));
    // The earlier signature survives.
    assert_eq!(*flow.state(), FlowState::Signed);
    assert!(flow.session().is_signed());
}

#[tokio::test]
async fn expired_session_fails_before_authorization_is_built() {
    let servers = start_key_servers(2).await;
    let (client, _encrypted) = encrypted_fixture(&servers, b"payload").await;

    let mut flow = DecryptionFlow::new(client, FakeSigner, "0xrecipient", 0);
    flow.request_signature().await.unwrap();

    let err = flow.build_authorization("0xobject", CODE).unwrap_err();
    assert!(matches!(err, ThresholdError::SessionExpired));
    assert!(matches!(flow.state(), FlowState::Failed(_)));
}

#[tokio::test]
async fn text_payloads_are_decoded() {
    let servers = start_key_servers(2).await;
    let message = "meet me at the usual place at nine".as_bytes();
    let (client, encrypted) = encrypted_fixture(&servers, message).await;
    for server in &servers {
        mount_share_release(server, &encrypted).await;
    }

    let mut flow = DecryptionFlow::new(client, FakeSigner, "0xrecipient", 10);
    flow.request_signature().await.unwrap();
    flow.build_authorization("0xobject", CODE).unwrap();

    let options = DecryptOptions {
        is_text: true,
        ..Default::default()
    };
    let result = flow.decrypt(&encrypted, &options).await.unwrap();

    assert!(result.is_text);
    assert_eq!(result.mime_type.as_deref(), Some("text/plain"));
    assert_eq!(
        result.payload,
        DecryptedPayload::Text("meet me at the usual place at nine".to_string())
    );
}

#[tokio::test]
async fn decrypt_data_drives_the_whole_flow() {
    let servers = start_key_servers(3).await;
    let (client, encrypted) = encrypted_fixture(&servers, b"one-shot payload").await;
    for server in &servers {
        mount_share_release(server, &encrypted).await;
    }

    let sink = Arc::new(CollectingSink::default());
    let options = DecryptOptions {
        sink: sink.clone(),
        ..Default::default()
    };

    let result = decrypt_data(client, FakeSigner, &encrypted, CODE, "0xrecipient", &options)
        .await
        .unwrap();
    assert_eq!(result.payload.as_bytes(), b"one-shot payload");

    let messages = sink.messages();
    assert!(!messages.is_empty());
    // The access code only ever appears masked.
    assert!(messages.iter().any(|m| m.contains("Qua****")));
    assert!(messages.iter().all(|m| !m.contains(CODE)));
    assert!(messages.iter().any(|m| m.contains("decryption complete")));
}

#[tokio::test]
async fn decrypt_data_reports_denials() {
    let servers = start_key_servers(2).await;
    let (client, encrypted) = encrypted_fixture(&servers, b"guarded payload").await;
    for server in &servers {
        mount_denial(server).await;
    }

    let sink = Arc::new(CollectingSink::default());
    let options = DecryptOptions {
        sink: sink.clone(),
        ..Default::default()
    };

    let err = decrypt_data(client, FakeSigner, &encrypted, CODE, "0xrecipient", &options)
        .await
        .unwrap_err();
    assert!(matches!(err, ThresholdError::AuthorizationDenied));
    assert!(sink
        .messages()
        .iter()
        .any(|m| m.contains("decryption failed")));
}
