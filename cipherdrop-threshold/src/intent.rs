//! Authorization intents for the on-chain approval predicate.
//!
//! An intent is a serialized move call invoking
//! `{package}::{module}::seal_approve(object, access_code)`. It exists
//! purely as proof material for key servers and is never submitted to the
//! ledger.

use serde::{Deserialize, Serialize};

/// A serialized-but-never-submitted approval call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalIntent {
    /// Fully qualified entry point, `package::module::seal_approve`.
    pub target: String,
    /// Object argument: the on-chain object guarding the payload.
    pub object_id: String,
    /// Pure string argument: the access code being proven.
    pub access_code: String,
    /// Serialized as a bare transaction kind, not an executable transaction.
    pub only_transaction_kind: bool,
}

impl ApprovalIntent {
    /// Builds the approval call for one object and access-code pair.
    pub fn new(package_id: &str, module_name: &str, object_id: &str, access_code: &str) -> Self {
        Self {
            target: format!("{package_id}::{module_name}::seal_approve"),
            object_id: object_id.to_string(),
            access_code: access_code.to_string(),
            only_transaction_kind: true,
        }
    }

    /// Serializes the intent for transport to key servers.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parses intent bytes, as a key server evaluating the predicate would.
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn target_is_fully_qualified() {
        let intent = ApprovalIntent::new("0xpkg", "access_control", "0xobj", "Code1234");
        assert_eq!(intent.target, "0xpkg::access_control::seal_approve");
        assert_eq!(intent.object_id, "0xobj");
        assert_eq!(intent.access_code, "Code1234");
        assert!(intent.only_transaction_kind);
    }

    #[test]
    fn intent_bytes_roundtrip() {
        let intent = ApprovalIntent::new("0xpkg", "access_control", "0xobj", "Code1234");
        let bytes = intent.to_bytes().unwrap();
        let back = ApprovalIntent::from_bytes(&bytes).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn wire_fields_are_camel_case() {
        let intent = ApprovalIntent::new("0xpkg", "m", "0xobj", "Code1234");
        let json = String::from_utf8(intent.to_bytes().unwrap()).unwrap();
        assert!(json.contains("onlyTransactionKind"));
        assert!(json.contains("objectId"));
        assert!(json.contains("accessCode"));
    }
}
