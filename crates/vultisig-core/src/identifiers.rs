//! Party and session identifiers (spec §3).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short human-readable token identifying a participant within a session,
/// e.g. `"sdk-1234"`, `"iphone-0421"`, `"Server-1172"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyId(pub String);

/// Prefix that marks a `PartyId` as the remote fast-vault signer.
pub const FAST_VAULT_PARTY_PREFIX: &str = "Server-";

impl PartyId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Whether this party denotes the remote fast-vault signer (spec §3, §4.8).
    pub fn is_fast_vault_server(&self) -> bool {
        self.0.starts_with(FAST_VAULT_PARTY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PartyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// `(sessionId, hexEncryptionKey, relayUrl)` created by the initiating party
/// and transmitted to peers through the pairing payload (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub session_id: uuid::Uuid,
    /// 32-byte shared secret for the encrypted frame codec, hex-encoded (64 chars).
    pub hex_encryption_key: String,
    pub relay_url: String,
}

impl SessionDescriptor {
    pub fn new(session_id: uuid::Uuid, hex_encryption_key: String, relay_url: String) -> Self {
        Self {
            session_id,
            hex_encryption_key,
            relay_url,
        }
    }

    /// Derive a session ID namespaced by suffix, used for per-scheme or
    /// per-hash message lanes that must stay disjoint (spec §4.6, §4.7.3).
    pub fn derived_session_id(&self, suffix: &str) -> String {
        format!("{}-{}", self.session_id, suffix)
    }

    pub fn decode_key(&self) -> crate::Result<[u8; 32]> {
        let bytes = hex::decode(&self.hex_encryption_key)?;
        bytes
            .try_into()
            .map_err(|_| crate::VultisigError::invalid_input("encryption key must be 32 bytes"))
    }
}
