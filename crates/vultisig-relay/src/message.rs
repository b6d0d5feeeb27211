//! `RelayMessage` wire shape (spec §3, §6).

use serde::{Deserialize, Serialize};
use vultisig_core::PartyId;

/// `(session_id, from, to[], body, hash, sequence_no)`. `body` is the
/// C2-encrypted ciphertext; `hash` is the SHA-256 of the plaintext body;
/// `sequence_no` is a monotonically increasing per-sender counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub session_id: String,
    pub from: PartyId,
    pub to: Vec<PartyId>,
    /// Base64-encoded ciphertext (wire shape), see `body()`/`body_bytes()`.
    pub body: String,
    /// Hex-encoded SHA-256 of the plaintext body.
    pub hash: String,
    pub sequence_no: u64,
}

impl RelayMessage {
    pub fn new(
        session_id: impl Into<String>,
        from: PartyId,
        to: Vec<PartyId>,
        body: &[u8],
        hash: String,
        sequence_no: u64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            from,
            to,
            body: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, body),
            hash,
            sequence_no,
        }
    }

    pub fn body_bytes(&self) -> vultisig_core::Result<Vec<u8>> {
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &self.body)
            .map_err(vultisig_core::VultisigError::from)
    }

    pub fn is_for(&self, party: &PartyId) -> bool {
        self.to.iter().any(|p| p == party)
    }
}
