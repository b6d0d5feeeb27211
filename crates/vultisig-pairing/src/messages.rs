//! `KeygenMessage` / `KeysignMessage` — the structured descriptors embedded
//! in a pairing payload (spec §3).

use serde::{Deserialize, Serialize};
use vultisig_core::vault::LibType;

/// Descriptor for a `NewVault` / `Keygen` pairing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenMessage {
    pub session_id: uuid::Uuid,
    /// The initiator's `PartyId`.
    pub service_name: String,
    pub encryption_key_hex: String,
    pub hex_chain_code: String,
    pub lib_type: LibType,
    pub vault_name: String,
}

/// Descriptor for a `SignTransaction` / `Keysign` pairing payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysignMessage {
    pub session_id: uuid::Uuid,
    pub service_name: String,
    pub encryption_key_hex: String,
    /// Opaque per-chain transaction blob; the coordinator never inspects it.
    pub keysign_payload: Vec<u8>,
    pub payload_id: String,
}

/// The two payload shapes a pairing URI can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingMessage {
    Keygen(KeygenMessage),
    Keysign(KeysignMessage),
}
