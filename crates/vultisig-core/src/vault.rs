//! Vault data model (spec §3).
//!
//! `Vault` itself is a plain data record; encoding/decoding it to the
//! on-disk container format lives in `vultisig-vault`, which depends on
//! this crate for the type.

use crate::identifiers::PartyId;
use serde::{Deserialize, Serialize};

/// Tags the cryptographic primitive family used for this vault. Fixed for
/// the vault's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibType {
    Dkls,
}

/// ECDSA and EdDSA public keys, identical across every signer of the same
/// ceremony. The ECDSA public key also serves as the vault ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeys {
    /// Hex-encoded compressed ECDSA public key.
    pub ecdsa: String,
    /// Hex-encoded EdDSA public key.
    pub eddsa: String,
}

/// Local secret material held by one party; unique per signer, never leaves
/// memory unencrypted except through the container codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyShares {
    pub ecdsa: Vec<u8>,
    pub eddsa: Vec<u8>,
}

/// `(name, publicKeys, localPartyId, signers, hexChainCode, keyShares,
/// libType, createdAt, order, isBackedUp)` — spec §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub name: String,
    pub public_keys: PublicKeys,
    pub local_party_id: PartyId,
    /// Ordered list of all signers, identical across every party of the
    /// vault; `local_party_id` must appear in this list.
    pub signers: Vec<PartyId>,
    pub hex_chain_code: String,
    pub key_shares: KeyShares,
    pub lib_type: LibType,
    /// Unix epoch milliseconds.
    pub created_at: u64,
    /// Caller-assigned display order; not part of the cryptographic identity.
    pub order: u32,
    pub is_backed_up: bool,
}

impl Vault {
    /// 1-based index of `local_party_id` within `signers`, used by the
    /// export filename contract (spec §4.4, P9).
    pub fn local_party_index(&self) -> Option<usize> {
        self.signers
            .iter()
            .position(|p| p == &self.local_party_id)
            .map(|i| i + 1)
    }

    /// `<VaultName>-<LocalPartyId>-share<Index>of<N>.vult`, slashes stripped
    /// from the vault name (spec §4.4).
    pub fn export_filename(&self) -> crate::Result<String> {
        let index = self.local_party_index().ok_or_else(|| {
            crate::VultisigError::protocol("local party id is not a member of signers")
        })?;
        let n = self.signers.len();
        let safe_name = self.name.replace(['/', '\\'], "");
        Ok(format!(
            "{safe_name}-{}-share{index}of{n}.vult",
            self.local_party_id
        ))
    }
}
