//! Ceremony parameters and setup-message namespacing (spec §4.6).

use vultisig_core::{PartyId, SchemeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyMode {
    Keygen,
    KeyImport,
    Keysign,
}

/// `params` from spec §4.6: identifies one run of the round loop.
#[derive(Debug, Clone)]
pub struct CeremonyParams {
    pub mode: CeremonyMode,
    pub is_initiator: bool,
    pub scheme: SchemeKind,
    pub local_party_id: PartyId,
    pub parties: Vec<PartyId>,
    pub old_committee: Option<Vec<PartyId>>,
    /// Master private key (key-import) or message hash + derivation path (keysign).
    pub extra_secret: Option<Vec<u8>>,
}

impl CeremonyParams {
    pub fn peers(&self) -> Vec<PartyId> {
        self.parties
            .iter()
            .filter(|party| **party != self.local_party_id)
            .cloned()
            .collect()
    }
}

/// The header namespacing multiple setup blobs under one `sessionId`.
/// ECDSA always uses the default unnamed slot; EdDSA gets its own slot so
/// a keygen/key-import ceremony can run both schemes over one session.
pub fn setup_header(scheme: SchemeKind, mode: CeremonyMode) -> Option<&'static str> {
    match (scheme, mode) {
        (SchemeKind::Ecdsa, _) => None,
        (SchemeKind::Eddsa, CeremonyMode::KeyImport) => Some("eddsa_key_import"),
        (SchemeKind::Eddsa, _) => Some("eddsa"),
    }
}
