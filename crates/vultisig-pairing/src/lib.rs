//! Pairing payload: the `vultisig://` URIs embedded in QR codes (C9).

pub mod messages;
pub mod uri;

pub use messages::{KeygenMessage, KeysignMessage, PairingMessage};
pub use uri::decode;
