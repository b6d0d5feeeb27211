//! Keysign output shapes and the recovery-id normalization rule (spec §4.7.3,
//! §9 open question: the integer is taken *after* hex-decoding the raw bytes,
//! not parsed as a decimal string).

use vultisig_core::{Result, VultisigError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: String,
    pub s: String,
    pub der: Vec<u8>,
    pub recovery_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EddsaSignature {
    pub r: String,
    pub s: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureBundle {
    Ecdsa(EcdsaSignature),
    Eddsa(EddsaSignature),
}

/// Normalizes a hex-encoded recovery id to the integer the caller sees.
pub fn normalize_recovery_id(hex_recovery_id: &str) -> Result<u8> {
    let bytes = hex::decode(hex_recovery_id)?;
    bytes
        .first()
        .copied()
        .ok_or_else(|| VultisigError::protocol("empty recovery id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_single_byte_hex() {
        assert_eq!(normalize_recovery_id("01").unwrap(), 1);
        assert_eq!(normalize_recovery_id("00").unwrap(), 0);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(normalize_recovery_id("").is_err());
    }

    #[test]
    fn rejects_non_hex_input() {
        assert!(normalize_recovery_id("zz").is_err());
    }
}
