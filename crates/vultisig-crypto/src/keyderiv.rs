//! Master key deriver (C10).
//!
//! Validates a BIP-39 mnemonic, derives the BIP-32 seed, and extracts
//! `(ecdsaPrivateKey, eddsaPrivateKey, chainCode)`. Exposed only to the
//! key-import ceremony; never persisted (spec §4.10).

use bip32::XPrv;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use vultisig_core::{Result, VultisigError};

type HmacSha512 = Hmac<Sha512>;

/// Domain separator for SLIP-0010 Ed25519 master key derivation.
const ED25519_SEED_KEY: &[u8] = b"ed25519 seed";

/// The BIP-32 master secret material handed to the DKLS and Schnorr
/// key-import ceremonies as `extraSecret`.
#[derive(zeroize::ZeroizeOnDrop)]
pub struct MasterKey {
    pub ecdsa_private_key: [u8; 32],
    pub eddsa_private_key: [u8; 32],
    /// Hex-encoded, identical value passed to both schemes as the HD root
    /// (spec §4.7.2: "both schemes receive the BIP-32 master chain code").
    /// Not secret material, so it's left out of the zeroize-on-drop.
    #[zeroize(skip)]
    pub hex_chain_code: String,
}

/// Derive a [`MasterKey`] from a BIP-39 mnemonic phrase.
///
/// The spec's open question about an `hexEncryptionKey`-shaped field
/// sometimes carrying the chain code is resolved here by only ever
/// returning the explicit `hex_chain_code`: callers must not fall back to
/// any other field for chain code material (spec §9 Open Questions).
pub fn derive_master_key(mnemonic_phrase: &str) -> Result<MasterKey> {
    if mnemonic_phrase.trim().is_empty() {
        return Err(VultisigError::invalid_input("mnemonic must not be empty"));
    }

    let mnemonic = bip39::Mnemonic::parse_normalized(mnemonic_phrase)?;
    let seed = mnemonic.to_seed("");

    let ecdsa_root = XPrv::new(&seed)?;
    let ecdsa_private_key: [u8; 32] = ecdsa_root.private_key().to_bytes().into();
    let chain_code = ecdsa_root.attrs().chain_code;

    let eddsa_private_key = slip10_ed25519_master_key(&seed)?;

    Ok(MasterKey {
        ecdsa_private_key,
        eddsa_private_key,
        hex_chain_code: hex::encode(chain_code),
    })
}

/// SLIP-0010 Ed25519 master key: `HMAC-SHA512(key = "ed25519 seed", data =
/// seed)`, keeping only the left 32 bytes (the private key); the chain code
/// returned to callers is always the BIP-32 one derived alongside the ECDSA
/// root, per the Open Questions resolution above.
fn slip10_ed25519_master_key(seed: &[u8]) -> Result<[u8; 32]> {
    let mut mac = HmacSha512::new_from_slice(ED25519_SEED_KEY)
        .map_err(|e| VultisigError::cryptographic(format!("HMAC init failed: {e}")))?;
    mac.update(seed);
    let digest = mac.finalize().into_bytes();
    let mut private_key = [0u8; 32];
    private_key.copy_from_slice(&digest[..32]);
    Ok(private_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn derives_deterministically() {
        let a = derive_master_key(TEST_MNEMONIC).unwrap();
        let b = derive_master_key(TEST_MNEMONIC).unwrap();
        assert_eq!(a.ecdsa_private_key, b.ecdsa_private_key);
        assert_eq!(a.eddsa_private_key, b.eddsa_private_key);
        assert_eq!(a.hex_chain_code, b.hex_chain_code);
    }

    #[test]
    fn ecdsa_and_eddsa_keys_differ() {
        let master = derive_master_key(TEST_MNEMONIC).unwrap();
        assert_ne!(master.ecdsa_private_key, master.eddsa_private_key);
    }

    #[test]
    fn rejects_empty_mnemonic() {
        assert!(derive_master_key("").is_err());
    }

    #[test]
    fn rejects_invalid_mnemonic() {
        assert!(derive_master_key("not a valid bip39 mnemonic phrase at all").is_err());
    }

    #[test]
    fn chain_code_is_64_hex_chars() {
        let master = derive_master_key(TEST_MNEMONIC).unwrap();
        assert_eq!(master.hex_chain_code.len(), 64);
        assert!(hex::decode(&master.hex_chain_code).is_ok());
    }
}
