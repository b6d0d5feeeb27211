//! Vault container codec (C4, spec §4.4, §6).
//!
//! `encode`/`decode` move between an in-memory `Vault` and the UTF-8 text
//! content of a `.vult` backup file: base64 of the binary-encoded outer
//! container, whose `vault` field is itself a base64 string holding either
//! the plaintext inner vault or an AES-GCM ciphertext over it.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vultisig_core::{Result, Vault, VultisigError};

const CONTAINER_VERSION: u32 = 1;
const NONCE_LEN: usize = 12;

/// Outer wrapper of the on-disk backup (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VaultContainer {
    version: u32,
    is_encrypted: bool,
    /// Base64 of either the plaintext inner vault, or `nonce || ciphertext
    /// || tag` when `is_encrypted`.
    vault: String,
}

/// `SHA-256(password UTF-8)` — preserved exactly for backward compatibility
/// with existing vault backups (spec §4.4 step 2).
fn password_key(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

fn inner_to_bytes(vault: &Vault) -> Result<Vec<u8>> {
    bincode::serialize(vault).map_err(|e| VultisigError::protocol(format!("vault encoding failed: {e}")))
}

fn inner_from_bytes(bytes: &[u8]) -> Result<Vault> {
    bincode::deserialize(bytes).map_err(|e| VultisigError::protocol(format!("vault decoding failed: {e}")))
}

/// Encode `vault` to `.vult` text, optionally password-encrypting the inner
/// payload (spec §4.4 `encode`).
pub fn encode(vault: &Vault, password: Option<&str>) -> Result<String> {
    let inner_bytes = inner_to_bytes(vault)?;

    let container = match password {
        Some(password) => {
            let key = password_key(password);
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
            let mut nonce_bytes = [0u8; NONCE_LEN];
            rand::thread_rng().fill_bytes(&mut nonce_bytes);
            let nonce = Nonce::from_slice(&nonce_bytes);
            let ciphertext = cipher
                .encrypt(nonce, inner_bytes.as_slice())
                .map_err(|e| VultisigError::cryptographic(format!("vault seal failed: {e}")))?;
            let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
            framed.extend_from_slice(&nonce_bytes);
            framed.extend_from_slice(&ciphertext);
            VaultContainer {
                version: CONTAINER_VERSION,
                is_encrypted: true,
                vault: STANDARD.encode(framed),
            }
        }
        None => VaultContainer {
            version: CONTAINER_VERSION,
            is_encrypted: false,
            vault: STANDARD.encode(inner_bytes),
        },
    };

    let container_bytes = bincode::serialize(&container)
        .map_err(|e| VultisigError::protocol(format!("container encoding failed: {e}")))?;
    Ok(STANDARD.encode(container_bytes).trim().to_string())
}

/// Decode `.vult` text back to a `Vault`, validating both key shares are
/// non-empty (spec §4.4 `decode`).
pub fn decode(vult_text: &str, password: Option<&str>) -> Result<Vault> {
    let trimmed: String = vult_text.chars().filter(|c| !c.is_whitespace()).collect();
    let container_bytes = STANDARD
        .decode(trimmed.as_bytes())
        .map_err(|e| VultisigError::protocol(format!("invalid base64: {e}")))?;
    let container: VaultContainer = bincode::deserialize(&container_bytes)
        .map_err(|e| VultisigError::protocol(format!("malformed container: {e}")))?;

    let inner_bytes = if container.is_encrypted {
        let password = password.ok_or(VultisigError::InvalidPassword)?;
        let framed = STANDARD
            .decode(container.vault.as_bytes())
            .map_err(|_| VultisigError::InvalidPassword)?;
        if framed.len() < NONCE_LEN {
            return Err(VultisigError::InvalidPassword);
        }
        let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
        let key = password_key(password);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VultisigError::InvalidPassword)?
    } else {
        STANDARD
            .decode(container.vault.as_bytes())
            .map_err(|e| VultisigError::protocol(format!("invalid base64: {e}")))?
    };

    let vault = inner_from_bytes(&inner_bytes)?;

    if vault.key_shares.ecdsa.is_empty() || vault.key_shares.eddsa.is_empty() {
        return Err(VultisigError::protocol("vault has an empty key share"));
    }

    Ok(vault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vultisig_core::{KeyShares, LibType, PartyId, PublicKeys};

    fn sample_vault() -> Vault {
        Vault {
            name: "Test".into(),
            public_keys: PublicKeys {
                ecdsa: "02abc".into(),
                eddsa: "deadbeef".into(),
            },
            local_party_id: PartyId::new("iPhone-5C9"),
            signers: vec![PartyId::new("iPhone-5C9"), PartyId::new("Server-1172")],
            hex_chain_code: "c".repeat(64),
            key_shares: KeyShares {
                ecdsa: vec![1, 2, 3, 4],
                eddsa: vec![5, 6, 7, 8],
            },
            lib_type: LibType::Dkls,
            created_at: 1_700_000_000_000,
            order: 0,
            is_backed_up: false,
        }
    }

    /// P4 + S2: encrypted round-trip, wrong password fails with InvalidPassword.
    #[test]
    fn encrypted_round_trip_scenario_s2() {
        let vault = sample_vault();
        let encoded = encode(&vault, Some("Password123!")).unwrap();
        let decoded = decode(&encoded, Some("Password123!")).unwrap();
        assert_eq!(decoded, vault);

        let wrong = decode(&encoded, Some("wrong"));
        assert_matches::assert_matches!(wrong, Err(VultisigError::InvalidPassword));

        assert_eq!(vault.export_filename().unwrap(), "Test-iPhone-5C9-share1of2.vult");
    }

    /// P4: plaintext round-trip when no password is given.
    #[test]
    fn plaintext_round_trip() {
        let vault = sample_vault();
        let encoded = encode(&vault, None).unwrap();
        let decoded = decode(&encoded, None).unwrap();
        assert_eq!(decoded, vault);
    }

    #[test]
    fn decoding_encrypted_vault_without_password_fails() {
        let vault = sample_vault();
        let encoded = encode(&vault, Some("secret")).unwrap();
        assert_matches::assert_matches!(decode(&encoded, None), Err(VultisigError::InvalidPassword));
    }

    #[test]
    fn rejects_empty_key_share() {
        let mut vault = sample_vault();
        vault.key_shares.ecdsa.clear();
        let encoded = encode(&vault, None).unwrap();
        assert!(decode(&encoded, None).is_err());
    }

    #[test]
    fn rejects_garbage_text() {
        assert!(decode("not base64 at all!!", None).is_err());
    }
}
