//! Encrypted frame codec (C2).
//!
//! Every MPC message body is symmetrically encrypted with the session's
//! 32-byte key using AES-GCM-256. Nonces are fresh random 12-byte values
//! prepended to the ciphertext. `hash` is SHA-256 of the *plaintext* so that
//! re-encryption under a fresh nonce still produces the same dedup key
//! (spec §3, §4.2).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand_core::RngCore;
use sha2::{Digest, Sha256};
use vultisig_core::{Result, VultisigError};

const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` under `key`, returning `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VultisigError::cryptographic(format!("AEAD seal failed: {e}")))?;

    let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    framed.extend_from_slice(&nonce_bytes);
    framed.extend_from_slice(&ciphertext);
    Ok(framed)
}

/// Decrypt a `nonce || ciphertext || tag` frame produced by [`encrypt`].
///
/// A decryption failure is a protocol fault, not necessarily an attack: it
/// may be a replay of a just-acked message or a corrupt payload from a
/// hostile relay. Callers should log a warning and drop the message rather
/// than treat this as fatal to the ceremony (spec §4.2).
pub fn decrypt(framed: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    if framed.len() < NONCE_LEN {
        return Err(VultisigError::cryptographic("frame shorter than nonce"));
    }
    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| VultisigError::cryptographic(format!("AEAD open failed: {e}")))
}

/// SHA-256 of the plaintext body, hex-encoded — the dedup/ack key for a
/// `RelayMessage` (spec §3).
pub fn plaintext_hash(plaintext: &[u8]) -> String {
    let digest = Sha256::digest(plaintext);
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; 32] {
        [7u8; 32]
    }

    #[test]
    fn round_trips() {
        let plaintext = b"mpc round message body";
        let framed = encrypt(plaintext, &key()).unwrap();
        let recovered = decrypt(&framed, &key()).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn distinct_nonces_each_call() {
        let plaintext = b"same plaintext twice";
        let a = encrypt(plaintext, &key()).unwrap();
        let b = encrypt(plaintext, &key()).unwrap();
        assert_ne!(a, b, "nonce must be fresh per call");
    }

    /// P6: any single-bit mutation of the ciphertext causes decryption to fail.
    #[test]
    fn single_bit_mutation_breaks_authenticity() {
        let plaintext = b"authenticated payload";
        let mut framed = encrypt(plaintext, &key()).unwrap();
        let last = framed.len() - 1;
        framed[last] ^= 0x01;
        assert!(decrypt(&framed, &key()).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let framed = encrypt(b"secret", &key()).unwrap();
        assert!(decrypt(&framed, &[9u8; 32]).is_err());
    }

    #[test]
    fn hash_is_stable_across_reencryption() {
        let plaintext = b"idempotent delivery key";
        let a = encrypt(plaintext, &key()).unwrap();
        let b = encrypt(plaintext, &key()).unwrap();
        assert_ne!(a, b);
        assert_eq!(plaintext_hash(&decrypt(&a, &key()).unwrap()), plaintext_hash(&decrypt(&b, &key()).unwrap()));
        assert_eq!(plaintext_hash(plaintext), plaintext_hash(plaintext));
    }

    #[test]
    fn truncated_frame_rejected() {
        assert!(decrypt(&[1, 2, 3], &key()).is_err());
    }
}
