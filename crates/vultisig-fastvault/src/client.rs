//! HTTP client for the fast-vault server (spec §4.8, §6).

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use vultisig_core::{PartyId, Result, Vault, VultisigError, FAST_VAULT_PARTY_PREFIX};
use vultisig_vault as container;

/// Parameters for `sign_with_server` (spec S6).
#[derive(Debug, Clone, Serialize)]
pub struct SignWithServerRequest {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    pub messages: Vec<String>,
    pub session: Uuid,
    #[serde(rename = "hexEncryptionKey")]
    pub hex_encryption_key: String,
    #[serde(rename = "derivePath")]
    pub derive_path: String,
    #[serde(rename = "isEcdsa")]
    pub is_ecdsa: bool,
    #[serde(rename = "vaultPassword")]
    pub vault_password: String,
}

#[derive(Debug, Clone, Serialize)]
struct VerifyVaultRequest {
    #[serde(rename = "vaultId")]
    vault_id: String,
    code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResendVerificationRequest {
    #[serde(rename = "vaultId")]
    pub vault_id: String,
    pub email: String,
    pub password: String,
}

/// Client for the fast-vault server's four HTTP endpoints.
pub struct FastVaultClient {
    base_url: String,
    http: reqwest::Client,
}

impl FastVaultClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Fetches the server-held encrypted vault blob and decodes it.
    #[instrument(skip(self, password))]
    pub async fn get_vault(&self, public_key_ecdsa: &str, password: &str) -> Result<Vault> {
        let response = self
            .http
            .get(self.url(&format!("/get/{public_key_ecdsa}")))
            .header("x-password", password)
            .send()
            .await
            .map_err(|err| VultisigError::transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(VultisigError::protocol(format!(
                "getVault: unexpected status {}",
                response.status()
            )));
        }

        let vult_text = response
            .text()
            .await
            .map_err(|err| VultisigError::protocol(err.to_string()))?;
        container::decode(&vult_text, Some(password))
    }

    /// Triggers the server signer; the relay carries the actual MPC traffic.
    /// Issues exactly one POST (spec S6) and treats a 200 with an empty body
    /// as success.
    #[instrument(skip(self, request), fields(is_ecdsa = request.is_ecdsa))]
    pub async fn sign_with_server(&self, request: &SignWithServerRequest) -> Result<()> {
        let response = self
            .http
            .post(self.url("/vault/sign"))
            .json(request)
            .send()
            .await
            .map_err(|err| VultisigError::transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(VultisigError::protocol(format!(
                "signWithServer: unexpected status {}",
                response.status()
            )))
        }
    }

    #[instrument(skip(self, code))]
    pub async fn verify_vault(&self, vault_id: &str, code: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/vault/verify"))
            .json(&VerifyVaultRequest {
                vault_id: vault_id.to_string(),
                code: code.to_string(),
            })
            .send()
            .await
            .map_err(|err| VultisigError::transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(VultisigError::VerificationPending {
                vault_id: vault_id.to_string(),
            })
        }
    }

    #[instrument(skip(self, request), fields(vault_id = %request.vault_id))]
    pub async fn resend_vault_verification(&self, request: &ResendVerificationRequest) -> Result<()> {
        let response = self
            .http
            .post(self.url("/vault/resend"))
            .json(request)
            .send()
            .await
            .map_err(|err| VultisigError::transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(VultisigError::protocol(format!(
                "resendVaultVerification: unexpected status {}",
                response.status()
            )))
        }
    }
}

/// Fast-vault signing always targets exactly the remote server party (spec
/// §4.8 invariant). Returns `InvalidInput` if `peers` doesn't match that
/// shape, so callers can't silently widen a fast-vault keysign's committee.
pub fn assert_server_only_peers(peers: &[PartyId]) -> Result<()> {
    if peers.len() == 1 && peers[0].is_fast_vault_server() {
        Ok(())
    } else {
        Err(VultisigError::invalid_input(format!(
            "fast-vault signing requires exactly one peer prefixed {FAST_VAULT_PARTY_PREFIX}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_server_peer() {
        assert!(assert_server_only_peers(&[PartyId::new("Server-1172")]).is_ok());
    }

    #[test]
    fn rejects_non_server_peer() {
        assert!(assert_server_only_peers(&[PartyId::new("iphone-1")]).is_err());
    }

    #[test]
    fn rejects_multiple_peers() {
        let peers = [PartyId::new("Server-1172"), PartyId::new("iphone-1")];
        assert!(assert_server_only_peers(&peers).is_err());
    }
}
