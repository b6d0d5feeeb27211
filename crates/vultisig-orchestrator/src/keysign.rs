//! `keysign` — signature production over an existing vault (spec §4.7.3).

use std::time::Duration;
use tracing::instrument;
use vultisig_core::{
    CancelToken, Clock, PartyId, ProgressEvent, ProgressSink, Result, SchemeKind, Sleeper, Vault,
    VultisigError,
};
use vultisig_driver::{
    normalize_recovery_id, start_with_retry, CeremonyMode, CeremonyParams, EcdsaSignature,
    EddsaSignature, SignatureBundle,
};
use vultisig_relay::{RelayClient, RelayHttp};
use vultisig_session::{NullQuorumObserver, PartySession};

use crate::threshold::threshold_for_vault;

/// Raw output one `keysign` driver run produces before normalization: hex
/// strings for `r`/`s`, an optional DER encoding, and an optional hex
/// recovery id (ECDSA only).
#[derive(Debug, Clone)]
pub struct RawSignature {
    pub r: String,
    pub s: String,
    pub der: Vec<u8>,
    pub hex_recovery_id: Option<String>,
}

/// Everything `keysign` needs. `message_hashes` holds one hash per UTXO
/// input, or a single element for account-model chains (spec §4.7.3 step 5).
pub struct KeysignRequest<'a, H, F> {
    pub vault: &'a Vault,
    pub scheme: SchemeKind,
    pub message_hashes: Vec<Vec<u8>>,
    pub chain_path: String,
    pub peers: Vec<PartyId>,
    pub session_id: String,
    pub hex_encryption_key: String,
    pub relay: &'a RelayClient<H>,
    pub quorum_deadline: Duration,
    pub max_ceremony_attempts: u32,
    pub make_scheme: F,
    pub clock: &'a dyn Clock,
    pub sleeper: &'a dyn Sleeper,
    pub progress: &'a dyn ProgressSink,
    pub cancel: &'a CancelToken,
}

#[instrument(skip_all, fields(vault = %request.vault.name, scheme = ?request.scheme, hashes = request.message_hashes.len()))]
pub async fn keysign<H, S, F>(request: KeysignRequest<'_, H, F>) -> Result<Vec<SignatureBundle>>
where
    H: RelayHttp,
    S: vultisig_driver::Scheme<Output = RawSignature>,
    F: Fn(&CeremonyParams) -> Result<S>,
{
    if request.message_hashes.is_empty() {
        return Err(VultisigError::invalid_input("keysign requires at least one message hash"));
    }

    request.progress.emit(ProgressEvent::Initializing);

    let required = threshold_for_vault(request.vault);
    let session = PartySession::new(request.relay, request.session_id.clone());
    session.join(&request.vault.local_party_id).await?;
    request.progress.emit(ProgressEvent::WaitingForDevices {
        joined: 1,
        required,
    });
    let parties = session
        .wait_for_quorum(
            &request.vault.local_party_id,
            required,
            request.quorum_deadline,
            &NullQuorumObserver,
            request.cancel,
            request.clock,
            request.sleeper,
        )
        .await?;

    session.start(&parties).await?;

    let descriptor = vultisig_core::SessionDescriptor::new(
        uuid::Uuid::parse_str(&request.session_id)
            .map_err(|_| VultisigError::invalid_input("sessionId is not a valid uuid"))?,
        request.hex_encryption_key.clone(),
        String::new(),
    );
    let encryption_key = descriptor.decode_key()?;

    let total = request.message_hashes.len();
    let mut bundles = Vec::with_capacity(total);
    for (index, message_hash) in request.message_hashes.iter().enumerate() {
        request.progress.emit(ProgressEvent::Signing { index, total });
        let per_hash_session_id = if request.message_hashes.len() == 1 {
            request.session_id.clone()
        } else {
            format!("{}-{index}", request.session_id)
        };

        let mut extra_secret = message_hash.clone();
        extra_secret.push(0);
        extra_secret.extend_from_slice(request.chain_path.as_bytes());

        let params = CeremonyParams {
            mode: CeremonyMode::Keysign,
            is_initiator: true,
            scheme: request.scheme,
            local_party_id: request.vault.local_party_id.clone(),
            parties: request.peers.clone(),
            old_committee: None,
            extra_secret: Some(extra_secret),
        };

        let raw = start_with_retry(
            || (request.make_scheme)(&params),
            request.relay,
            &per_hash_session_id,
            &encryption_key,
            &params,
            request.progress,
            request.cancel,
            request.sleeper,
            request.max_ceremony_attempts,
        )
        .await?;

        bundles.push(to_signature_bundle(request.scheme, raw)?);
    }

    session.complete(&request.vault.local_party_id).await?;
    request.progress.emit(ProgressEvent::Finalizing);
    session.await_complete(&parties, request.cancel).await?;

    request.progress.emit(ProgressEvent::Complete);
    Ok(bundles)
}

fn to_signature_bundle(scheme: SchemeKind, raw: RawSignature) -> Result<SignatureBundle> {
    match scheme {
        SchemeKind::Ecdsa => {
            let hex_recovery_id = raw
                .hex_recovery_id
                .ok_or_else(|| VultisigError::protocol("ECDSA keysign output is missing recovery_id"))?;
            Ok(SignatureBundle::Ecdsa(EcdsaSignature {
                r: raw.r,
                s: raw.s,
                der: raw.der,
                recovery_id: normalize_recovery_id(&hex_recovery_id)?,
            }))
        }
        SchemeKind::Eddsa => Ok(SignatureBundle::Eddsa(EddsaSignature { r: raw.r, s: raw.s })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vultisig_core::{KeyShares, LibType, NullProgressSink, PublicKeys, SystemClock, TokioSleeper};
    use vultisig_driver::StepEffect;
    use vultisig_relay::{PollBackoff, RelayClientConfig, RelayMessage};

    #[derive(Default)]
    struct InMemoryRelay {
        parties: Mutex<Vec<PartyId>>,
        messages: Mutex<HashMap<PartyId, Vec<RelayMessage>>>,
        complete: Mutex<Vec<PartyId>>,
    }

    #[async_trait]
    impl RelayHttp for InMemoryRelay {
        async fn post_parties(&self, _session_id: &str, party_ids: &[PartyId]) -> Result<()> {
            let mut parties = self.parties.lock().unwrap();
            for party in party_ids {
                if !parties.contains(party) {
                    parties.push(party.clone());
                }
            }
            Ok(())
        }
        async fn get_parties(&self, _session_id: &str) -> Result<Vec<PartyId>> {
            Ok(self.parties.lock().unwrap().clone())
        }
        async fn delete_session(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }
        async fn post_start(&self, _session_id: &str, _party_ids: &[PartyId]) -> Result<()> {
            Ok(())
        }
        async fn get_start(&self, _session_id: &str) -> Result<Option<Vec<PartyId>>> {
            Ok(Some(self.parties.lock().unwrap().clone()))
        }
        async fn post_message(&self, _session_id: &str, message: &RelayMessage) -> Result<()> {
            let mut messages = self.messages.lock().unwrap();
            for to in &message.to {
                messages.entry(to.clone()).or_default().push(message.clone());
            }
            Ok(())
        }
        async fn get_messages(&self, _session_id: &str, party_id: &PartyId) -> Result<Vec<RelayMessage>> {
            Ok(self.messages.lock().unwrap().get(party_id).cloned().unwrap_or_default())
        }
        async fn delete_message(&self, _session_id: &str, party_id: &PartyId, hash: &str) -> Result<()> {
            if let Some(queue) = self.messages.lock().unwrap().get_mut(party_id) {
                queue.retain(|m| m.hash != hash);
            }
            Ok(())
        }
        async fn post_setup_message(&self, _session_id: &str, _bytes: &[u8], _header: Option<&str>) -> Result<()> {
            Ok(())
        }
        async fn get_setup_message(&self, _session_id: &str, _header: Option<&str>) -> Result<Option<Vec<u8>>> {
            Ok(Some(vec![]))
        }
        async fn post_complete(&self, _session_id: &str, party_ids: &[PartyId]) -> Result<()> {
            self.complete.lock().unwrap().extend_from_slice(party_ids);
            Ok(())
        }
        async fn get_complete(&self, _session_id: &str) -> Result<Option<Vec<PartyId>>> {
            let completed = self.complete.lock().unwrap().clone();
            if completed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(completed))
            }
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    struct FixedSignatureScheme {
        calls: std::sync::Arc<Mutex<u32>>,
        sent_setup: bool,
    }

    impl vultisig_driver::Scheme for FixedSignatureScheme {
        type Output = RawSignature;

        fn step(&mut self, _inbound: Option<&[u8]>) -> Result<StepEffect<Self::Output>> {
            if !self.sent_setup {
                self.sent_setup = true;
                return Ok(StepEffect::NeedSetup(vec![0]));
            }
            *self.calls.lock().unwrap() += 1;
            Ok(StepEffect::Done(RawSignature {
                r: "r".into(),
                s: "s".into(),
                der: vec![0x30],
                hex_recovery_id: Some("01".into()),
            }))
        }
    }

    fn relay_client(relay: InMemoryRelay) -> RelayClient<InMemoryRelay> {
        RelayClient::new(
            relay,
            Box::new(SystemClock),
            Box::new(TokioSleeper),
            RelayClientConfig {
                poll_deadline: Duration::from_secs(2),
                backoff: PollBackoff {
                    base: Duration::from_millis(2),
                    max: Duration::from_millis(10),
                },
                transport_retry_attempts: 2,
            },
        )
    }

    fn test_vault() -> Vault {
        Vault {
            name: "Test".into(),
            public_keys: PublicKeys {
                ecdsa: "02ab".into(),
                eddsa: "dead".into(),
            },
            local_party_id: PartyId::new("sdk-1"),
            signers: vec![PartyId::new("sdk-1"), PartyId::new("sdk-2")],
            hex_chain_code: "c".repeat(64),
            key_shares: KeyShares {
                ecdsa: vec![1],
                eddsa: vec![2],
            },
            lib_type: LibType::Dkls,
            created_at: 0,
            order: 0,
            is_backed_up: false,
        }
    }

    #[tokio::test]
    async fn single_hash_ecdsa_keysign_returns_one_bundle() {
        let relay = relay_client(InMemoryRelay::default());
        let cancel = CancelToken::new();
        let vault = test_vault();
        let calls = std::sync::Arc::new(Mutex::new(0u32));

        let bundles = keysign(KeysignRequest {
            vault: &vault,
            scheme: SchemeKind::Ecdsa,
            message_hashes: vec![vec![1, 2, 3]],
            chain_path: "m/44'/60'/0'/0/0".into(),
            peers: vault.signers.clone(),
            session_id: uuid::Uuid::nil().to_string(),
            hex_encryption_key: "a".repeat(64),
            relay: &relay,
            quorum_deadline: Duration::from_secs(1),
            max_ceremony_attempts: 3,
            make_scheme: {
                let calls = calls.clone();
                move |_: &CeremonyParams| {
                    Ok(FixedSignatureScheme {
                        calls: calls.clone(),
                        sent_setup: false,
                    })
                }
            },
            clock: &SystemClock,
            sleeper: &TokioSleeper,
            progress: &NullProgressSink,
            cancel: &cancel,
        })
        .await
        .unwrap();

        assert_eq!(bundles.len(), 1);
        assert_matches::assert_matches!(&bundles[0], SignatureBundle::Ecdsa(sig) if sig.recovery_id == 1);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn multi_hash_utxo_keysign_collects_signature_per_input() {
        let relay = relay_client(InMemoryRelay::default());
        let cancel = CancelToken::new();
        let vault = test_vault();
        let calls = std::sync::Arc::new(Mutex::new(0u32));

        let bundles = keysign(KeysignRequest {
            vault: &vault,
            scheme: SchemeKind::Ecdsa,
            message_hashes: vec![vec![1], vec![2], vec![3]],
            chain_path: "m/84'/0'/0'/0/0".into(),
            peers: vault.signers.clone(),
            session_id: uuid::Uuid::nil().to_string(),
            hex_encryption_key: "a".repeat(64),
            relay: &relay,
            quorum_deadline: Duration::from_secs(1),
            max_ceremony_attempts: 3,
            make_scheme: {
                let calls = calls.clone();
                move |_: &CeremonyParams| {
                    Ok(FixedSignatureScheme {
                        calls: calls.clone(),
                        sent_setup: false,
                    })
                }
            },
            clock: &SystemClock,
            sleeper: &TokioSleeper,
            progress: &NullProgressSink,
            cancel: &cancel,
        })
        .await
        .unwrap();

        assert_eq!(bundles.len(), 3);
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn rejects_empty_message_hashes() {
        let relay = relay_client(InMemoryRelay::default());
        let cancel = CancelToken::new();
        let vault = test_vault();

        let result = keysign(KeysignRequest {
            vault: &vault,
            scheme: SchemeKind::Ecdsa,
            message_hashes: vec![],
            chain_path: "m/44'/60'/0'/0/0".into(),
            peers: vault.signers.clone(),
            session_id: uuid::Uuid::nil().to_string(),
            hex_encryption_key: "a".repeat(64),
            relay: &relay,
            quorum_deadline: Duration::from_secs(1),
            max_ceremony_attempts: 3,
            make_scheme: |_: &CeremonyParams| {
                Ok(FixedSignatureScheme {
                    calls: std::sync::Arc::new(Mutex::new(0)),
                    sent_setup: false,
                })
            },
            clock: &SystemClock,
            sleeper: &TokioSleeper,
            progress: &NullProgressSink,
            cancel: &cancel,
        })
        .await;

        assert_matches::assert_matches!(result, Err(VultisigError::InvalidInput { .. }));
    }
}
