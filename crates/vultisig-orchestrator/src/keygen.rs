//! `keygen` — fresh N-party vault creation (spec §4.7.1).

use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;
use vultisig_core::{
    CancelToken, Clock, KeyShares, LibType, PartyId, ProgressEvent, ProgressSink, PublicKeys,
    Result, SchemeKind, Sleeper, Vault,
};
use vultisig_driver::{start_with_retry, CeremonyMode, CeremonyParams, KeygenOutput, Scheme};
use vultisig_pairing::messages::KeygenMessage;
use vultisig_relay::{RelayClient, RelayHttp};
use vultisig_session::{NullQuorumObserver, PartySession};

use crate::threshold::resolve_threshold;

/// Everything `keygen` needs: the relay, the two scheme factories, and the
/// collaborators (clock/sleeper/progress/cancel) it's injected with.
pub struct KeygenRequest<'a, H, FE, FD> {
    pub name: String,
    pub local_party_id: PartyId,
    pub devices: usize,
    pub threshold: Option<usize>,
    pub is_initiator: bool,
    pub session_id: Uuid,
    pub hex_encryption_key: String,
    /// Generated by the caller alongside `session_id`/`hex_encryption_key`
    /// (spec §4.7.1 step 1); broadcast in the pairing payload and, once the
    /// driver's own output is known, checked into the vault.
    pub hex_chain_code: String,
    pub relay: &'a RelayClient<H>,
    pub quorum_deadline: Duration,
    /// Transport-failure retry budget for each scheme's ceremony
    /// (`DriverConfig::max_ceremony_attempts`).
    pub max_ceremony_attempts: u32,
    pub make_ecdsa: FE,
    pub make_eddsa: FD,
    pub clock: &'a dyn Clock,
    pub sleeper: &'a dyn Sleeper,
    pub progress: &'a dyn ProgressSink,
    pub cancel: &'a CancelToken,
}

/// Result of a successful keygen: the materialized vault plus the pairing
/// URI peers scanned to join (spec §4.7.1 step 2).
pub struct KeygenOutcome {
    pub vault: Vault,
    pub pairing_uri: String,
}

#[instrument(skip_all, fields(name = %request.name, devices = request.devices))]
pub async fn keygen<H, Ecdsa, Eddsa, FE, FD>(request: KeygenRequest<'_, H, FE, FD>) -> Result<KeygenOutcome>
where
    H: RelayHttp,
    Ecdsa: Scheme<Output = KeygenOutput>,
    Eddsa: Scheme<Output = KeygenOutput>,
    FE: Fn(&CeremonyParams) -> Result<Ecdsa>,
    FD: Fn(&CeremonyParams) -> Result<Eddsa>,
{
    resolve_threshold(request.devices, request.threshold)?;
    request.progress.emit(ProgressEvent::Initializing);

    let session_id_str = request.session_id.to_string();
    let pairing_message = KeygenMessage {
        session_id: request.session_id,
        service_name: request.local_party_id.to_string(),
        encryption_key_hex: request.hex_encryption_key.clone(),
        hex_chain_code: request.hex_chain_code.clone(),
        lib_type: LibType::Dkls,
        vault_name: request.name.clone(),
    };
    let pairing_uri = vultisig_pairing::uri::encode_keygen(&pairing_message)?;
    request.progress.emit(ProgressEvent::GeneratingQr);

    let session = PartySession::new(request.relay, session_id_str.clone());
    session.join(&request.local_party_id).await?;
    request.progress.emit(ProgressEvent::WaitingForDevices {
        joined: 1,
        required: request.devices,
    });
    let parties = session
        .wait_for_quorum(
            &request.local_party_id,
            request.devices,
            request.quorum_deadline,
            &NullQuorumObserver,
            request.cancel,
            request.clock,
            request.sleeper,
        )
        .await?;

    if request.is_initiator {
        session.start(&parties).await?;
    } else {
        session.await_start(request.cancel).await?;
    }

    let descriptor = vultisig_core::SessionDescriptor::new(
        request.session_id,
        request.hex_encryption_key.clone(),
        String::new(),
    );
    let encryption_key = descriptor.decode_key()?;

    let ecdsa_params = CeremonyParams {
        mode: CeremonyMode::Keygen,
        is_initiator: request.is_initiator,
        scheme: SchemeKind::Ecdsa,
        local_party_id: request.local_party_id.clone(),
        parties: parties.clone(),
        old_committee: None,
        extra_secret: None,
    };
    request.progress.emit(ProgressEvent::Keygen { scheme: SchemeKind::Ecdsa });
    let ecdsa_output = start_with_retry(
        || (request.make_ecdsa)(&ecdsa_params),
        request.relay,
        &session_id_str,
        &encryption_key,
        &ecdsa_params,
        request.progress,
        request.cancel,
        request.sleeper,
        request.max_ceremony_attempts,
    )
    .await?;

    let eddsa_params = CeremonyParams {
        mode: CeremonyMode::Keygen,
        scheme: SchemeKind::Eddsa,
        ..ecdsa_params.clone()
    };
    request.progress.emit(ProgressEvent::Keygen { scheme: SchemeKind::Eddsa });
    let eddsa_output = start_with_retry(
        || (request.make_eddsa)(&eddsa_params),
        request.relay,
        &session_id_str,
        &encryption_key,
        &eddsa_params,
        request.progress,
        request.cancel,
        request.sleeper,
        request.max_ceremony_attempts,
    )
    .await?;

    session.complete(&request.local_party_id).await?;
    request.progress.emit(ProgressEvent::Finalizing);
    session.await_complete(&parties, request.cancel).await?;

    let vault = Vault {
        name: request.name.clone(),
        public_keys: PublicKeys {
            ecdsa: hex::encode(&ecdsa_output.public_key),
            eddsa: hex::encode(&eddsa_output.public_key),
        },
        local_party_id: request.local_party_id.clone(),
        signers: parties,
        hex_chain_code: ecdsa_output.chain_code,
        key_shares: KeyShares {
            ecdsa: ecdsa_output.key_share,
            eddsa: eddsa_output.key_share,
        },
        lib_type: LibType::Dkls,
        created_at: request.clock.now_millis(),
        order: 0,
        is_backed_up: false,
    };

    request.progress.emit(ProgressEvent::Complete);
    Ok(KeygenOutcome { vault, pairing_uri })
}
