//! `keyImport` — vault creation from an existing BIP-39 mnemonic (spec §4.7.2).

use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;
use vultisig_core::{
    CancelToken, Clock, KeyShares, LibType, PartyId, ProgressEvent, ProgressSink, PublicKeys,
    Result, SchemeKind, Sleeper, Vault, VultisigError,
};
use vultisig_crypto::derive_master_key;
use vultisig_driver::{start_with_retry, CeremonyMode, CeremonyParams, KeygenOutput, Scheme};
use vultisig_pairing::messages::KeygenMessage;
use vultisig_relay::{RelayClient, RelayHttp};
use vultisig_session::{NullQuorumObserver, PartySession};

use crate::keygen::KeygenOutcome;

pub struct KeyImportRequest<'a, H, FE, FD> {
    pub name: String,
    pub mnemonic: String,
    pub local_party_id: PartyId,
    pub devices: usize,
    pub is_initiator: bool,
    pub session_id: Uuid,
    pub hex_encryption_key: String,
    pub relay: &'a RelayClient<H>,
    pub quorum_deadline: Duration,
    pub max_ceremony_attempts: u32,
    pub make_ecdsa: FE,
    pub make_eddsa: FD,
    pub clock: &'a dyn Clock,
    pub sleeper: &'a dyn Sleeper,
    pub progress: &'a dyn ProgressSink,
    pub cancel: &'a CancelToken,
}

#[instrument(skip_all, fields(name = %request.name, devices = request.devices))]
pub async fn key_import<H, Ecdsa, Eddsa, FE, FD>(
    request: KeyImportRequest<'_, H, FE, FD>,
) -> Result<KeygenOutcome>
where
    H: RelayHttp,
    Ecdsa: Scheme<Output = KeygenOutput>,
    Eddsa: Scheme<Output = KeygenOutput>,
    FE: Fn(&CeremonyParams) -> Result<Ecdsa>,
    FD: Fn(&CeremonyParams) -> Result<Eddsa>,
{
    request.progress.emit(ProgressEvent::Initializing);
    let master_key = derive_master_key(&request.mnemonic)?;

    let pairing_message = KeygenMessage {
        session_id: request.session_id,
        service_name: request.local_party_id.to_string(),
        encryption_key_hex: request.hex_encryption_key.clone(),
        hex_chain_code: master_key.hex_chain_code.clone(),
        lib_type: LibType::Dkls,
        vault_name: request.name.clone(),
    };
    let pairing_uri = vultisig_pairing::uri::encode_keygen(&pairing_message)?;
    request.progress.emit(ProgressEvent::GeneratingQr);

    let session_id_str = request.session_id.to_string();
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
        mode: CeremonyMode::KeyImport,
        is_initiator: request.is_initiator,
        scheme: SchemeKind::Ecdsa,
        local_party_id: request.local_party_id.clone(),
        parties: parties.clone(),
        old_committee: None,
        extra_secret: Some(master_key.ecdsa_private_key.to_vec()),
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

    if ecdsa_output.chain_code != master_key.hex_chain_code {
        return Err(VultisigError::cryptographic(
            "ECDSA ceremony chain code does not match the BIP-32 master chain code",
        ));
    }

    // The EdDSA run shares the ECDSA sessionId's participant set but gets a
    // disjoint message lane (spec §4.7.2).
    let eddsa_session_id_str = format!("{session_id_str}-eddsa");
    let eddsa_params = CeremonyParams {
        mode: CeremonyMode::KeyImport,
        scheme: SchemeKind::Eddsa,
        extra_secret: Some(master_key.eddsa_private_key.to_vec()),
        ..ecdsa_params.clone()
    };
    request.progress.emit(ProgressEvent::Keygen { scheme: SchemeKind::Eddsa });
    let eddsa_output = start_with_retry(
        || (request.make_eddsa)(&eddsa_params),
        request.relay,
        &eddsa_session_id_str,
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
        hex_chain_code: master_key.hex_chain_code.clone(),
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
