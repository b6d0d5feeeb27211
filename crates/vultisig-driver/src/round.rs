//! The round loop (spec §4.6): setup fan-out, sequenced rounds, ack-after-
//! consume dedup, bounded transport retry.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{instrument, warn};
use vultisig_core::{CancelToken, PartyId, ProgressSink, Result, Sleeper, VultisigError};
use vultisig_crypto::frame;
use vultisig_relay::{RelayClient, RelayHttp, RelayMessage};

use crate::params::{setup_header, CeremonyMode, CeremonyParams};
use crate::scheme::{Recipients, Scheme, StepEffect};

/// Inter-iteration delay when a poll turns up no new inbound messages,
/// amortizing round-trips without tight-looping the relay.
const ROUND_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Runs one scheme to completion over the relay. Returns the scheme's
/// final output (a key share for keygen/key-import, a signature bundle for
/// keysign — the driver itself doesn't interpret it).
#[instrument(skip(scheme, relay, encryption_key, progress, cancel, sleeper))]
pub async fn run_ceremony<S: Scheme, H: RelayHttp>(
    mut scheme: S,
    relay: &RelayClient<H>,
    session_id: &str,
    encryption_key: &[u8; 32],
    params: &CeremonyParams,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
    sleeper: &dyn Sleeper,
) -> Result<S::Output> {
    let header = setup_header(params.scheme, params.mode);
    let mut pending_inbound: VecDeque<Vec<u8>> = VecDeque::new();
    let mut outbound_seq: u64 = 0;
    let mut last_seq_by_sender: HashMap<PartyId, u64> = HashMap::new();

    if params.is_initiator {
        if let StepEffect::NeedSetup(bytes) = scheme.step(None)? {
            relay.upload_setup_message(session_id, &bytes, header).await?;
        } else {
            return Err(VultisigError::protocol(
                "initiator's first step did not produce a setup blob",
            ));
        }
    } else {
        let setup_bytes = relay.fetch_setup_message(session_id, header, cancel).await?;
        pending_inbound.push_back(setup_bytes);
    }

    loop {
        cancel.check()?;

        let inbound = pending_inbound.pop_front();
        let had_inbound = inbound.is_some();
        match scheme.step(inbound.as_deref())? {
            StepEffect::NeedSetup(bytes) => {
                relay.upload_setup_message(session_id, &bytes, header).await?;
            }
            StepEffect::Send(messages) => {
                for message in messages {
                    let recipients = match message.to {
                        Recipients::AllPeers => params.peers(),
                        Recipients::Parties(parties) => parties,
                    };
                    let hash = frame::plaintext_hash(&message.body);
                    let ciphertext = frame::encrypt(&message.body, encryption_key)?;
                    let relay_message = RelayMessage::new(
                        session_id,
                        params.local_party_id.clone(),
                        recipients,
                        &ciphertext,
                        hash,
                        outbound_seq,
                    );
                    relay.send_message(session_id, &relay_message).await?;
                    outbound_seq += 1;
                }
            }
            StepEffect::Done(output) => return Ok(output),
        }

        let fetched = relay.fetch_messages(session_id, &params.local_party_id).await?;
        let mut relevant: Vec<RelayMessage> = fetched
            .into_iter()
            .filter(|message| message.is_for(&params.local_party_id))
            .collect();
        relevant.sort_by_key(|message| (message.from.clone(), message.sequence_no));

        let mut accepted_any = false;
        for message in relevant {
            let expected_seq = last_seq_by_sender
                .get(&message.from)
                .map(|seq| seq + 1)
                .unwrap_or(0);

            if message.sequence_no < expected_seq {
                // Already processed: a faulty relay redelivered it (spec S5).
                relay
                    .ack_message(session_id, &params.local_party_id, &message.hash)
                    .await?;
                continue;
            }
            if message.sequence_no > expected_seq {
                // Out of order: leave it queued, it will be re-fetched once
                // the missing sequence number arrives.
                continue;
            }

            let ciphertext = message.body_bytes()?;
            match frame::decrypt(&ciphertext, encryption_key) {
                Ok(plaintext) => {
                    last_seq_by_sender.insert(message.from.clone(), message.sequence_no);
                    pending_inbound.push_back(plaintext);
                    relay
                        .ack_message(session_id, &params.local_party_id, &message.hash)
                        .await?;
                    accepted_any = true;
                }
                Err(err) => {
                    warn!(sender = %message.from, %err, "dropping undecryptable relay message");
                    relay
                        .ack_message(session_id, &params.local_party_id, &message.hash)
                        .await?;
                }
            }
        }

        if !had_inbound && !accepted_any && pending_inbound.is_empty() {
            // Keysign's idle ticks are reported by the caller (which knows the
            // per-hash index/total), not here — this loop only runs one hash
            // at a time and has no such context.
            if matches!(params.mode, CeremonyMode::Keygen | CeremonyMode::KeyImport) {
                progress.emit(vultisig_core::ProgressEvent::Keygen { scheme: params.scheme });
            }
            sleeper.sleep(ROUND_POLL_INTERVAL).await;
        }
    }
}

/// Bounded retry over the whole round loop (spec: recommended 3 attempts).
/// Only `Transport` failures are retried; each attempt restarts the
/// ceremony with a freshly constructed scheme, since resuming partial
/// cryptographic state risks an inconsistent result.
#[instrument(skip(make_scheme, relay, encryption_key, progress, cancel, sleeper))]
pub async fn start_with_retry<S, H, F>(
    make_scheme: F,
    relay: &RelayClient<H>,
    session_id: &str,
    encryption_key: &[u8; 32],
    params: &CeremonyParams,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
    sleeper: &dyn Sleeper,
    max_attempts: u32,
) -> Result<S::Output>
where
    S: Scheme,
    H: RelayHttp,
    F: Fn() -> Result<S>,
{
    let mut last_err = None;
    for attempt in 0..max_attempts.max(1) {
        let scheme = make_scheme()?;
        match run_ceremony(scheme, relay, session_id, encryption_key, params, progress, cancel, sleeper).await {
            Ok(output) => return Ok(output),
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| VultisigError::transport("retry budget exhausted")))
}
