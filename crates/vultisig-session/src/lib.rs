//! Party session: join/waitForQuorum/start/complete primitives over the
//! relay (spec §4.5). A thin, stateless adapter — all durable state lives
//! in the relay itself.

use std::time::Duration;
use tracing::instrument;
use vultisig_core::{CancelToken, Clock, PartyId, Result, Sleeper, VultisigError};
use vultisig_relay::{RelayClient, RelayHttp};

/// Callback invoked once per newly observed party during `wait_for_quorum`.
pub trait QuorumObserver: Send + Sync {
    fn on_join(&self, party: &PartyId);
}

impl<F: Fn(&PartyId) + Send + Sync> QuorumObserver for F {
    fn on_join(&self, party: &PartyId) {
        self(party)
    }
}

/// Observer that does nothing, for callers that don't care about join events.
pub struct NullQuorumObserver;

impl QuorumObserver for NullQuorumObserver {
    fn on_join(&self, _party: &PartyId) {}
}

const QUORUM_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Adapter over the relay client for one ceremony's participant lifecycle.
pub struct PartySession<'a, H: RelayHttp> {
    relay: &'a RelayClient<H>,
    session_id: String,
}

impl<'a, H: RelayHttp> PartySession<'a, H> {
    pub fn new(relay: &'a RelayClient<H>, session_id: impl Into<String>) -> Self {
        Self {
            relay,
            session_id: session_id.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn join(&self, local_party_id: &PartyId) -> Result<()> {
        self.relay
            .register_party(&self.session_id, std::slice::from_ref(local_party_id))
            .await
    }

    /// Polls `listParties` until at least `required` parties are present or
    /// `deadline` elapses, invoking `observer` once per newly seen party.
    /// The returned list is ordered `[local_party_id, ...others]`.
    #[instrument(skip(self, observer, cancel, clock, sleeper))]
    pub async fn wait_for_quorum(
        &self,
        local_party_id: &PartyId,
        required: usize,
        deadline: Duration,
        observer: &dyn QuorumObserver,
        cancel: &CancelToken,
        clock: &dyn Clock,
        sleeper: &dyn Sleeper,
    ) -> Result<Vec<PartyId>> {
        let start = clock.now_millis();
        let mut seen: Vec<PartyId> = Vec::new();

        loop {
            cancel.check()?;

            let parties = self.relay.list_parties(&self.session_id).await?;
            for party in &parties {
                if !seen.contains(party) {
                    seen.push(party.clone());
                    observer.on_join(party);
                }
            }

            if seen.len() >= required {
                let mut ordered = Vec::with_capacity(seen.len());
                ordered.push(local_party_id.clone());
                for party in &seen {
                    if party != local_party_id {
                        ordered.push(party.clone());
                    }
                }
                return Ok(ordered);
            }

            if clock.now_millis().saturating_sub(start) >= deadline.as_millis() as u64 {
                return Err(VultisigError::timeout(format!(
                    "quorum not reached: observed {} of {} required",
                    seen.len(),
                    required
                )));
            }

            tokio::select! {
                _ = sleeper.sleep(QUORUM_POLL_INTERVAL) => {}
                _ = cancel.cancelled() => return Err(VultisigError::Cancelled),
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn start(&self, parties: &[PartyId]) -> Result<()> {
        self.relay.start_session(&self.session_id, parties).await
    }

    #[instrument(skip(self, cancel))]
    pub async fn await_start(&self, cancel: &CancelToken) -> Result<Vec<PartyId>> {
        self.relay.await_session_start(&self.session_id, cancel).await
    }

    #[instrument(skip(self))]
    pub async fn complete(&self, local_party_id: &PartyId) -> Result<()> {
        self.relay.mark_complete(&self.session_id, local_party_id).await
    }

    #[instrument(skip(self, cancel))]
    pub async fn await_complete(&self, peers: &[PartyId], cancel: &CancelToken) -> Result<()> {
        self.relay.await_complete(&self.session_id, peers, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use vultisig_core::{SystemClock, TokioSleeper};
    use vultisig_relay::{PollBackoff, RelayClientConfig, RelayMessage};

    #[derive(Default)]
    struct FakeRelay {
        parties: Mutex<Vec<PartyId>>,
    }

    #[async_trait]
    impl RelayHttp for FakeRelay {
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
            Ok(None)
        }
        async fn post_message(&self, _session_id: &str, _message: &RelayMessage) -> Result<()> {
            Ok(())
        }
        async fn get_messages(&self, _session_id: &str, _party_id: &PartyId) -> Result<Vec<RelayMessage>> {
            Ok(vec![])
        }
        async fn delete_message(&self, _session_id: &str, _party_id: &PartyId, _hash: &str) -> Result<()> {
            Ok(())
        }
        async fn post_setup_message(&self, _session_id: &str, _bytes: &[u8], _header: Option<&str>) -> Result<()> {
            Ok(())
        }
        async fn get_setup_message(&self, _session_id: &str, _header: Option<&str>) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn post_complete(&self, _session_id: &str, _party_ids: &[PartyId]) -> Result<()> {
            Ok(())
        }
        async fn get_complete(&self, _session_id: &str) -> Result<Option<Vec<PartyId>>> {
            Ok(None)
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn relay_client(relay: FakeRelay) -> RelayClient<FakeRelay> {
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

    #[tokio::test]
    async fn wait_for_quorum_times_out_reporting_observed_count() {
        let relay = relay_client(FakeRelay::default());
        let session = PartySession::new(&relay, "session-1");
        let local = PartyId::new("sdk-1");
        session.join(&local).await.unwrap();

        let cancel = CancelToken::new();
        let result = session
            .wait_for_quorum(
                &local,
                3,
                Duration::from_millis(1),
                &NullQuorumObserver,
                &cancel,
                &SystemClock,
                &TokioSleeper,
            )
            .await;

        assert_matches::assert_matches!(result, Err(VultisigError::Timeout { message }) if message.contains("1 of 3"));
    }

    #[tokio::test]
    async fn wait_for_quorum_invokes_observer_once_per_party() {
        let relay = relay_client(FakeRelay::default());
        let session = PartySession::new(&relay, "session-1");
        let local = PartyId::new("sdk-1");
        let peer = PartyId::new("sdk-2");
        session.join(&local).await.unwrap();
        session.join(&peer).await.unwrap();

        let join_count = AtomicUsize::new(0);
        let observer = move |_: &PartyId| {
            join_count.fetch_add(1, Ordering::SeqCst);
        };
        let cancel = CancelToken::new();

        let quorum = session
            .wait_for_quorum(
                &local,
                2,
                Duration::from_secs(1),
                &observer,
                &cancel,
                &SystemClock,
                &TokioSleeper,
            )
            .await
            .unwrap();

        assert_eq!(quorum, vec![local.clone(), peer.clone()]);
    }
}
