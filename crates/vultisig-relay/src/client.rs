//! Relay client: HTTP-level session lifecycle against the stateless relay
//! (spec §4.1, §6). `RelayHttp` is the raw transport effect, grounded on
//! `aura-core::effects::transport::TransportEffects` — a narrow trait with
//! one method per wire operation, so the polling semantics in `RelayClient`
//! stay independent of whatever HTTP stack backs it in tests.

use async_trait::async_trait;
use std::time::Duration;
use vultisig_core::{CancelToken, Clock, PartyId, Result, VultisigError, Sleeper};

use crate::message::RelayMessage;
use crate::retry::{poll_until, retry_transport, PollBackoff};

const PING_BODY: &str = "Voltix Router is running";

/// Raw relay operations (spec §6's HTTP table), one method per route.
/// Poll-style routes (`list_parties`, `get_start`, `get_setup_message`,
/// `get_complete`) return `Ok(None)` for a 404/"not yet" response rather
/// than treating it as an error.
#[async_trait]
pub trait RelayHttp: Send + Sync {
    async fn post_parties(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()>;
    async fn get_parties(&self, session_id: &str) -> Result<Vec<PartyId>>;
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    async fn post_start(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()>;
    async fn get_start(&self, session_id: &str) -> Result<Option<Vec<PartyId>>>;

    async fn post_message(&self, session_id: &str, message: &RelayMessage) -> Result<()>;
    async fn get_messages(&self, session_id: &str, party_id: &PartyId) -> Result<Vec<RelayMessage>>;
    async fn delete_message(&self, session_id: &str, party_id: &PartyId, hash: &str) -> Result<()>;

    async fn post_setup_message(&self, session_id: &str, bytes: &[u8], header: Option<&str>) -> Result<()>;
    async fn get_setup_message(&self, session_id: &str, header: Option<&str>) -> Result<Option<Vec<u8>>>;

    async fn post_complete(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()>;
    async fn get_complete(&self, session_id: &str) -> Result<Option<Vec<PartyId>>>;

    async fn ping(&self) -> Result<()>;
}

/// `reqwest`-backed production implementation of [`RelayHttp`].
pub struct HttpRelay {
    base_url: String,
    http: reqwest::Client,
}

impl HttpRelay {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Maps a non-2xx response to the spec's failure model: 5xx is
    /// `Transport` (retried), other 4xx is `Protocol` (fatal).
    fn classify_status(status: reqwest::StatusCode, context: &str) -> VultisigError {
        if status.is_server_error() {
            VultisigError::transport(format!("{context}: server error {status}"))
        } else {
            VultisigError::protocol(format!("{context}: unexpected status {status}"))
        }
    }
}

#[async_trait]
impl RelayHttp for HttpRelay {
    async fn post_parties(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/{session_id}")))
            .json(party_ids)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::classify_status(response.status(), "registerParty"))
        }
    }

    async fn get_parties(&self, session_id: &str) -> Result<Vec<PartyId>> {
        let response = self
            .http
            .get(self.url(&format!("/{session_id}")))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json::<Vec<PartyId>>().await?)
        } else {
            Err(Self::classify_status(response.status(), "listParties"))
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/{session_id}")))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::classify_status(response.status(), "deleteSession"))
        }
    }

    async fn post_start(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/start/{session_id}")))
            .json(party_ids)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::classify_status(response.status(), "startSession"))
        }
    }

    async fn get_start(&self, session_id: &str) -> Result<Option<Vec<PartyId>>> {
        let response = self
            .http
            .get(self.url(&format!("/start/{session_id}")))
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => {
                let parties = response
                    .json::<Vec<PartyId>>()
                    .await?;
                if parties.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(parties))
                }
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(Self::classify_status(status, "awaitSessionStart")),
        }
    }

    async fn post_message(&self, session_id: &str, message: &RelayMessage) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/message/{session_id}")))
            .json(message)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::classify_status(response.status(), "sendMessage"))
        }
    }

    async fn get_messages(&self, session_id: &str, party_id: &PartyId) -> Result<Vec<RelayMessage>> {
        let response = self
            .http
            .get(self.url(&format!("/message/{session_id}/{party_id}")))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json::<Vec<RelayMessage>>().await?)
        } else {
            Err(Self::classify_status(response.status(), "fetchMessages"))
        }
    }

    async fn delete_message(&self, session_id: &str, party_id: &PartyId, hash: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/message/{session_id}/{party_id}/{hash}")))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::classify_status(response.status(), "ackMessage"))
        }
    }

    async fn post_setup_message(&self, session_id: &str, bytes: &[u8], header: Option<&str>) -> Result<()> {
        let mut request = self.http.post(self.url(&format!("/setup-message/{session_id}")));
        if let Some(header) = header {
            request = request.header("message-id", header);
        }
        let response = request
            .body(bytes.to_vec())
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::classify_status(response.status(), "uploadSetupMessage"))
        }
    }

    async fn get_setup_message(&self, session_id: &str, header: Option<&str>) -> Result<Option<Vec<u8>>> {
        let mut request = self.http.get(self.url(&format!("/setup-message/{session_id}")));
        if let Some(header) = header {
            request = request.header("message-id", header);
        }
        let response = request
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await?;
                Ok(Some(bytes.to_vec()))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(Self::classify_status(status, "fetchSetupMessage")),
        }
    }

    async fn post_complete(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()> {
        let response = self
            .http
            .post(self.url(&format!("/complete/{session_id}/keysign")))
            .json(party_ids)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::classify_status(response.status(), "markComplete"))
        }
    }

    async fn get_complete(&self, session_id: &str) -> Result<Option<Vec<PartyId>>> {
        let response = self
            .http
            .get(self.url(&format!("/complete/{session_id}/keysign")))
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => {
                let parties = response
                    .json::<Vec<PartyId>>()
                    .await?;
                if parties.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(parties))
                }
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(Self::classify_status(status, "awaitComplete")),
        }
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(self.url("/ping"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::classify_status(response.status(), "ping"));
        }
        let body = response.text().await?;
        if body.trim() == PING_BODY {
            Ok(())
        } else {
            Err(VultisigError::protocol(format!("unexpected ping body: {body}")))
        }
    }
}

/// Poll timing and retry budget for a [`RelayClient`].
#[derive(Debug, Clone, Copy)]
pub struct RelayClientConfig {
    pub poll_deadline: Duration,
    pub backoff: PollBackoff,
    pub transport_retry_attempts: u32,
}

impl Default for RelayClientConfig {
    fn default() -> Self {
        Self {
            poll_deadline: Duration::from_secs(300),
            backoff: PollBackoff::default(),
            transport_retry_attempts: 4,
        }
    }
}

impl From<&vultisig_core::RelayConfig> for RelayClientConfig {
    fn from(config: &vultisig_core::RelayConfig) -> Self {
        Self {
            poll_deadline: config.poll_deadline(),
            backoff: PollBackoff {
                base: config.backoff_base(),
                max: config.backoff_max(),
            },
            transport_retry_attempts: config.transport_retry_attempts,
        }
    }
}

/// Session-lifecycle wrapper over [`RelayHttp`], implementing the polling
/// and retry semantics from spec §4.1: poll routes retried with jittered
/// backoff until success, deadline, or cancellation; single-shot routes
/// retried only while `Transport` within a bounded budget.
pub struct RelayClient<H: RelayHttp> {
    http: H,
    clock: Box<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
    config: RelayClientConfig,
}

impl<H: RelayHttp> RelayClient<H> {
    pub fn new(http: H, clock: Box<dyn Clock>, sleeper: Box<dyn Sleeper>, config: RelayClientConfig) -> Self {
        Self {
            http,
            clock,
            sleeper,
            config,
        }
    }

    pub async fn register_party(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()> {
        retry_transport(
            || self.http.post_parties(session_id, party_ids),
            self.config.transport_retry_attempts,
        )
        .await
    }

    pub async fn list_parties(&self, session_id: &str) -> Result<Vec<PartyId>> {
        retry_transport(
            || self.http.get_parties(session_id),
            self.config.transport_retry_attempts,
        )
        .await
    }

    pub async fn start_session(&self, session_id: &str, party_ids: &[PartyId]) -> Result<()> {
        retry_transport(
            || self.http.post_start(session_id, party_ids),
            self.config.transport_retry_attempts,
        )
        .await
    }

    pub async fn await_session_start(
        &self,
        session_id: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<PartyId>> {
        poll_until(
            || self.http.get_start(session_id),
            self.config.poll_deadline,
            self.clock.as_ref(),
            self.sleeper.as_ref(),
            cancel,
            self.config.backoff,
            "session start",
        )
        .await
    }

    pub async fn send_message(&self, session_id: &str, message: &RelayMessage) -> Result<()> {
        retry_transport(
            || self.http.post_message(session_id, message),
            self.config.transport_retry_attempts,
        )
        .await
    }

    pub async fn fetch_messages(&self, session_id: &str, party_id: &PartyId) -> Result<Vec<RelayMessage>> {
        retry_transport(
            || self.http.get_messages(session_id, party_id),
            self.config.transport_retry_attempts,
        )
        .await
    }

    pub async fn ack_message(&self, session_id: &str, party_id: &PartyId, hash: &str) -> Result<()> {
        retry_transport(
            || self.http.delete_message(session_id, party_id, hash),
            self.config.transport_retry_attempts,
        )
        .await
    }

    pub async fn upload_setup_message(
        &self,
        session_id: &str,
        bytes: &[u8],
        header: Option<&str>,
    ) -> Result<()> {
        retry_transport(
            || self.http.post_setup_message(session_id, bytes, header),
            self.config.transport_retry_attempts,
        )
        .await
    }

    pub async fn fetch_setup_message(
        &self,
        session_id: &str,
        header: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        poll_until(
            || self.http.get_setup_message(session_id, header),
            self.config.poll_deadline,
            self.clock.as_ref(),
            self.sleeper.as_ref(),
            cancel,
            self.config.backoff,
            "setup message",
        )
        .await
    }

    pub async fn mark_complete(&self, session_id: &str, party_id: &PartyId) -> Result<()> {
        retry_transport(
            || self.http.post_complete(session_id, std::slice::from_ref(party_id)),
            self.config.transport_retry_attempts,
        )
        .await
    }

    /// Polls until every party in `peers` appears in the relay's complete
    /// set. `peers` should include the local party if it already called
    /// `mark_complete`.
    pub async fn await_complete(
        &self,
        session_id: &str,
        peers: &[PartyId],
        cancel: &CancelToken,
    ) -> Result<()> {
        poll_until(
            || async {
                match self.http.get_complete(session_id).await? {
                    Some(completed) if peers.iter().all(|peer| completed.contains(peer)) => {
                        Ok(Some(()))
                    }
                    _ => Ok(None),
                }
            },
            self.config.poll_deadline,
            self.clock.as_ref(),
            self.sleeper.as_ref(),
            cancel,
            self.config.backoff,
            "ceremony completion",
        )
        .await
    }

    pub async fn ping(&self) -> Result<()> {
        retry_transport(|| self.http.ping(), self.config.transport_retry_attempts).await
    }
}
