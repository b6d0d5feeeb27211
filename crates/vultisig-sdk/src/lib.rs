//! Client-side SDK facade: a single entry point bundling the relay client,
//! the ceremony orchestrator, and the supporting codecs for an embedding
//! application (vault container, pairing payload, fast-vault server calls).
//!
//! The DKLS/Schnorr primitives stay outside this crate's concern (spec
//! Non-goals): callers inject them as [`vultisig_driver::Scheme`] factories,
//! the same way the orchestrator crate takes them.

use std::time::Duration;
use tracing::instrument;
use vultisig_core::{NullProgressSink, ProgressSink, Result, SystemClock, TokioSleeper};
use vultisig_driver::{CeremonyParams, KeygenOutput, Scheme};
use vultisig_orchestrator::RawSignature;
use vultisig_relay::{HttpRelay, RelayClient, RelayClientConfig, RelayHttp};

pub use vultisig_core::{
    KeyShares, LibType, PartyId, ProgressEvent, PublicKeys, SchemeKind, Vault, VultisigError,
};
pub use vultisig_driver::{EcdsaSignature, EddsaSignature, SignatureBundle};
pub use vultisig_fastvault::{assert_server_only_peers, FastVaultClient};
pub use vultisig_orchestrator::{
    key_import, keygen, keysign, KeyImportRequest, KeygenOutcome, KeygenRequest, KeysignRequest,
    RawSignature,
};
pub use vultisig_pairing::{decode as decode_pairing_uri, KeygenMessage, KeysignMessage, PairingMessage};
pub use vultisig_vault::{decode as decode_vault, encode as encode_vault};

/// Default deadline for the quorum-wait phase of every ceremony, unless the
/// caller overrides it per call.
pub const DEFAULT_QUORUM_DEADLINE: Duration = Duration::from_secs(300);

/// Owns a relay connection plus the collaborators (clock, sleeper) every
/// ceremony needs; thin wrapper so an embedding application constructs one
/// client per relay endpoint instead of threading the pieces through by hand.
pub struct VultisigClient<H: RelayHttp = HttpRelay> {
    relay: RelayClient<H>,
    progress: Box<dyn ProgressSink>,
}

impl VultisigClient<HttpRelay> {
    /// Connects to the production relay at `base_url` with default polling
    /// and retry settings (spec §6).
    pub fn connect(base_url: impl Into<String>) -> Self {
        Self::with_config(base_url, RelayClientConfig::default())
    }

    pub fn with_config(base_url: impl Into<String>, config: RelayClientConfig) -> Self {
        let http = HttpRelay::new(base_url.into());
        Self {
            relay: RelayClient::new(http, Box::new(SystemClock), Box::new(TokioSleeper), config),
            progress: Box::new(NullProgressSink),
        }
    }
}

impl<H: RelayHttp> VultisigClient<H> {
    /// Wraps an already-constructed relay (used in tests with a fake
    /// [`RelayHttp`] implementation, or for non-HTTP transports).
    pub fn from_relay(relay: RelayClient<H>) -> Self {
        Self {
            relay,
            progress: Box::new(NullProgressSink),
        }
    }

    pub fn with_progress_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(sink);
        self
    }

    /// The underlying relay connection, for building a
    /// [`KeygenRequest`]/[`KeyImportRequest`]/[`KeysignRequest`].
    pub fn relay(&self) -> &RelayClient<H> {
        &self.relay
    }

    /// The progress sink installed via [`Self::with_progress_sink`], or the
    /// default no-op sink.
    pub fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }

    #[instrument(skip_all)]
    pub async fn keygen<Ecdsa, Eddsa, FE, FD>(
        &self,
        request: KeygenRequest<'_, H, FE, FD>,
    ) -> Result<KeygenOutcome>
    where
        Ecdsa: Scheme<Output = KeygenOutput>,
        Eddsa: Scheme<Output = KeygenOutput>,
        FE: Fn(&CeremonyParams) -> Result<Ecdsa>,
        FD: Fn(&CeremonyParams) -> Result<Eddsa>,
    {
        vultisig_orchestrator::keygen(request).await
    }

    #[instrument(skip_all)]
    pub async fn key_import<Ecdsa, Eddsa, FE, FD>(
        &self,
        request: KeyImportRequest<'_, H, FE, FD>,
    ) -> Result<KeygenOutcome>
    where
        Ecdsa: Scheme<Output = KeygenOutput>,
        Eddsa: Scheme<Output = KeygenOutput>,
        FE: Fn(&CeremonyParams) -> Result<Ecdsa>,
        FD: Fn(&CeremonyParams) -> Result<Eddsa>,
    {
        vultisig_orchestrator::key_import(request).await
    }

    #[instrument(skip_all)]
    pub async fn keysign<S, F>(&self, request: KeysignRequest<'_, H, F>) -> Result<Vec<SignatureBundle>>
    where
        S: Scheme<Output = RawSignature>,
        F: Fn(&CeremonyParams) -> Result<S>,
    {
        vultisig_orchestrator::keysign(request).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.relay.ping().await
    }
}
