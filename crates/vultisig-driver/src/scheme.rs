//! The opaque DKLS/Schnorr state-machine contract (spec §4.6). The actual
//! cryptographic primitives are an external collaborator; this crate only
//! defines the shape the driver's round loop speaks to.

use vultisig_core::{PartyId, Result};

/// Who an outbound message from one round should be delivered to.
#[derive(Debug, Clone)]
pub enum Recipients {
    /// Every other party in the ceremony.
    AllPeers,
    Parties(Vec<PartyId>),
}

/// One piece of wire traffic a `step` call wants sent.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub to: Recipients,
    pub body: Vec<u8>,
}

/// What a single `step` invocation produced.
pub enum StepEffect<Output> {
    /// The initiator's first `step` call, publishing the one-shot setup blob.
    NeedSetup(Vec<u8>),
    /// Zero or more messages to encrypt and relay this round.
    Send(Vec<OutboundMessage>),
    /// The ceremony finished; this is the scheme-specific final output.
    Done(Output),
}

/// The `done(KeyShare, PublicKey, ChainCode)` payload for keygen and
/// key-import ceremonies (spec §4.6). Keysign's `done` instead yields a
/// [`crate::signature::SignatureBundle`].
#[derive(Debug, Clone)]
pub struct KeygenOutput {
    pub key_share: Vec<u8>,
    pub public_key: Vec<u8>,
    pub chain_code: String,
}

/// A running ceremony instance for one scheme (DKLS or Schnorr), owned
/// exclusively by the driver's round loop. `step` is never re-entered while
/// an earlier call is outstanding (spec §4.6 ordering/concurrency).
pub trait Scheme: Send {
    type Output: Send;

    fn step(&mut self, inbound: Option<&[u8]>) -> Result<StepEffect<Self::Output>>;
}
