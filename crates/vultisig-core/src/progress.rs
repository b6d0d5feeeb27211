//! Ceremony progress events (spec §9 "Dynamic progress events").
//!
//! The source emits heterogeneous progress objects; here they are a single
//! tagged union published through a narrow sink trait, in the style of the
//! small per-concern effect traits in `aura-core::effects` — a trait with a
//! no-op default implementation so callers that don't care about progress
//! don't have to wire anything up.

use crate::errors::VultisigError;
use serde::{Deserialize, Serialize};

/// Which DKLS/Schnorr scheme a `Keygen`/`Signing` event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemeKind {
    Ecdsa,
    Eddsa,
}

/// Tagged union of ceremony stages (spec §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    Initializing,
    GeneratingQr,
    WaitingForDevices { joined: usize, required: usize },
    Keygen { scheme: SchemeKind },
    Signing { index: usize, total: usize },
    Finalizing,
    Complete,
    Error { kind: String },
}

impl ProgressEvent {
    pub fn error(err: &VultisigError) -> Self {
        Self::Error {
            kind: err.category().to_string(),
        }
    }
}

/// Publishes progress events. Advisory only: a failure to emit must never
/// fail the ceremony, and the sink may not be called at all on failure
/// paths other than the final `Error` event (spec §7 policy).
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Default sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Channel-backed sink for callers that want to observe progress from
/// another task (e.g. to drive a UI).
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: tokio::sync::mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        // A closed receiver means nobody is listening anymore; dropping the
        // event is correct since progress is advisory.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers_events_in_order() {
        let (sink, mut rx) = ChannelProgressSink::new();
        sink.emit(ProgressEvent::Initializing);
        sink.emit(ProgressEvent::WaitingForDevices {
            joined: 1,
            required: 3,
        });
        assert_eq!(rx.recv().await, Some(ProgressEvent::Initializing));
        assert_eq!(
            rx.recv().await,
            Some(ProgressEvent::WaitingForDevices {
                joined: 1,
                required: 3
            })
        );
    }

    #[test]
    fn null_sink_never_panics() {
        let sink = NullProgressSink;
        sink.emit(ProgressEvent::Complete);
    }
}
