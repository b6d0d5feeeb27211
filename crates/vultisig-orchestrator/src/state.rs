//! Ceremony lifecycle state machine (spec §4.7 "State machines").

use vultisig_core::VultisigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyState {
    Idle,
    PairingReady,
    QuorumReached,
    RunningEcdsa,
    /// Keygen and key-import only; keysign never visits this state.
    RunningEddsa,
    AwaitingCompletionAck,
    Complete,
    Failed(String),
    Aborted,
}

impl CeremonyState {
    /// Whether `next` is a legal transition from `self` (spec §4.7 diagram).
    /// `Failed` is reachable from any running state; `Aborted` from any
    /// state at all, on external cancellation.
    pub fn can_transition_to(&self, next: &CeremonyState) -> bool {
        use CeremonyState::*;

        if matches!(next, Aborted) {
            return true;
        }
        match (self, next) {
            (Idle, PairingReady) => true,
            (Idle, Aborted) => true,
            (PairingReady, QuorumReached) => true,
            (QuorumReached, RunningEcdsa) => true,
            (RunningEcdsa, RunningEddsa) => true,
            (RunningEcdsa, AwaitingCompletionAck) => true,
            (RunningEddsa, AwaitingCompletionAck) => true,
            (AwaitingCompletionAck, Complete) => true,
            (RunningEcdsa, Failed(_)) => true,
            (RunningEddsa, Failed(_)) => true,
            (AwaitingCompletionAck, Failed(_)) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed(_) | Self::Aborted)
    }
}

/// A small guard used by orchestrator flows to advance `CeremonyState` and
/// reject illegal jumps rather than silently clobbering it.
#[derive(Debug)]
pub struct CeremonyTracker {
    state: CeremonyState,
}

impl CeremonyTracker {
    pub fn new() -> Self {
        Self {
            state: CeremonyState::Idle,
        }
    }

    pub fn state(&self) -> &CeremonyState {
        &self.state
    }

    pub fn advance(&mut self, next: CeremonyState) -> vultisig_core::Result<()> {
        if self.state.can_transition_to(&next) {
            self.state = next;
            Ok(())
        } else {
            Err(VultisigError::protocol(format!(
                "illegal ceremony transition {:?} -> {:?}",
                self.state, next
            )))
        }
    }
}

impl Default for CeremonyTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_keygen_transitions() {
        let mut tracker = CeremonyTracker::new();
        tracker.advance(CeremonyState::PairingReady).unwrap();
        tracker.advance(CeremonyState::QuorumReached).unwrap();
        tracker.advance(CeremonyState::RunningEcdsa).unwrap();
        tracker.advance(CeremonyState::RunningEddsa).unwrap();
        tracker.advance(CeremonyState::AwaitingCompletionAck).unwrap();
        tracker.advance(CeremonyState::Complete).unwrap();
        assert_eq!(tracker.state(), &CeremonyState::Complete);
    }

    #[test]
    fn keysign_skips_eddsa_state() {
        let mut tracker = CeremonyTracker::new();
        tracker.advance(CeremonyState::PairingReady).unwrap();
        tracker.advance(CeremonyState::QuorumReached).unwrap();
        tracker.advance(CeremonyState::RunningEcdsa).unwrap();
        tracker.advance(CeremonyState::AwaitingCompletionAck).unwrap();
        tracker.advance(CeremonyState::Complete).unwrap();
        assert_eq!(tracker.state(), &CeremonyState::Complete);
    }

    #[test]
    fn cancellation_aborts_from_any_state() {
        let mut tracker = CeremonyTracker::new();
        tracker.advance(CeremonyState::PairingReady).unwrap();
        tracker.advance(CeremonyState::Aborted).unwrap();
        assert!(tracker.state().is_terminal());
    }

    #[test]
    fn rejects_skipping_quorum() {
        let mut tracker = CeremonyTracker::new();
        assert!(tracker.advance(CeremonyState::RunningEcdsa).is_err());
    }
}
