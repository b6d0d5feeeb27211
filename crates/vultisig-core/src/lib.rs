//! Shared data model, error taxonomy, and external-collaborator traits for
//! the Vultisig MPC session coordinator.

pub mod cancel;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod progress;
pub mod time;
pub mod vault;

pub use cancel::CancelToken;
pub use config::{DriverConfig, OrchestratorConfig, RelayConfig};
pub use errors::{Result, VultisigError};
pub use identifiers::{PartyId, SessionDescriptor, FAST_VAULT_PARTY_PREFIX};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressEvent, ProgressSink, SchemeKind};
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use vault::{KeyShares, LibType, PublicKeys, Vault};

/// Convenience re-export bundle, mirroring `aura_core::prelude`.
pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::errors::{Result, VultisigError};
    pub use crate::identifiers::{PartyId, SessionDescriptor};
    pub use crate::progress::{ProgressEvent, ProgressSink};
    pub use crate::vault::Vault;
}
