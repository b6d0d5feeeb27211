//! Ceremony orchestrator: threshold policy, lifecycle state machine, and the
//! three end-user operations `keygen`, `keyImport`, `keysign` (C7).

pub mod key_import;
pub mod keygen;
pub mod keysign;
pub mod state;
pub mod threshold;

pub use key_import::{key_import, KeyImportRequest};
pub use keygen::{keygen, KeygenOutcome, KeygenRequest};
pub use keysign::{keysign, KeysignRequest, RawSignature};
pub use state::{CeremonyState, CeremonyTracker};
pub use threshold::{default_threshold, resolve_threshold, threshold_for_vault};
