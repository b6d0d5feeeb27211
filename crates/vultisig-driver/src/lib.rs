//! MPC driver: runs a DKLS or Schnorr scheme through the relay (C6).

pub mod params;
pub mod round;
pub mod scheme;
pub mod signature;

pub use params::{setup_header, CeremonyMode, CeremonyParams};
pub use round::{run_ceremony, start_with_retry};
pub use scheme::{KeygenOutput, OutboundMessage, Recipients, Scheme, StepEffect};
pub use signature::{normalize_recovery_id, EcdsaSignature, EddsaSignature, SignatureBundle};
