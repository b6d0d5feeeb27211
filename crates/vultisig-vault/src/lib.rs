//! Vault container codec: the on-disk `.vult` backup format (C4).

pub mod container;

pub use container::{decode, encode};
pub use vultisig_core::vault::Vault;
