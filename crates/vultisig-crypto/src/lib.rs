//! Encrypted frame codec (C2), LZMA archive codec (C3), and BIP-39/BIP-32
//! master key derivation (C10).

pub mod archive;
pub mod frame;
pub mod keyderiv;

pub use keyderiv::{derive_master_key, MasterKey};
