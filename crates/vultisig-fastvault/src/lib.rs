//! Fast-vault client: two-of-two specialization where the second signer is
//! a trusted remote server (C8).

pub mod client;

pub use client::{
    assert_server_only_peers, FastVaultClient, ResendVerificationRequest, SignWithServerRequest,
};
