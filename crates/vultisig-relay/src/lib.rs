//! Relay client: HTTP-level session lifecycle against the stateless relay (C1).

pub mod client;
pub mod message;
pub mod retry;

pub use client::{HttpRelay, RelayClient, RelayClientConfig, RelayHttp};
pub use message::RelayMessage;
pub use retry::{poll_until, retry_transport, PollBackoff};
