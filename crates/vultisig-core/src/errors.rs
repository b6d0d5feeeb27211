//! Unified error taxonomy for the MPC session coordinator.
//!
//! A single flat enum rather than a hierarchy of per-component error types:
//! every caller-visible failure collapses into one of the kinds in spec §7.

use serde::{Deserialize, Serialize};

/// Unified error type for all coordinator operations.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum VultisigError {
    /// Network or relay HTTP failure, surfaced after the retry budget is exhausted.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// Deadline exceeded while waiting for peers, setup, messages, or completion.
    #[error("timeout: {message}")]
    Timeout {
        /// Description of what was being waited for.
        message: String,
    },

    /// The underlying DKLS/Schnorr primitive rejected a message or produced
    /// an invalid final state. Never retried.
    #[error("cryptographic error: {message}")]
    Cryptographic {
        /// Description of the cryptographic failure.
        message: String,
    },

    /// Relay returned a malformed payload, acked an unknown hash, or the
    /// participant set was inconsistent.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Bad threshold, empty mnemonic, unknown chain, devices < 2, threshold > devices, etc.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },

    /// Vault decryption AEAD tag failure, or no password given for an encrypted vault.
    #[error("invalid password")]
    InvalidPassword,

    /// Cooperative cancellation via the caller's cancellation token.
    #[error("cancelled")]
    Cancelled,

    /// A fast-vault was created but its email verification code has not yet
    /// been consumed; the unverified vault must not be persisted.
    #[error("verification pending for vault {vault_id}")]
    VerificationPending {
        /// The vault awaiting verification.
        vault_id: String,
    },
}

impl VultisigError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn cryptographic(message: impl Into<String>) -> Self {
        Self::Cryptographic {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Recoverable errors are retried inside the relay client and driver
    /// within a bounded budget; everything else propagates to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Cryptographic { .. } => "cryptographic",
            Self::Protocol { .. } => "protocol",
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvalidPassword => "invalid_password",
            Self::Cancelled => "cancelled",
            Self::VerificationPending { .. } => "verification_pending",
        }
    }
}

/// Standard Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, VultisigError>;

impl From<serde_json::Error> for VultisigError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(format!("malformed JSON: {}", err))
    }
}

impl From<std::io::Error> for VultisigError {
    fn from(err: std::io::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<hex::FromHexError> for VultisigError {
    fn from(err: hex::FromHexError) -> Self {
        Self::invalid_input(format!("invalid hex: {}", err))
    }
}

impl From<base64::DecodeError> for VultisigError {
    fn from(err: base64::DecodeError) -> Self {
        Self::protocol(format!("invalid base64: {}", err))
    }
}

impl From<reqwest::Error> for VultisigError {
    fn from(err: reqwest::Error) -> Self {
        // Malformed response bodies won't improve on retry; everything else
        // (connect failures, timeouts, request construction) is transport.
        if err.is_decode() {
            Self::protocol(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<bip39::Error> for VultisigError {
    fn from(err: bip39::Error) -> Self {
        Self::invalid_input(format!("invalid mnemonic: {}", err))
    }
}

impl From<bip32::Error> for VultisigError {
    fn from(err: bip32::Error) -> Self {
        Self::cryptographic(format!("BIP-32 derivation failed: {}", err))
    }
}

impl From<toml::de::Error> for VultisigError {
    fn from(err: toml::de::Error) -> Self {
        Self::protocol(format!("invalid config TOML: {}", err))
    }
}

impl From<toml::ser::Error> for VultisigError {
    fn from(err: toml::ser::Error) -> Self {
        Self::protocol(format!("failed to serialize config: {}", err))
    }
}
