//! Configuration types for the purchase flow.
//!
//! [`PurchaseSettings`] carries the per-chain addresses the components need and
//! the confirmation timeout. [`PurchaseConfig`] is what a caller passes when
//! starting a paid pipeline execution.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use std::time::Duration;

use crate::chain::ChainId;

/// Default bound on waiting for a single confirmation.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-chain settings of the purchase flow.
///
/// # Example
///
/// ```rust
/// use alloy_primitives::address;
/// use pipepay::config::PurchaseSettings;
///
/// let settings = PurchaseSettings::new(
///     address!("0x0000000000000000000000000000000000000001"),
///     address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
/// );
/// assert_eq!(settings.confirmation_timeout.as_secs(), 120);
/// ```
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSettings {
    /// Address of the platform's own settlement token.
    pub platform_token: Address,
    /// Address of the chain's wrapped native currency.
    pub wrapped_native: Address,
    /// Upper bound on each confirmation wait.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout: Duration,
}

impl PurchaseSettings {
    /// Creates settings with the default confirmation timeout.
    #[must_use]
    pub const fn new(platform_token: Address, wrapped_native: Address) -> Self {
        Self {
            platform_token,
            wrapped_native,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    /// Overrides the confirmation timeout.
    #[must_use]
    pub const fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}

const fn default_confirmation_timeout() -> Duration {
    DEFAULT_CONFIRMATION_TIMEOUT
}

/// Payment choice for one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseConfig {
    /// Registry name of the token to pay with.
    pub token_name: String,
    /// Chain to pay on.
    pub chain_id: ChainId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn settings_deserialize_with_default_timeout() {
        let json = serde_json::json!({
            "platformToken": "0x0000000000000000000000000000000000000001",
            "wrappedNative": "0x0000000000000000000000000000000000000002",
        });
        let settings: PurchaseSettings = serde_json::from_value(json).unwrap();
        assert_eq!(
            settings.platform_token,
            address!("0x0000000000000000000000000000000000000001")
        );
        assert_eq!(settings.confirmation_timeout, DEFAULT_CONFIRMATION_TIMEOUT);
    }

    #[test]
    fn settings_timeout_is_seconds() {
        let json = serde_json::json!({
            "platformToken": "0x0000000000000000000000000000000000000001",
            "wrappedNative": "0x0000000000000000000000000000000000000002",
            "confirmationTimeout": 15,
        });
        let settings: PurchaseSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.confirmation_timeout, Duration::from_secs(15));
    }

    #[test]
    fn settings_serialize_timeout_as_whole_seconds() {
        let settings = PurchaseSettings::new(Address::ZERO, Address::ZERO)
            .with_confirmation_timeout(Duration::from_secs(45));
        let json = serde_json::to_value(settings).unwrap();
        assert_eq!(json["confirmationTimeout"], 45);
    }
}
