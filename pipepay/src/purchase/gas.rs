//! Best-effort gas estimation for the purchase transaction.

use std::fmt;
use tracing::warn;

use crate::chain::PurchaseChain;
use crate::purchase::quote::PurchaseQuote;
use crate::purchase::route::RoutePath;
use crate::purchase::token::TokenInfo;

/// Raw estimate assumed when simulation fails.
pub const FALLBACK_GAS_ESTIMATE: u64 = 3_000_000;

/// Safety margin applied to every estimate, in percent.
pub const GAS_MARGIN_PERCENT: u64 = 120;

/// Gas limit for the purchase transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GasLimit(u64);

impl GasLimit {
    /// Applies the safety margin to a raw estimate, truncating.
    #[must_use]
    pub const fn from_estimate(raw: u64) -> Self {
        Self(raw.saturating_mul(GAS_MARGIN_PERCENT) / 100)
    }

    /// The limit used when simulation fails.
    #[must_use]
    pub const fn fallback() -> Self {
        Self::from_estimate(FALLBACK_GAS_ESTIMATE)
    }

    /// Returns the limit as a plain integer.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GasLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a gas estimation: always a usable limit, plus a warning when the
/// limit is the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    /// Limit to send the transaction with.
    pub limit: GasLimit,
    /// Why the fallback was used, if it was.
    pub warning: Option<String>,
}

/// Simulates the purchase to size its gas limit.
#[derive(Debug)]
pub struct GasEstimator<'a, C> {
    chain: &'a C,
}

impl<'a, C: PurchaseChain> GasEstimator<'a, C> {
    /// Creates an estimator over `chain`.
    pub const fn new(chain: &'a C) -> Self {
        Self { chain }
    }

    /// Estimates the gas limit of paying `quote` with `token` along `route`.
    ///
    /// Never fails: any simulation problem yields [`GasLimit::fallback`] and a
    /// warning carrying the most specific reason available.
    pub async fn estimate(
        &self,
        quote: &PurchaseQuote,
        token: &TokenInfo,
        route: &RoutePath,
    ) -> GasEstimate {
        if route.is_empty() {
            return Self::fallback("no swap route for purchase".to_owned());
        }
        let call = match quote.to_call(token, route) {
            Ok(call) => call,
            Err(e) => return Self::fallback(e.to_string()),
        };
        match self.chain.estimate_purchase(&call).await {
            Ok(raw) => GasEstimate {
                limit: GasLimit::from_estimate(raw),
                warning: None,
            },
            Err(e) => Self::fallback(e.reason()),
        }
    }

    fn fallback(reason: String) -> GasEstimate {
        let limit = GasLimit::fallback();
        warn!(%limit, %reason, "Gas estimation failed, using fallback limit");
        GasEstimate {
            limit,
            warning: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::PaymentMethod;
    use crate::error::ChainError;
    use crate::purchase::testing::{FakeChain, PLATFORM, WRAPPED, quote, resolve};

    #[test]
    fn margin_truncates() {
        assert_eq!(GasLimit::from_estimate(100_000).get(), 120_000);
        assert_eq!(GasLimit::from_estimate(101).get(), 121);
        assert_eq!(GasLimit::from_estimate(7).get(), 8);
        assert_eq!(GasLimit::fallback().get(), 3_600_000);
    }

    #[tokio::test]
    async fn successful_simulation_is_scaled() {
        let chain = FakeChain::new().with_gas_estimate(210_001);
        let token = resolve(&chain, "SWASH").await;
        let route = RoutePath::direct(PLATFORM);

        let estimate = GasEstimator::new(&chain).estimate(&quote(), &token, &route).await;

        assert_eq!(estimate.limit.get(), 252_001);
        assert_eq!(estimate.warning, None);
        let estimated = chain.estimated_calls();
        assert_eq!(estimated.len(), 1);
        assert!(matches!(estimated[0].method, PaymentMethod::Erc20 { .. }));
    }

    #[tokio::test]
    async fn native_token_simulates_native_entry_point() {
        let chain = FakeChain::new();
        let token = resolve(&chain, "ETH").await;
        let route = RoutePath::new(vec![WRAPPED, PLATFORM]);

        GasEstimator::new(&chain).estimate(&quote(), &token, &route).await;

        assert_eq!(chain.estimated_calls()[0].method, PaymentMethod::Native);
    }

    #[tokio::test]
    async fn failed_simulation_falls_back_with_revert_reason() {
        let chain = FakeChain::new().with_estimate_error(ChainError::Revert {
            reason: Some("Insufficient liquidity".into()),
        });
        let token = resolve(&chain, "SWASH").await;
        let route = RoutePath::direct(PLATFORM);

        let estimate = GasEstimator::new(&chain).estimate(&quote(), &token, &route).await;

        assert_eq!(estimate.limit, GasLimit::fallback());
        assert_eq!(estimate.warning.as_deref(), Some("Insufficient liquidity"));
    }

    #[tokio::test]
    async fn empty_route_is_never_simulated() {
        let chain = FakeChain::new();
        let token = resolve(&chain, "USDC").await;

        let estimate = GasEstimator::new(&chain)
            .estimate(&quote(), &token, &RoutePath::default())
            .await;

        assert_eq!(estimate.limit, GasLimit::fallback());
        assert!(estimate.warning.is_some());
        assert!(chain.estimated_calls().is_empty());
    }
}
