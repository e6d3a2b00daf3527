//! Swap route planning.
//!
//! The purchase contract swaps the payer's token into the platform token
//! before paying. [`RoutePlanner`] converts the quoted price into a platform
//! token amount and asks a [`RouteOracle`] for the token path achieving exactly
//! that output.

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::chain::{ChainId, PurchaseChain};
use crate::config::PurchaseSettings;
use crate::error::PurchaseError;
use crate::purchase::quote::scale_price;
use crate::purchase::token::TokenInfo;

/// Ordered token addresses describing the swap hops.
///
/// `[t, t]` is the direct path used when paying in the platform token. An
/// empty path means no market was found and must never reach the contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePath(Vec<Address>);

impl RoutePath {
    /// Creates a path from ordered hop addresses.
    #[must_use]
    pub const fn new(hops: Vec<Address>) -> Self {
        Self(hops)
    }

    /// The degenerate same-token path.
    #[must_use]
    pub fn direct(token: Address) -> Self {
        Self(vec![token, token])
    }

    /// Returns `true` if no route was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` for the degenerate same-token path.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        matches!(self.0.as_slice(), [a, b] if a == b)
    }

    /// Number of addresses in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Hop addresses in order.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.0
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hops: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", hops.join(" -> "))
    }
}

/// Which side of the trade is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeType {
    /// The input amount is fixed.
    ExactInput,
    /// The output amount is fixed.
    ExactOutput,
}

/// Liquidity protocol versions a route may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Constant-product pools (Uniswap V2 and forks).
    V2,
    /// Concentrated-liquidity pools.
    V3,
}

/// Routing question put to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    /// Chain to route on.
    pub chain_id: ChainId,
    /// The fixed amount, denominated in `amount_token`.
    pub amount: U256,
    /// Token the fixed amount is denominated in.
    pub amount_token: Address,
    /// The other side of the trade.
    pub quote_token: Address,
    /// Which side `amount` fixes.
    pub trade_type: TradeType,
    /// Protocols the route may use.
    pub protocols: Vec<Protocol>,
}

/// A route found by the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Tokens along the route, from input to output.
    pub token_path: Vec<Address>,
    /// Quoted amount of the non-fixed side, if the oracle reports it.
    pub quote: Option<U256>,
}

/// Error raised by a route oracle.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct OracleError(pub Box<dyn std::error::Error + Send + Sync>);

impl OracleError {
    /// Wraps any error.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// External swap-routing capability.
pub trait RouteOracle: Send + Sync {
    /// Finds a route, or `None` if no market can fill the trade.
    fn find_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<Option<Route>, OracleError>> + Send;
}

impl<T: RouteOracle> RouteOracle for Arc<T> {
    fn find_route(
        &self,
        request: &RouteRequest,
    ) -> impl Future<Output = Result<Option<Route>, OracleError>> + Send {
        (**self).find_route(request)
    }
}

/// Plans the swap path for a purchase.
#[derive(Debug)]
pub struct RoutePlanner<'a, C, O> {
    chain: &'a C,
    oracle: &'a O,
    settings: &'a PurchaseSettings,
}

impl<'a, C: PurchaseChain, O: RouteOracle> RoutePlanner<'a, C, O> {
    /// Creates a planner over `chain` and `oracle`.
    pub const fn new(chain: &'a C, oracle: &'a O, settings: &'a PurchaseSettings) -> Self {
        Self {
            chain,
            oracle,
            settings,
        }
    }

    /// Plans the route paying `price_in_base_units` with `token`.
    ///
    /// Returns an empty path when the oracle finds no route; callers must
    /// treat that as "no market", not as success.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::RoutingFailed`] if the oracle errors,
    /// [`PurchaseError::InvalidPrice`] if the price cannot be scaled and
    /// [`PurchaseError::Chain`] if the price conversion read fails.
    pub async fn plan_route(
        &self,
        token: &TokenInfo,
        price_in_base_units: Decimal,
    ) -> Result<RoutePath, PurchaseError> {
        let base_units = scale_price(price_in_base_units, token.base_unit_decimals)?;
        let platform_amount = self.chain.price_in_platform_token(base_units).await?;
        debug!(%base_units, %platform_amount, "Converted price to platform token");

        if token.is_platform_token() {
            return Ok(RoutePath::direct(token.address));
        }

        let request = RouteRequest {
            chain_id: token.chain_id,
            amount: platform_amount,
            amount_token: self.settings.platform_token,
            quote_token: token.address,
            trade_type: TradeType::ExactOutput,
            protocols: vec![Protocol::V2],
        };
        let route = self
            .oracle
            .find_route(&request)
            .await
            .map_err(|e| PurchaseError::RoutingFailed(e.to_string()))?;

        let path = route.map_or_else(RoutePath::default, |r| RoutePath::new(r.token_path));
        if path.is_empty() {
            info!(token = %token.name, "Route oracle found no route");
        } else {
            debug!(token = %token.name, route = %path, "Planned swap route");
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase::testing::{
        FakeChain, FakeOracle, ILLIQUID, PLATFORM, USDC, WRAPPED, resolve, settings,
    };
    use std::str::FromStr;

    fn price(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn platform_token_short_circuits_oracle() {
        let chain = FakeChain::new();
        let oracle = FakeOracle::failing("must not be called");
        let settings = settings();
        let token = resolve(&chain, "SWASH").await;

        let path = RoutePlanner::new(&chain, &oracle, &settings)
            .plan_route(&token, price("10.0"))
            .await
            .unwrap();

        assert_eq!(path.addresses(), &[PLATFORM, PLATFORM]);
        assert!(path.is_direct());
        assert!(oracle.requests().is_empty());
    }

    #[tokio::test]
    async fn native_token_routes_through_wrapped_currency() {
        let chain = FakeChain::new();
        let oracle = FakeOracle::with_route(vec![WRAPPED, PLATFORM]);
        let settings = settings();
        let token = resolve(&chain, "ETH").await;

        let path = RoutePlanner::new(&chain, &oracle, &settings)
            .plan_route(&token, price("10.0"))
            .await
            .unwrap();

        assert_eq!(path.addresses(), &[WRAPPED, PLATFORM]);
        let requests = oracle.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.quote_token, WRAPPED);
        assert_eq!(request.amount_token, PLATFORM);
        assert_eq!(request.trade_type, TradeType::ExactOutput);
        assert_eq!(request.protocols, vec![Protocol::V2]);
        // The fake contract prices one base unit at two platform tokens.
        assert_eq!(
            request.amount,
            U256::from(20u64) * U256::from(10u64).pow(U256::from(18u64))
        );
    }

    #[tokio::test]
    async fn missing_route_is_an_empty_path() {
        let chain = FakeChain::new();
        let oracle = FakeOracle::no_route();
        let settings = settings();
        let token = resolve(&chain, "ILLQ").await;
        assert_eq!(token.address, ILLIQUID);

        let path = RoutePlanner::new(&chain, &oracle, &settings)
            .plan_route(&token, price("1"))
            .await
            .unwrap();
        assert!(path.is_empty());
    }

    #[tokio::test]
    async fn oracle_failure_is_routing_failed() {
        let chain = FakeChain::new();
        let oracle = FakeOracle::failing("subgraph unavailable");
        let settings = settings();
        let token = resolve(&chain, "USDC").await;
        assert_eq!(token.address, USDC);

        let err = RoutePlanner::new(&chain, &oracle, &settings)
            .plan_route(&token, price("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::RoutingFailed(msg) if msg == "subgraph unavailable"));
    }

    #[test]
    fn direct_path_display() {
        let path = RoutePath::direct(PLATFORM);
        assert_eq!(path.len(), 2);
        assert!(path.to_string().contains(" -> "));
        assert!(!RoutePath::default().is_direct());
    }
}
