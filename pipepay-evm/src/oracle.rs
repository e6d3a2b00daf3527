//! Route oracle backed by an on-chain Uniswap V2 style router.
//!
//! The router is only asked to *price* a fixed set of candidate paths: the
//! direct pair and the hop through the wrapped native currency. Whichever
//! candidate needs the least input (exact output) or yields the most output
//! (exact input) wins. Candidates the router cannot price, because a pair does
//! not exist or lacks liquidity, are skipped.

use std::fmt;

use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use pipepay::purchase::{OracleError, Protocol, Route, RouteOracle, RouteRequest, TradeType};
use tracing::debug;

use crate::contract::IUniswapV2Router02;
use crate::error::Eip155Error;

/// Prices candidate paths on a V2 router.
pub struct V2RouterOracle<P> {
    provider: P,
    router: Address,
    wrapped_native: Address,
}

impl<P> fmt::Debug for V2RouterOracle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("V2RouterOracle")
            .field("router", &self.router)
            .field("wrapped_native", &self.wrapped_native)
            .finish_non_exhaustive()
    }
}

impl<P: Provider> V2RouterOracle<P> {
    /// Creates an oracle over the router at `router`.
    pub const fn new(provider: P, router: Address, wrapped_native: Address) -> Self {
        Self {
            provider,
            router,
            wrapped_native,
        }
    }

    /// Candidate paths from `quote_token` to `amount_token`.
    fn candidates(&self, request: &RouteRequest) -> Vec<Vec<Address>> {
        let (from, to) = (request.quote_token, request.amount_token);
        let mut paths = vec![vec![from, to]];
        if from != self.wrapped_native && to != self.wrapped_native {
            paths.push(vec![from, self.wrapped_native, to]);
        }
        paths
    }

    /// Prices one path; `Ok(None)` when the router reverts on it.
    async fn price(
        &self,
        trade_type: TradeType,
        amount: U256,
        path: Vec<Address>,
    ) -> Result<Option<U256>, Eip155Error> {
        let router = IUniswapV2Router02::new(self.router, &self.provider);
        let result = match trade_type {
            TradeType::ExactOutput => router
                .getAmountsIn(amount, path)
                .call()
                .await
                .map(|amounts| amounts.first().copied()),
            TradeType::ExactInput => router
                .getAmountsOut(amount, path)
                .call()
                .await
                .map(|amounts| amounts.last().copied()),
        };
        match result.map_err(Eip155Error::from) {
            Ok(quote) => Ok(quote),
            Err(e) if e.is_revert() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<P: Provider> RouteOracle for V2RouterOracle<P> {
    async fn find_route(&self, request: &RouteRequest) -> Result<Option<Route>, OracleError> {
        if !request.protocols.contains(&Protocol::V2) {
            return Ok(None);
        }
        let mut best: Option<Route> = None;
        for path in self.candidates(request) {
            let Some(quote) = self
                .price(request.trade_type, request.amount, path.clone())
                .await
                .map_err(OracleError::new)?
            else {
                debug!(?path, "Router cannot price path");
                continue;
            };
            let better = best.as_ref().and_then(|b| b.quote).is_none_or(|current| {
                match request.trade_type {
                    TradeType::ExactOutput => quote < current,
                    TradeType::ExactInput => quote > current,
                }
            });
            if better {
                best = Some(Route {
                    token_path: path,
                    quote: Some(quote),
                });
            }
        }
        debug!(route = ?best.as_ref().map(|r| &r.token_path), "Router route lookup finished");
        Ok(best)
    }
}
