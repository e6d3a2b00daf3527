//! The purchase flow: paying on-chain for a remote pipeline execution.
//!
//! Components, leaves first:
//!
//! - [`TokenResolver`] - registry name to [`TokenInfo`]
//! - [`AllowanceManager`] - ERC-20 approval for the purchase contract
//! - [`RoutePlanner`] - platform-token amount and swap path via a [`RouteOracle`]
//! - [`GasEstimator`] - simulated gas with a 20% margin and a fallback
//! - [`PurchaseExecutor`] - submission and bounded confirmation wait
//! - [`PurchaseFlow`] - sequences all of the above around the job service calls
//!
//! Every component borrows its collaborators and keeps no state between calls.

pub mod allowance;
pub mod executor;
pub mod flow;
pub mod gas;
pub mod observer;
pub mod quote;
pub mod route;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use allowance::{Allowance, AllowanceManager, ApprovalOutcome};
pub use executor::{PendingPurchase, PurchaseExecutor};
pub use flow::{PurchaseFlow, PurchaseReceipt};
pub use gas::{GasEstimate, GasEstimator, GasLimit};
pub use observer::{NoopObserver, PurchaseObserver, PurchaseState, TracingObserver};
pub use quote::PurchaseQuote;
pub use route::{
    OracleError, Protocol, Route, RouteOracle, RoutePath, RoutePlanner, RouteRequest, TradeType,
};
pub use token::{TokenInfo, TokenKind, TokenResolver};
