//! Submission and confirmation of the payment transaction.

use alloy_primitives::TxHash;
use std::time::Duration;
use tracing::{debug, info};

use crate::chain::{Confirmation, PurchaseChain};
use crate::error::{ChainError, PurchaseError};
use crate::purchase::gas::GasLimit;
use crate::purchase::quote::PurchaseQuote;
use crate::purchase::route::RoutePath;
use crate::purchase::token::TokenInfo;

/// A broadcast but unconfirmed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPurchase {
    /// Hash of the payment transaction.
    pub tx_hash: TxHash,
    /// Gas limit it was sent with.
    pub gas_limit: GasLimit,
}

/// Sends the payment transaction and waits for it.
#[derive(Debug)]
pub struct PurchaseExecutor<'a, C> {
    chain: &'a C,
}

impl<'a, C: PurchaseChain> PurchaseExecutor<'a, C> {
    /// Creates an executor over `chain`.
    pub const fn new(chain: &'a C) -> Self {
        Self { chain }
    }

    /// Broadcasts the purchase on the entry point matching `token`.
    ///
    /// The caller links the returned hash to the job record and then calls
    /// [`confirm`](Self::confirm).
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::NoRouteFound`] for an empty route without
    /// sending anything, and [`PurchaseError::PurchaseRejected`] if the chain
    /// refuses the transaction or hands back no hash.
    pub async fn execute(
        &self,
        quote: &PurchaseQuote,
        token: &TokenInfo,
        route: &RoutePath,
        gas_limit: GasLimit,
    ) -> Result<PendingPurchase, PurchaseError> {
        if route.is_empty() {
            return Err(PurchaseError::NoRouteFound(token.name.clone()));
        }
        let call = quote.to_call(token, route)?;
        debug!(method = ?call.method, hops = route.len(), "Submitting purchase");

        let tx_hash = self
            .chain
            .submit_purchase(&call, gas_limit.get())
            .await
            .map_err(|e| PurchaseError::PurchaseRejected(e.reason()))?
            .ok_or_else(|| PurchaseError::PurchaseRejected("no transaction returned".into()))?;

        info!(
            tx = %tx_hash,
            %gas_limit,
            route_len = route.len(),
            execution_id = %quote.execution_id,
            "Submitted purchase transaction"
        );
        Ok(PendingPurchase { tx_hash, gas_limit })
    }

    /// Waits up to `timeout` for one confirmation of `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::PurchaseRejected`] if the transaction reverted,
    /// [`PurchaseError::ConfirmationTimeout`] if it was not mined in time and
    /// [`PurchaseError::Chain`] for any other chain failure.
    pub async fn confirm(
        &self,
        pending: &PendingPurchase,
        timeout: Duration,
    ) -> Result<Confirmation, PurchaseError> {
        let confirmation = self
            .chain
            .wait_for_confirmation(pending.tx_hash, timeout)
            .await
            .map_err(|e| match e {
                ChainError::Timeout { tx_hash, .. } => PurchaseError::ConfirmationTimeout { tx_hash },
                ChainError::Revert { .. } => PurchaseError::PurchaseRejected(e.reason()),
                other => PurchaseError::Chain(other),
            })?;
        if !confirmation.success {
            return Err(PurchaseError::PurchaseRejected(format!(
                "transaction {} reverted",
                pending.tx_hash
            )));
        }
        info!(tx = %pending.tx_hash, block = ?confirmation.block_number, "Purchase confirmed");
        Ok(confirmation)
    }
}
