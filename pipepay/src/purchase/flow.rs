//! The paid pipeline start: from job intent to a confirmed, linked payment.
//!
//! [`PurchaseFlow::start`] runs the purchase components in a fixed order:
//!
//! 1. resolve the payment token
//! 2. make sure the purchase contract may spend it
//! 3. create the execution remotely and receive the price quote
//! 4. plan the swap route (an empty route aborts before anything is sent)
//! 5. estimate gas
//! 6. submit the payment
//! 7. link the transaction hash to the execution
//! 8. wait for one confirmation
//!
//! The link happens before the confirmation wait so the job service can
//! reconcile the payment even if this process dies while waiting.
//! A failed link surfaces as [`PurchaseError::LinkFailed`], which still
//! carries the broadcast hash.

use alloy_primitives::TxHash;
use serde::Serialize;
use serde::de::IgnoredAny;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::chain::{ChainId, PurchaseChain};
use crate::config::{PurchaseConfig, PurchaseSettings};
use crate::error::PurchaseError;
use crate::purchase::allowance::{AllowanceManager, ApprovalOutcome};
use crate::purchase::executor::PurchaseExecutor;
use crate::purchase::gas::{GasEstimator, GasLimit};
use crate::purchase::observer::{PurchaseObserver, PurchaseState, TracingObserver};
use crate::purchase::quote::PurchaseQuote;
use crate::purchase::route::{RouteOracle, RoutePath, RoutePlanner};
use crate::purchase::token::TokenResolver;
use crate::request::Requester;

/// Creates the execution and returns its [`PurchaseQuote`].
pub const START_PATH: &str = "pipeline/start";

/// Links a payment transaction to an execution.
pub const LINK_TRANSACTION_PATH: &str = "pipeline/execution/transaction";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartPipeline<'a> {
    pipeline_name: &'a str,
    input_data_file: &'a str,
    network: ChainId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkTransaction<'a> {
    pipeline_name: &'a str,
    execution_id: &'a str,
    tx_hash: TxHash,
}

/// Result of a successful paid start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// Execution created by the job service.
    pub execution_id: String,
    /// Confirmed payment transaction.
    pub tx_hash: TxHash,
    /// Block the payment was included in, if reported.
    pub block_number: Option<u64>,
    /// Gas limit the payment was sent with.
    pub gas_limit: GasLimit,
    /// Swap route handed to the purchase contract.
    pub route: RoutePath,
    /// What the allowance step did.
    pub approval: ApprovalOutcome,
    /// Non-fatal warnings raised along the way.
    pub warnings: Vec<String>,
}

/// Orchestrates a paid pipeline start over a chain and a route oracle.
///
/// Holds no per-purchase state: one flow value may run any number of
/// purchases, concurrently if the collaborators allow it.
pub struct PurchaseFlow<C, O> {
    chain: C,
    oracle: O,
    settings: PurchaseSettings,
    observer: Arc<dyn PurchaseObserver>,
}

impl<C, O> fmt::Debug for PurchaseFlow<C, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurchaseFlow")
            .field("settings", &self.settings)
            .field("observer", &"<PurchaseObserver>")
            .finish_non_exhaustive()
    }
}

impl<C: PurchaseChain, O: RouteOracle> PurchaseFlow<C, O> {
    /// Creates a flow that reports progress through `tracing`.
    pub fn new(chain: C, oracle: O, settings: PurchaseSettings) -> Self {
        Self {
            chain,
            oracle,
            settings,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PurchaseObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the chain collaborator.
    pub const fn chain(&self) -> &C {
        &self.chain
    }

    /// Returns the flow settings.
    pub const fn settings(&self) -> &PurchaseSettings {
        &self.settings
    }

    /// Starts `pipeline_name` on `input_data_file` and pays for it.
    ///
    /// Every transition is reported to the observer; a failure is reported
    /// as [`PurchaseState::Failed`] and then returned. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the [`PurchaseError`] of the first failing step. A
    /// [`PurchaseError::ConfirmationTimeout`] means the payment was broadcast
    /// and linked but not yet mined.
    #[instrument(
        name = "purchase",
        skip_all,
        fields(pipeline = %pipeline_name, token = %config.token_name, chain_id = config.chain_id)
    )]
    pub async fn start<R: Requester>(
        &self,
        requester: &R,
        pipeline_name: &str,
        input_data_file: &str,
        config: &PurchaseConfig,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let mut progress = Progress::new(self.observer.as_ref());
        let result = self
            .run(requester, pipeline_name, input_data_file, config, &mut progress)
            .await;
        if let Err(err) = &result {
            error!(pipeline = %pipeline_name, error = %err, "Purchase failed");
            progress.advance(PurchaseState::Failed {
                reason: err.to_string(),
            });
        }
        result
    }

    async fn run<R: Requester>(
        &self,
        requester: &R,
        pipeline_name: &str,
        input_data_file: &str,
        config: &PurchaseConfig,
        progress: &mut Progress<'_>,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let chain_id = self.chain.chain_id();
        if config.chain_id != chain_id {
            return Err(PurchaseError::WrongChain {
                requested: config.chain_id,
                connected: chain_id,
            });
        }

        let token = TokenResolver::new(&self.chain, &self.settings)
            .resolve(&config.token_name)
            .await?;
        progress.advance(PurchaseState::TokenResolved);

        let approval = AllowanceManager::new(&self.chain, &self.settings)
            .ensure_approved(&token, self.chain.payer())
            .await?;
        progress.advance(PurchaseState::Approved);

        let quote: PurchaseQuote = requester
            .post(
                START_PATH,
                &StartPipeline {
                    pipeline_name,
                    input_data_file,
                    network: chain_id,
                },
            )
            .await?;
        progress.execution_id = Some(quote.execution_id.clone());
        progress.advance(PurchaseState::Quoted);

        let route = RoutePlanner::new(&self.chain, &self.oracle, &self.settings)
            .plan_route(&token, quote.price_in_base_units)
            .await?;
        if route.is_empty() {
            return Err(PurchaseError::NoRouteFound(token.name));
        }
        progress.advance(PurchaseState::Routed);

        let gas = GasEstimator::new(&self.chain)
            .estimate(&quote, &token, &route)
            .await;
        let mut warnings = Vec::new();
        if let Some(warning) = gas.warning {
            progress.warn(&warning);
            warnings.push(warning);
        }
        progress.advance(PurchaseState::GasEstimated);

        let executor = PurchaseExecutor::new(&self.chain);
        let pending = executor
            .execute(&quote, &token, &route, gas.limit)
            .await?;
        progress.advance(PurchaseState::Submitted);

        let _: IgnoredAny = requester
            .put(
                LINK_TRANSACTION_PATH,
                &LinkTransaction {
                    pipeline_name,
                    execution_id: &quote.execution_id,
                    tx_hash: pending.tx_hash,
                },
            )
            .await
            .map_err(|source| PurchaseError::LinkFailed {
                execution_id: quote.execution_id.clone(),
                tx_hash: pending.tx_hash,
                source,
            })?;
        progress.advance(PurchaseState::Linked);

        let confirmation = executor
            .confirm(&pending, self.settings.confirmation_timeout)
            .await?;
        progress.advance(PurchaseState::Confirmed);

        Ok(PurchaseReceipt {
            execution_id: quote.execution_id,
            tx_hash: pending.tx_hash,
            block_number: confirmation.block_number,
            gas_limit: pending.gas_limit,
            route,
            approval,
            warnings,
        })
    }
}

struct Progress<'a> {
    observer: &'a dyn PurchaseObserver,
    execution_id: Option<String>,
}

impl<'a> Progress<'a> {
    fn new(observer: &'a dyn PurchaseObserver) -> Self {
        Self {
            observer,
            execution_id: None,
        }
    }

    fn advance(&self, state: PurchaseState) {
        debug!(execution_id = self.execution_id.as_deref().unwrap_or("-"), %state, "Purchase transition");
        self.observer
            .on_transition(self.execution_id.as_deref(), &state);
    }

    fn warn(&self, warning: &str) {
        self.observer
            .on_warning(self.execution_id.as_deref(), warning);
    }
}
