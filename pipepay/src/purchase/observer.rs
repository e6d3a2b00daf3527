//! Purchase lifecycle states and the observer notified of them.
//!
//! The flow never emits process-wide events. Callers that want to follow a
//! purchase (progress bars, audit logs, metrics) inject a [`PurchaseObserver`]
//! and receive every state transition plus every non-fatal warning.

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// State of one in-flight purchase.
///
/// Transitions run strictly forward. Any failure moves to [`Failed`](Self::Failed),
/// which is terminal; the caller decides whether to start a new flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseState {
    /// The payment token was resolved against the registry.
    TokenResolved,
    /// The purchase contract may spend the token.
    Approved,
    /// The job service created the execution and returned a price quote.
    Quoted,
    /// A swap route was found.
    Routed,
    /// A gas limit was chosen.
    GasEstimated,
    /// The payment transaction was broadcast.
    Submitted,
    /// The transaction hash was linked to the remote execution.
    Linked,
    /// The payment transaction has one confirmation.
    Confirmed,
    /// The flow aborted.
    Failed {
        /// Most specific failure reason.
        reason: String,
    },
}

impl PurchaseState {
    /// Returns `true` for states after which no transition happens.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed { .. })
    }

    /// Short machine-friendly state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TokenResolved => "token_resolved",
            Self::Approved => "approved",
            Self::Quoted => "quoted",
            Self::Routed => "routed",
            Self::GasEstimated => "gas_estimated",
            Self::Submitted => "submitted",
            Self::Linked => "linked",
            Self::Confirmed => "confirmed",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Receives purchase progress.
///
/// Both methods default to no-ops. Implementations must not block: they are
/// called inline from the flow.
pub trait PurchaseObserver: Send + Sync {
    /// Called after every state transition of the purchase for `execution_id`.
    ///
    /// `execution_id` is `None` until the job service has issued the quote.
    fn on_transition(&self, _execution_id: Option<&str>, _state: &PurchaseState) {}

    /// Called for non-fatal problems, such as a gas estimation fallback.
    fn on_warning(&self, _execution_id: Option<&str>, _warning: &str) {}
}

impl<T: PurchaseObserver + ?Sized> PurchaseObserver for Arc<T> {
    fn on_transition(&self, execution_id: Option<&str>, state: &PurchaseState) {
        (**self).on_transition(execution_id, state);
    }

    fn on_warning(&self, execution_id: Option<&str>, warning: &str) {
        (**self).on_warning(execution_id, warning);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PurchaseObserver for NoopObserver {}

/// Observer that logs transitions at `info` and warnings at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PurchaseObserver for TracingObserver {
    fn on_transition(&self, execution_id: Option<&str>, state: &PurchaseState) {
        info!(execution_id = execution_id.unwrap_or("-"), %state, "Purchase state changed");
    }

    fn on_warning(&self, execution_id: Option<&str>, warning: &str) {
        warn!(execution_id = execution_id.unwrap_or("-"), %warning, "Purchase warning");
    }
}
