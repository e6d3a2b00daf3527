//! Error types for the purchase flow and its collaborators.
//!
//! Each layer owns one error enum:
//!
//! - [`ChainError`] - failures reported by a [`PurchaseChain`](crate::chain::PurchaseChain)
//! - [`RequestError`] - failures reported by a [`Requester`](crate::request::Requester)
//! - [`PurchaseError`] - failures of the purchase flow itself, wrapping the two above

use alloy_primitives::TxHash;
use std::time::Duration;

/// Errors reported by the chain collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The call or transaction reverted on-chain.
    #[error("execution reverted{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Revert {
        /// Revert reason decoded from the chain response, if any.
        reason: Option<String>,
    },
    /// RPC transport failure (connection, rate limit, malformed response).
    #[error("transport error: {0}")]
    Transport(String),
    /// A contract response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Waiting for a confirmation exceeded the configured bound.
    #[error("transaction {tx_hash} not confirmed after {after:?}")]
    Timeout {
        /// Hash of the transaction that was being watched.
        tx_hash: TxHash,
        /// How long the wait lasted.
        after: Duration,
    },
}

impl ChainError {
    /// Returns the most specific human-readable reason available.
    ///
    /// A chain-provided revert string wins over the generic message.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Revert {
                reason: Some(reason),
            } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Returns `true` if the chain rejected the call with a revert.
    #[must_use]
    pub const fn is_revert(&self) -> bool {
        matches!(self, Self::Revert { .. })
    }
}

/// Errors reported by the remote job service transport.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The service signalled that the session token expired.
    #[error("Session is expired")]
    SessionExpired,
    /// The service answered with an error envelope.
    #[error("{message}")]
    Remote {
        /// Message supplied by the service.
        message: String,
    },
    /// The request could not be delivered or the response could not be read.
    #[error("Failed to fetch {url}: {message}")]
    Http {
        /// Target URL.
        url: String,
        /// Underlying failure.
        message: String,
    },
    /// The service answered with an unexpected HTTP status.
    #[error("Unexpected HTTP status {status} from {url}: {body}")]
    HttpStatus {
        /// Target URL.
        url: String,
        /// Numeric HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// The response payload did not have the expected shape.
    #[error("Failed to decode response from {context}: {source}")]
    Decode {
        /// Endpoint the payload came from.
        context: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The authentication handshake failed.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// A request URL could not be built.
    #[error("invalid url: {0}")]
    Url(String),
}

/// Errors of the purchase flow.
///
/// Token resolution, approval, routing and submission failures abort the flow
/// immediately. Gas estimation failures never surface here; they are recovered
/// into a fallback limit plus a warning.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    /// The purchase contract has no registry entry for the token name.
    #[error("token '{0}' is not registered with the purchase contract")]
    TokenNotFound(String),
    /// The approval transaction was not accepted by the chain.
    #[error("failed to approve {token}: {reason}")]
    ApprovalFailed {
        /// Token name being approved.
        token: String,
        /// Most specific failure reason.
        reason: String,
    },
    /// The route oracle itself failed.
    #[error("route oracle failed: {0}")]
    RoutingFailed(String),
    /// The route oracle found no market for the token.
    #[error("no swap route found for token {0}")]
    NoRouteFound(String),
    /// The payment transaction was rejected or not returned by the chain.
    #[error("purchase rejected: {0}")]
    PurchaseRejected(String),
    /// The payment transaction was submitted but not confirmed in time.
    #[error("purchase transaction {tx_hash} not confirmed in time")]
    ConfirmationTimeout {
        /// Hash of the submitted transaction, already linked to the job.
        tx_hash: TxHash,
    },
    /// The payment was broadcast but the job service refused to link it.
    ///
    /// The transaction may still be mined; `tx_hash` is what the caller needs
    /// to reconcile it with the execution.
    #[error("purchase transaction {tx_hash} broadcast but not linked to execution {execution_id}: {source}")]
    LinkFailed {
        /// Execution the payment was meant for.
        execution_id: String,
        /// Hash of the broadcast payment transaction.
        tx_hash: TxHash,
        /// Failure reported by the job service.
        #[source]
        source: RequestError,
    },
    /// The quoted price cannot be scaled to on-chain units.
    #[error("invalid price {price}: {reason}")]
    InvalidPrice {
        /// The offending price as quoted.
        price: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// The quote returned by the job service is malformed.
    #[error("invalid quote field {field}: {reason}")]
    InvalidQuote {
        /// Name of the field.
        field: &'static str,
        /// Parse failure.
        reason: String,
    },
    /// The purchase asked for a chain other than the connected one.
    #[error("purchase requested on chain {requested} but connected to chain {connected}")]
    WrongChain {
        /// Chain named in the purchase configuration.
        requested: u64,
        /// Chain the collaborator is connected to.
        connected: u64,
    },
    /// A read-only chain call failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// The remote job service failed.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl PurchaseError {
    /// Hash of a payment that reached the chain before the flow failed.
    #[must_use]
    pub const fn broadcast_tx(&self) -> Option<TxHash> {
        match self {
            Self::LinkFailed { tx_hash, .. } | Self::ConfirmationTimeout { tx_hash } => {
                Some(*tx_hash)
            }
            _ => None,
        }
    }

    /// Returns `true` if the remote session expired during the flow.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Request(RequestError::SessionExpired)
                | Self::LinkFailed {
                    source: RequestError::SessionExpired,
                    ..
                }
        )
    }
}
