//! Error types for EIP-155 chain operations.

use alloy_provider::{PendingTransactionError, WatchTxError};
use alloy_transport::TransportError;
use pipepay::ChainError;

/// Errors raised while talking to an EVM node.
#[derive(Debug, thiserror::Error)]
pub enum Eip155Error {
    /// The call or transaction reverted; carries the decoded reason if any.
    #[error("execution reverted{}", .0.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Revert(Option<String>),
    /// RPC transport error.
    #[error(transparent)]
    Transport(TransportError),
    /// Pending transaction error.
    #[error(transparent)]
    PendingTransaction(PendingTransactionError),
    /// Contract call failed before reaching the node (ABI, unknown function).
    #[error("Contract call failed: {0}")]
    ContractCall(String),
}

impl Eip155Error {
    /// Returns `true` if the node rejected the call with a revert.
    #[must_use]
    pub const fn is_revert(&self) -> bool {
        matches!(self, Self::Revert(_))
    }
}

impl From<TransportError> for Eip155Error {
    fn from(e: TransportError) -> Self {
        match revert_reason(&e) {
            Some(reason) => Self::Revert(reason),
            None => Self::Transport(e),
        }
    }
}

impl From<PendingTransactionError> for Eip155Error {
    fn from(e: PendingTransactionError) -> Self {
        match e {
            PendingTransactionError::TransportError(e) => e.into(),
            other => Self::PendingTransaction(other),
        }
    }
}

impl From<alloy_contract::Error> for Eip155Error {
    fn from(e: alloy_contract::Error) -> Self {
        match e {
            alloy_contract::Error::UnknownFunction(_)
            | alloy_contract::Error::UnknownSelector(_)
            | alloy_contract::Error::NotADeploymentTransaction
            | alloy_contract::Error::ContractNotDeployed
            | alloy_contract::Error::ZeroData(_, _)
            | alloy_contract::Error::AbiError(_) => Self::ContractCall(e.to_string()),
            alloy_contract::Error::TransportError(e) => e.into(),
            alloy_contract::Error::PendingTransactionError(e) => e.into(),
        }
    }
}

impl From<Eip155Error> for ChainError {
    fn from(e: Eip155Error) -> Self {
        match e {
            Eip155Error::Revert(reason) => Self::Revert { reason },
            Eip155Error::Transport(e) => Self::Transport(e.to_string()),
            Eip155Error::PendingTransaction(e) => Self::Transport(e.to_string()),
            Eip155Error::ContractCall(message) => Self::Decode(message),
        }
    }
}

/// Returns whether a pending-transaction error is a watch timeout.
pub(crate) fn is_watch_timeout(e: &PendingTransactionError) -> bool {
    matches!(e, PendingTransactionError::TxWatcher(WatchTxError::Timeout))
}

/// Classifies a transport error as a revert.
///
/// Returns `Some(reason)` for reverts (the inner `Option` is the decoded
/// reason, if the node provided one) and `None` for any other failure.
#[allow(clippy::option_option)]
fn revert_reason(e: &TransportError) -> Option<Option<String>> {
    let payload = e.as_error_resp()?;
    if let Some(data) = payload.as_revert_data() {
        return Some(decode_revert_data(&data));
    }
    reason_from_message(&payload.message)
}

/// Decodes ABI revert data (`Error(string)`, `Panic(uint256)`) into a reason.
fn decode_revert_data(data: &[u8]) -> Option<String> {
    let reason = alloy_sol_types::decode_revert_reason(data)?;
    Some(match reason.strip_prefix("revert: ") {
        Some(stripped) => stripped.to_owned(),
        None => reason,
    })
}

/// Extracts the reason from an `"execution reverted[: reason]"` node message.
#[allow(clippy::option_option)]
fn reason_from_message(message: &str) -> Option<Option<String>> {
    let rest = message.strip_prefix("execution reverted")?;
    let reason = rest.trim_start_matches(':').trim();
    Some((!reason.is_empty()).then(|| reason.to_owned()))
}
