//! ERC-20 allowance management for the purchase contract.

use alloy_primitives::{Address, TxHash, U256};
use tracing::{debug, info};

use crate::chain::PurchaseChain;
use crate::config::PurchaseSettings;
use crate::error::{ChainError, PurchaseError};
use crate::purchase::token::TokenInfo;

/// Whole tokens granted by a fresh approval, before decimal scaling.
pub const APPROVAL_WHOLE_TOKENS: u64 = 999_999_999_999;

/// Allowance of `owner` for `spender` on one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    /// Token holder.
    pub owner: Address,
    /// Purchase contract.
    pub spender: Address,
    /// Approved amount in token units.
    pub amount: U256,
}

/// What [`AllowanceManager::ensure_approved`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Native currency needs no approval.
    NotRequired,
    /// A non-zero allowance already existed.
    AlreadyApproved(Allowance),
    /// A new approval was submitted and confirmed.
    Approved {
        /// Approval transaction.
        tx_hash: TxHash,
        /// Amount approved.
        amount: U256,
    },
}

/// Returns the approval amount for a token with `decimals` decimals.
///
/// Saturates at `U256::MAX` for decimal counts whose scaled amount does not
/// fit in 256 bits.
#[must_use]
pub fn approval_amount(decimals: u8) -> U256 {
    U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .and_then(|factor| U256::from(APPROVAL_WHOLE_TOKENS).checked_mul(factor))
        .unwrap_or(U256::MAX)
}

/// Checks and raises the payer's allowance for the purchase contract.
///
/// Any non-zero allowance is accepted, even one smaller than the purchase
/// price: a single near-unlimited approval is expected to cover every later
/// purchase. A stale partial allowance therefore passes the check and the
/// purchase itself reverts.
#[derive(Debug)]
pub struct AllowanceManager<'a, C> {
    chain: &'a C,
    settings: &'a PurchaseSettings,
}

impl<'a, C: PurchaseChain> AllowanceManager<'a, C> {
    /// Creates a manager over `chain`.
    pub const fn new(chain: &'a C, settings: &'a PurchaseSettings) -> Self {
        Self { chain, settings }
    }

    /// Reads the current allowance of `owner` for the purchase contract.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::Chain`] if the read fails.
    pub async fn current(&self, token: &TokenInfo, owner: Address) -> Result<Allowance, PurchaseError> {
        let amount = self.chain.allowance(token.address, owner).await?;
        Ok(Allowance {
            owner,
            spender: self.chain.purchase_contract(),
            amount,
        })
    }

    /// Makes sure the purchase contract may spend `token` on behalf of `payer`.
    ///
    /// Blocks until a newly submitted approval has one confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::ApprovalFailed`] if the chain returns no
    /// transaction, rejects it, or the approval reverts, and
    /// [`PurchaseError::ConfirmationTimeout`] if it is not confirmed in time.
    pub async fn ensure_approved(
        &self,
        token: &TokenInfo,
        payer: Address,
    ) -> Result<ApprovalOutcome, PurchaseError> {
        if token.is_native_currency() {
            return Ok(ApprovalOutcome::NotRequired);
        }

        let allowance = self.current(token, payer).await?;
        if allowance.amount > U256::ZERO {
            debug!(token = %token.name, amount = %allowance.amount, "Allowance already granted");
            return Ok(ApprovalOutcome::AlreadyApproved(allowance));
        }

        let amount = approval_amount(token.decimals);
        let failed = |reason: String| PurchaseError::ApprovalFailed {
            token: token.name.clone(),
            reason,
        };
        let tx_hash = self
            .chain
            .approve(token.address, amount)
            .await
            .map_err(|e| failed(e.reason()))?
            .ok_or_else(|| failed("Failed to approve".into()))?;
        info!(token = %token.name, tx = %tx_hash, "Submitted approval");

        let confirmation = self
            .chain
            .wait_for_confirmation(tx_hash, self.settings.confirmation_timeout)
            .await
            .map_err(|e| match e {
                ChainError::Timeout { tx_hash, .. } => {
                    PurchaseError::ConfirmationTimeout { tx_hash }
                }
                other => failed(other.reason()),
            })?;
        if !confirmation.success {
            return Err(failed(format!("approval {tx_hash} reverted")));
        }
        Ok(ApprovalOutcome::Approved { tx_hash, amount })
    }
}
