//! Chain capability consumed by the purchase flow.
//!
//! The purchase components never talk to an RPC node directly. They go through
//! [`PurchaseChain`], which bundles the handful of reads and writes the flow
//! needs against the purchase contract and ERC-20 tokens. `pipepay-evm`
//! provides the alloy-backed implementation.
//!
//! - [`PurchaseCall`] - Fully marshalled arguments of a purchase entry point
//! - [`PaymentMethod`] - Selects the native or ERC-20 entry point
//! - [`RegistryEntry`] / [`TokenMetadata`] - Token registry and ERC-20 reads

use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
use std::future::Future;
use std::time::Duration;

use crate::error::ChainError;

/// An EIP-155 chain ID (e.g., 1 for Ethereum, 137 for Polygon).
pub type ChainId = u64;

/// Entry of the purchase contract's token registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Registered token name.
    pub name: String,
    /// Token contract address; zero when the name is not registered.
    pub address: Address,
    /// Whether the entry stands for the chain's native currency.
    pub is_native: bool,
}

impl RegistryEntry {
    /// Returns `true` if the registry knows this token.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        !self.address.is_zero() || self.is_native
    }
}

/// ERC-20 metadata read from a token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Token symbol (e.g. `"USDC"`).
    pub symbol: String,
    /// Token name (e.g. `"USD Coin"`).
    pub name: String,
    /// Number of decimals.
    pub decimals: u8,
}

/// Which purchase contract entry point pays for the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Pay in the chain's native currency.
    Native,
    /// Pay in a registered ERC-20 token, debited by registry name.
    Erc20 {
        /// Registry name of the token to debit.
        token_name: String,
    },
}

impl PaymentMethod {
    /// Returns the registry token name for ERC-20 payments.
    #[must_use]
    pub fn token_name(&self) -> Option<&str> {
        match self {
            Self::Native => None,
            Self::Erc20 { token_name } => Some(token_name),
        }
    }
}

/// The signed purchase request as the purchase contract expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    /// Hash binding the request to the job execution.
    pub request_hash: B256,
    /// Time the quote was issued (unix seconds).
    pub time_stamp: U256,
    /// Price in base units, scaled by the contract's base-unit decimals.
    pub price: U256,
    /// Product type tag of the job.
    pub product_type: String,
}

/// Arguments shared by estimation and submission of a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseCall {
    /// Request struct signed by the job service.
    pub request: PurchaseRequest,
    /// Job service signature over the request.
    pub signature: Bytes,
    /// Address of the job service signer.
    pub signer: Address,
    /// Entry point selector.
    pub method: PaymentMethod,
    /// Swap path handed to the contract.
    pub path: Vec<Address>,
}

/// Outcome of waiting for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Whether the transaction executed successfully.
    pub success: bool,
    /// Block the transaction was included in, if reported.
    pub block_number: Option<u64>,
}

/// Chain operations required by the purchase flow.
///
/// Write operations return `Ok(None)` when the node accepted the call but
/// handed back no transaction; the flow treats that as a rejection.
pub trait PurchaseChain: Send + Sync {
    /// Chain the purchase contract lives on.
    fn chain_id(&self) -> ChainId;

    /// Address of the purchase contract (the allowance spender).
    fn purchase_contract(&self) -> Address;

    /// Address paying for purchases and approvals.
    fn payer(&self) -> Address;

    /// Looks up a token in the purchase contract's registry.
    fn registry_entry(
        &self,
        token_name: &str,
    ) -> impl Future<Output = Result<RegistryEntry, ChainError>> + Send;

    /// Reads symbol, name and decimals of an ERC-20 token.
    fn token_metadata(
        &self,
        token: Address,
    ) -> impl Future<Output = Result<TokenMetadata, ChainError>> + Send;

    /// Reads the base-unit token configured on the purchase contract.
    fn base_unit_token(&self) -> impl Future<Output = Result<Address, ChainError>> + Send;

    /// Reads the decimals of an ERC-20 token.
    fn decimals(&self, token: Address) -> impl Future<Output = Result<u8, ChainError>> + Send;

    /// Converts an amount of base units into platform-token units using the
    /// purchase contract's price oracle.
    fn price_in_platform_token(
        &self,
        base_units: U256,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Reads the allowance granted by `owner` to the purchase contract.
    fn allowance(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Submits `approve(purchase_contract, amount)` on `token`.
    fn approve(
        &self,
        token: Address,
        amount: U256,
    ) -> impl Future<Output = Result<Option<TxHash>, ChainError>> + Send;

    /// Simulates the purchase and returns the raw gas estimate.
    fn estimate_purchase(
        &self,
        call: &PurchaseCall,
    ) -> impl Future<Output = Result<u64, ChainError>> + Send;

    /// Sends the purchase transaction with an explicit gas limit.
    fn submit_purchase(
        &self,
        call: &PurchaseCall,
        gas_limit: u64,
    ) -> impl Future<Output = Result<Option<TxHash>, ChainError>> + Send;

    /// Waits for one confirmation of `tx_hash`, giving up after `timeout`.
    fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> impl Future<Output = Result<Confirmation, ChainError>> + Send;
}

impl<T: PurchaseChain> PurchaseChain for std::sync::Arc<T> {
    fn chain_id(&self) -> ChainId {
        (**self).chain_id()
    }

    fn purchase_contract(&self) -> Address {
        (**self).purchase_contract()
    }

    fn payer(&self) -> Address {
        (**self).payer()
    }

    fn registry_entry(
        &self,
        token_name: &str,
    ) -> impl Future<Output = Result<RegistryEntry, ChainError>> + Send {
        (**self).registry_entry(token_name)
    }

    fn token_metadata(
        &self,
        token: Address,
    ) -> impl Future<Output = Result<TokenMetadata, ChainError>> + Send {
        (**self).token_metadata(token)
    }

    fn base_unit_token(&self) -> impl Future<Output = Result<Address, ChainError>> + Send {
        (**self).base_unit_token()
    }

    fn decimals(&self, token: Address) -> impl Future<Output = Result<u8, ChainError>> + Send {
        (**self).decimals(token)
    }

    fn price_in_platform_token(
        &self,
        base_units: U256,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send {
        (**self).price_in_platform_token(base_units)
    }

    fn allowance(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send {
        (**self).allowance(token, owner)
    }

    fn approve(
        &self,
        token: Address,
        amount: U256,
    ) -> impl Future<Output = Result<Option<TxHash>, ChainError>> + Send {
        (**self).approve(token, amount)
    }

    fn estimate_purchase(
        &self,
        call: &PurchaseCall,
    ) -> impl Future<Output = Result<u64, ChainError>> + Send {
        (**self).estimate_purchase(call)
    }

    fn submit_purchase(
        &self,
        call: &PurchaseCall,
        gas_limit: u64,
    ) -> impl Future<Output = Result<Option<TxHash>, ChainError>> + Send {
        (**self).submit_purchase(call, gas_limit)
    }

    fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> impl Future<Output = Result<Confirmation, ChainError>> + Send {
        (**self).wait_for_confirmation(tx_hash, timeout)
    }
}
