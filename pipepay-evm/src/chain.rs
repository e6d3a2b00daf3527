//! Alloy-backed [`PurchaseChain`].
//!
//! [`Eip155PurchaseChain`] wraps any alloy [`Provider`] and talks to the
//! purchase contract and to ERC-20 tokens through the [`sol!`](alloy_sol_types::sol)
//! bindings in [`crate::contract`]. Write calls are sent from the configured
//! payer address, so the provider must carry a wallet able to sign for it.

use std::fmt;
use std::time::Duration;

use alloy_network::{ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{PendingTransactionBuilder, Provider};
use alloy_rpc_types_eth::TransactionRequest;
use pipepay::ChainError;
use pipepay::chain::{
    ChainId, Confirmation, PurchaseCall, PurchaseChain, RegistryEntry, TokenMetadata,
};
use tracing::debug;

use crate::contract::{IERC20, IPurchase, purchase_calldata};
use crate::error::{Eip155Error, is_watch_timeout};

/// Purchase contract access over an alloy provider.
pub struct Eip155PurchaseChain<P> {
    provider: P,
    chain_id: ChainId,
    purchase_contract: Address,
    payer: Address,
}

impl<P> fmt::Debug for Eip155PurchaseChain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eip155PurchaseChain")
            .field("chain_id", &self.chain_id)
            .field("purchase_contract", &self.purchase_contract)
            .field("payer", &self.payer)
            .finish_non_exhaustive()
    }
}

impl<P: Provider> Eip155PurchaseChain<P> {
    /// Creates a chain handle for a known chain ID.
    pub const fn new(
        provider: P,
        chain_id: ChainId,
        purchase_contract: Address,
        payer: Address,
    ) -> Self {
        Self {
            provider,
            chain_id,
            purchase_contract,
            payer,
        }
    }

    /// Creates a chain handle, reading the chain ID from the node.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Transport`] if the node cannot be reached.
    pub async fn connect(
        provider: P,
        purchase_contract: Address,
        payer: Address,
    ) -> Result<Self, ChainError> {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(Eip155Error::from)?;
        debug!(chain_id, %purchase_contract, %payer, "Connected to purchase chain");
        Ok(Self::new(provider, chain_id, purchase_contract, payer))
    }

    /// Returns the underlying provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    fn purchase_tx(&self, call: &PurchaseCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.payer)
            .with_to(self.purchase_contract)
            .with_input(purchase_calldata(call))
    }
}

impl<P: Provider> PurchaseChain for Eip155PurchaseChain<P> {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn purchase_contract(&self) -> Address {
        self.purchase_contract
    }

    fn payer(&self) -> Address {
        self.payer
    }

    async fn registry_entry(&self, token_name: &str) -> Result<RegistryEntry, ChainError> {
        let contract = IPurchase::new(self.purchase_contract, &self.provider);
        let entry = contract
            .tokenMap(token_name.to_owned())
            .call()
            .await
            .map_err(Eip155Error::from)?;
        debug!(token_name, address = %entry.tokenAddress, is_native = entry.isNative, "Read token registry");
        Ok(RegistryEntry {
            name: entry.name,
            address: entry.tokenAddress,
            is_native: entry.isNative,
        })
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
        let erc20 = IERC20::new(token, &self.provider);
        let symbol = erc20.symbol().call().await.map_err(Eip155Error::from)?;
        let name = erc20.name().call().await.map_err(Eip155Error::from)?;
        let decimals = erc20.decimals().call().await.map_err(Eip155Error::from)?;
        debug!(%token, symbol, decimals, "Read token metadata");
        Ok(TokenMetadata {
            symbol,
            name,
            decimals,
        })
    }

    async fn base_unit_token(&self) -> Result<Address, ChainError> {
        let contract = IPurchase::new(self.purchase_contract, &self.provider);
        let token = contract
            .baseToken()
            .call()
            .await
            .map_err(Eip155Error::from)?;
        Ok(token)
    }

    async fn decimals(&self, token: Address) -> Result<u8, ChainError> {
        let decimals = IERC20::new(token, &self.provider)
            .decimals()
            .call()
            .await
            .map_err(Eip155Error::from)?;
        Ok(decimals)
    }

    async fn price_in_platform_token(&self, base_units: U256) -> Result<U256, ChainError> {
        let contract = IPurchase::new(self.purchase_contract, &self.provider);
        let amount = contract
            .priceInSwash(base_units)
            .call()
            .await
            .map_err(Eip155Error::from)?;
        debug!(%base_units, %amount, "Converted base units on-chain");
        Ok(amount)
    }

    async fn allowance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        let allowance = IERC20::new(token, &self.provider)
            .allowance(owner, self.purchase_contract)
            .call()
            .await
            .map_err(Eip155Error::from)?;
        debug!(%token, %owner, %allowance, "Read allowance");
        Ok(allowance)
    }

    async fn approve(&self, token: Address, amount: U256) -> Result<Option<TxHash>, ChainError> {
        let pending = IERC20::new(token, &self.provider)
            .approve(self.purchase_contract, amount)
            .from(self.payer)
            .send()
            .await
            .map_err(Eip155Error::from)?;
        Ok(Some(*pending.tx_hash()))
    }

    async fn estimate_purchase(&self, call: &PurchaseCall) -> Result<u64, ChainError> {
        let gas = self
            .provider
            .estimate_gas(self.purchase_tx(call))
            .await
            .map_err(Eip155Error::from)?;
        debug!(gas, "Estimated purchase gas");
        Ok(gas)
    }

    async fn submit_purchase(
        &self,
        call: &PurchaseCall,
        gas_limit: u64,
    ) -> Result<Option<TxHash>, ChainError> {
        let tx = self.purchase_tx(call).with_gas_limit(gas_limit);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(Eip155Error::from)?;
        Ok(Some(*pending.tx_hash()))
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<Confirmation, ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(1)
            .with_timeout(Some(timeout))
            .get_receipt()
            .await
            .map_err(|e| {
                if is_watch_timeout(&e) {
                    ChainError::Timeout {
                        tx_hash,
                        after: timeout,
                    }
                } else {
                    Eip155Error::from(e).into()
                }
            })?;
        debug!(%tx_hash, status = receipt.status(), block = ?receipt.block_number(), "Received receipt");
        Ok(Confirmation {
            tx_hash,
            success: receipt.status(),
            block_number: receipt.block_number(),
        })
    }
}
