//! Token resolution: registry name to on-chain token metadata.

use alloy_primitives::Address;
use tracing::debug;

use crate::chain::{ChainId, PaymentMethod, PurchaseChain};
use crate::config::PurchaseSettings;
use crate::error::PurchaseError;

/// Decimals of the platform token.
pub const PLATFORM_TOKEN_DECIMALS: u8 = 18;

/// How a token relates to the chain and the platform.
///
/// A token is at most one of native currency or platform token; ordinary
/// ERC-20 tokens are neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The chain's native currency, routed as its wrapped ERC-20.
    Native,
    /// The platform's own settlement token.
    Platform,
    /// Any other registered ERC-20 token.
    Erc20,
}

/// Resolved token, scoped to a single purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// Chain the token lives on.
    pub chain_id: ChainId,
    /// Token address used for routing (wrapped native for native currency).
    pub address: Address,
    /// Registry name of the token.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Token decimals.
    pub decimals: u8,
    /// Relationship to chain and platform.
    pub kind: TokenKind,
    /// Decimals of the purchase contract's base-unit token.
    pub base_unit_decimals: u8,
}

impl TokenInfo {
    /// Returns `true` for the chain's native currency.
    #[must_use]
    pub const fn is_native_currency(&self) -> bool {
        matches!(self.kind, TokenKind::Native)
    }

    /// Returns `true` for the platform token.
    #[must_use]
    pub const fn is_platform_token(&self) -> bool {
        matches!(self.kind, TokenKind::Platform)
    }

    /// Returns the purchase contract entry point for this token.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        match self.kind {
            TokenKind::Native => PaymentMethod::Native,
            TokenKind::Platform | TokenKind::Erc20 => PaymentMethod::Erc20 {
                token_name: self.name.clone(),
            },
        }
    }
}

/// Resolves registry names to [`TokenInfo`].
#[derive(Debug)]
pub struct TokenResolver<'a, C> {
    chain: &'a C,
    settings: &'a PurchaseSettings,
}

impl<'a, C: PurchaseChain> TokenResolver<'a, C> {
    /// Creates a resolver over `chain`.
    pub const fn new(chain: &'a C, settings: &'a PurchaseSettings) -> Self {
        Self { chain, settings }
    }

    /// Resolves `token_name` against the purchase contract's registry.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::TokenNotFound`] for unregistered names and
    /// [`PurchaseError::Chain`] if a read fails.
    pub async fn resolve(&self, token_name: &str) -> Result<TokenInfo, PurchaseError> {
        let entry = self.chain.registry_entry(token_name).await?;
        if !entry.is_registered() {
            return Err(PurchaseError::TokenNotFound(token_name.to_owned()));
        }
        let name = if entry.name.is_empty() {
            token_name.to_owned()
        } else {
            entry.name
        };

        let (kind, address, symbol, decimals) = if entry.address == self.settings.platform_token {
            // The platform token needs no metadata round trip.
            (
                TokenKind::Platform,
                entry.address,
                name.clone(),
                PLATFORM_TOKEN_DECIMALS,
            )
        } else if entry.is_native {
            let wrapped = self.settings.wrapped_native;
            let meta = self.chain.token_metadata(wrapped).await?;
            (TokenKind::Native, wrapped, meta.symbol, meta.decimals)
        } else {
            let meta = self.chain.token_metadata(entry.address).await?;
            (TokenKind::Erc20, entry.address, meta.symbol, meta.decimals)
        };

        let base_unit_token = self.chain.base_unit_token().await?;
        let base_unit_decimals = self.chain.decimals(base_unit_token).await?;

        debug!(
            token = %name,
            address = %address,
            ?kind,
            decimals,
            base_unit_decimals,
            "Resolved purchase token"
        );

        Ok(TokenInfo {
            chain_id: self.chain.chain_id(),
            address,
            name,
            symbol,
            decimals,
            kind,
            base_unit_decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase::testing::{FakeChain, PLATFORM, USDC, WRAPPED, settings};

    #[tokio::test]
    async fn platform_token_skips_metadata_lookup() {
        let chain = FakeChain::new();
        let settings = settings();
        let token = TokenResolver::new(&chain, &settings)
            .resolve("SWASH")
            .await
            .unwrap();
        assert!(token.is_platform_token());
        assert!(!token.is_native_currency());
        assert_eq!(token.address, PLATFORM);
        assert_eq!(token.decimals, PLATFORM_TOKEN_DECIMALS);
        assert_eq!(token.base_unit_decimals, 18);
        assert!(chain.metadata_lookups().is_empty());
    }

    #[tokio::test]
    async fn native_token_uses_wrapped_metadata() {
        let chain = FakeChain::new();
        let settings = settings();
        let token = TokenResolver::new(&chain, &settings)
            .resolve("ETH")
            .await
            .unwrap();
        assert!(token.is_native_currency());
        assert!(!token.is_platform_token());
        assert_eq!(token.address, WRAPPED);
        assert_eq!(token.symbol, "WETH");
        assert_eq!(token.payment_method(), PaymentMethod::Native);
        assert_eq!(chain.metadata_lookups(), vec![WRAPPED]);
    }

    #[tokio::test]
    async fn erc20_token_reads_contract_metadata() {
        let chain = FakeChain::new();
        let settings = settings();
        let token = TokenResolver::new(&chain, &settings)
            .resolve("USDC")
            .await
            .unwrap();
        assert_eq!(token.kind, TokenKind::Erc20);
        assert_eq!(token.address, USDC);
        assert_eq!(token.decimals, 6);
        assert_eq!(
            token.payment_method(),
            PaymentMethod::Erc20 {
                token_name: "USDC".into()
            }
        );
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let chain = FakeChain::new();
        let settings = settings();
        let err = TokenResolver::new(&chain, &settings)
            .resolve("DOGE")
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::TokenNotFound(name) if name == "DOGE"));
    }
}
