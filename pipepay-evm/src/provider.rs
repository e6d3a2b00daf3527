//! Wallet-enabled provider construction.
//!
//! [`PurchaseProvider`] is the provider type used by the binary: a throttled
//! HTTP transport with the gas, nonce and chain ID fillers plus a wallet
//! filler signing for the payer.

use std::num::NonZeroUsize;

use alloy_network::EthereumWallet;
use alloy_provider::fillers::{
    BlobGasFiller, CachedNonceManager, ChainIdFiller, FillProvider, GasFiller, JoinFill,
    NonceFiller, WalletFiller,
};
use alloy_provider::{Identity, ProviderBuilder, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use pipepay::chain::ChainId;
use tower::ServiceBuilder;
use tracing::info;
use url::Url;

/// Combined filler type for gas, blob gas, nonce, and chain ID.
pub type InnerFiller = JoinFill<
    GasFiller,
    JoinFill<BlobGasFiller, JoinFill<NonceFiller<CachedNonceManager>, ChainIdFiller>>,
>;

/// The fully composed provider used for purchases.
pub type PurchaseProvider = FillProvider<
    JoinFill<JoinFill<Identity, InnerFiller>, WalletFiller<EthereumWallet>>,
    RootProvider,
>;

/// An RPC endpoint with an optional requests-per-second limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    /// HTTP(S) endpoint URL.
    pub url: Url,
    /// Requests per second; unlimited when absent.
    pub rate_limit: Option<u32>,
}

/// Errors raised while building a provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderSetupError {
    /// None of the configured endpoints use HTTP(S).
    #[error("no HTTP(S) RPC endpoint configured for chain {0}")]
    NoHttpEndpoint(ChainId),
}

/// Creates an RPC client over the HTTP endpoints, failing over between them.
///
/// Non-HTTP(S) URLs are skipped.
///
/// # Errors
///
/// Returns [`ProviderSetupError::NoHttpEndpoint`] if no usable endpoint remains.
pub fn rpc_client(
    chain_id: ChainId,
    endpoints: &[RpcEndpoint],
) -> Result<RpcClient, ProviderSetupError> {
    let transports = endpoints
        .iter()
        .filter_map(|endpoint| {
            let scheme = endpoint.url.scheme();
            if scheme != "http" && scheme != "https" {
                return None;
            }
            info!(chain = chain_id, rpc_url = %endpoint.url, rate_limit = ?endpoint.rate_limit, "Using HTTP transport");
            let service = ServiceBuilder::new()
                .layer(ThrottleLayer::new(endpoint.rate_limit.unwrap_or(u32::MAX)))
                .service(Http::new(endpoint.url.clone()));
            Some(service)
        })
        .collect::<Vec<_>>();
    let active = NonZeroUsize::new(transports.len())
        .ok_or(ProviderSetupError::NoHttpEndpoint(chain_id))?;
    let fallback = ServiceBuilder::new()
        .layer(FallbackLayer::default().with_active_transport_count(active))
        .service(transports);
    Ok(RpcClient::new(fallback, false))
}

/// Builds a provider that signs with `wallet`.
///
/// # Errors
///
/// Returns [`ProviderSetupError::NoHttpEndpoint`] if no usable endpoint remains.
pub fn connect(
    chain_id: ChainId,
    endpoints: &[RpcEndpoint],
    wallet: EthereumWallet,
) -> Result<PurchaseProvider, ProviderSetupError> {
    let client = rpc_client(chain_id, endpoints)?;
    let filler = JoinFill::new(
        GasFiller,
        JoinFill::new(
            BlobGasFiller::default(),
            JoinFill::new(
                NonceFiller::new(CachedNonceManager::default()),
                ChainIdFiller::default(),
            ),
        ),
    );
    Ok(ProviderBuilder::default()
        .filler(filler)
        .wallet(wallet)
        .connect_client(client))
}
