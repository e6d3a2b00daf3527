//! Known EVM networks: wrapped native currency and default V2 router.
//!
//! Used to fill in `wrapped_native` and `v2_router` when a chain
//! configuration leaves them out.

use alloy_primitives::{Address, address};
use pipepay::chain::ChainId;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: ChainId = 1;

/// Goerli (testnet) chain ID.
pub const GOERLI: ChainId = 5;

/// BNB Smart Chain chain ID.
pub const BSC_MAINNET: ChainId = 56;

/// Gnosis chain ID.
pub const GNOSIS_MAINNET: ChainId = 100;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: ChainId = 137;

/// WETH on Ethereum Mainnet.
pub const WETH_ETHEREUM: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// WETH on Goerli.
pub const WETH_GOERLI: Address = address!("B4FBF271143F4FBf7B91A5ded31805e42b2208d6");

/// WBNB on BNB Smart Chain.
pub const WBNB_BSC: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");

/// WXDAI on Gnosis.
pub const WXDAI_GNOSIS: Address = address!("e91D153E0b41518A2Ce8Dd3D7944Fa863463a97d");

/// WMATIC on Polygon.
pub const WMATIC_POLYGON: Address = address!("0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270");

/// Uniswap V2 router (Ethereum Mainnet and Goerli).
pub const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

/// `PancakeSwap` V2 router on BNB Smart Chain.
pub const PANCAKESWAP_V2_ROUTER: Address = address!("10ED43C718714eb63d5aA57B78B54704E256024E");

/// `QuickSwap` router on Polygon.
pub const QUICKSWAP_ROUTER: Address = address!("a5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff");

/// Defaults for a known EVM network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// EIP-155 chain ID.
    pub chain_id: ChainId,
    /// Human-readable network name.
    pub name: &'static str,
    /// Wrapped native currency.
    pub wrapped_native: Address,
    /// Default V2 router, if one is deployed.
    pub v2_router: Option<Address>,
}

/// Returns configurations for all known EVM networks.
#[must_use]
pub const fn known_networks() -> &'static [NetworkConfig] {
    &[
        NetworkConfig {
            chain_id: ETHEREUM_MAINNET,
            name: "ethereum",
            wrapped_native: WETH_ETHEREUM,
            v2_router: Some(UNISWAP_V2_ROUTER),
        },
        NetworkConfig {
            chain_id: GOERLI,
            name: "goerli",
            wrapped_native: WETH_GOERLI,
            v2_router: Some(UNISWAP_V2_ROUTER),
        },
        NetworkConfig {
            chain_id: BSC_MAINNET,
            name: "bsc",
            wrapped_native: WBNB_BSC,
            v2_router: Some(PANCAKESWAP_V2_ROUTER),
        },
        NetworkConfig {
            chain_id: GNOSIS_MAINNET,
            name: "gnosis",
            wrapped_native: WXDAI_GNOSIS,
            v2_router: None,
        },
        NetworkConfig {
            chain_id: POLYGON_MAINNET,
            name: "polygon",
            wrapped_native: WMATIC_POLYGON,
            v2_router: Some(QUICKSWAP_ROUTER),
        },
    ]
}

/// Looks up a known network by chain ID.
#[must_use]
pub fn network(chain_id: ChainId) -> Option<&'static NetworkConfig> {
    known_networks().iter().find(|n| n.chain_id == chain_id)
}
