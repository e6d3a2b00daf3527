#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) support for pipepay.
//!
//! Implements the chain-facing capabilities of the purchase flow with alloy:
//!
//! - [`chain`] - [`Eip155PurchaseChain`], the purchase contract and ERC-20 calls
//! - [`oracle`] - [`V2RouterOracle`], candidate path pricing on a V2 router
//! - [`contract`] - `sol!` bindings and purchase calldata encoding
//! - [`provider`] - throttled, wallet-enabled provider construction
//! - [`networks`] - wrapped native currency and router defaults per chain
//! - `signer` - local private-key message signer (feature `signer`)
//!
//! # Feature Flags
//!
//! - `signer` (default) - [`LocalMessageSigner`] backed by `alloy-signer-local`

pub mod chain;
pub mod contract;
pub mod error;
pub mod networks;
pub mod oracle;
pub mod provider;
#[cfg(feature = "signer")]
pub mod signer;

pub use chain::Eip155PurchaseChain;
pub use error::Eip155Error;
pub use oracle::V2RouterOracle;
#[cfg(feature = "signer")]
pub use signer::LocalMessageSigner;
