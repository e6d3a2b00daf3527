#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core of the pipepay client: paying on-chain for remote ML pipeline executions.
//!
//! A pipeline execution is only accepted by the job service once it has been
//! paid for. Paying means turning the service's price quote, denominated in a
//! stable base unit, into a swap-and-pay transaction on the purchase contract,
//! then linking that transaction to the execution.
//!
//! This crate is chain- and transport-agnostic. It talks to the chain through
//! [`chain::PurchaseChain`], to the swap router through
//! [`purchase::RouteOracle`] and to the job service through
//! [`request::Requester`]. `pipepay-evm` and `pipepay-http` provide the
//! production implementations.
//!
//! # Modules
//!
//! - [`api`] - Pipeline, execution and file endpoints
//! - [`auth`] - Nonce challenge signing for the job service
//! - [`chain`] - Chain capability consumed by the purchase flow
//! - [`config`] - Purchase settings and per-start payment choice
//! - [`error`] - Error types of every layer
//! - [`purchase`] - Token resolution, approval, routing, gas, submission and the flow
//! - [`request`] - Transport capability for the job service

pub mod api;
pub mod auth;
pub mod chain;
pub mod config;
pub mod error;
pub mod purchase;
pub mod request;

pub use error::{ChainError, PurchaseError, RequestError};
