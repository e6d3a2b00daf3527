//! HTTP transport for the pipepay job service.
//!
//! Provides [`HttpRequester`], the reqwest-backed implementation of
//! [`pipepay::request::Requester`].
//!
//! # Modules
//!
//! - [`constants`] - Default hosts, API versions and fixed paths
//! - [`options`] - [`ClientOptions`], base URL composition
//! - [`requester`] - Bearer authentication and envelope decoding
//! - [`session`] - Pre-issued token and expiry callback
//! - [`token`] - HS256 token minting over a signed nonce

pub mod constants;
pub mod options;
pub mod requester;
pub mod session;
pub mod token;

pub use options::ClientOptions;
pub use requester::HttpRequester;
pub use session::Session;
