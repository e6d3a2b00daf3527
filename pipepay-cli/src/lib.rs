//! Command-line client for paid ML pipeline executions.
//!
//! Wires the job service requester, the EVM purchase chain and the route
//! oracle together from a TOML configuration file.
//!
//! # Modules
//!
//! - [`cli`] - Clap argument definitions
//! - [`commands`] - Command dispatch and output
//! - [`config`] - Configuration with environment variable expansion
//! - [`error`] - Configuration error types

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use commands::run;
