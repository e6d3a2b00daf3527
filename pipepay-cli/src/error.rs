//! Error types for configuration loading.

use pipepay::chain::ChainId;

/// Errors raised while loading or resolving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file exists but cannot be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required setting is absent.
    #[error("{0} is not configured")]
    Missing(&'static str),

    /// A setting still references an environment variable that is not set.
    #[error("{0} not resolved (missing env var?)")]
    Unresolved(&'static str),

    /// No `[chains.<id>]` section for the requested chain.
    #[error("chain {0} is not configured")]
    UnknownChain(ChainId),

    /// A chain address has no configured value and no known default.
    #[error("chain {chain_id}: {field} is not configured and has no known default")]
    NoDefault {
        /// Chain being resolved.
        chain_id: ChainId,
        /// Name of the setting.
        field: &'static str,
    },

    /// An RPC URL does not parse.
    #[error("chain {chain_id}: invalid rpc_url: {source}")]
    InvalidRpcUrl {
        /// Chain being resolved.
        chain_id: ChainId,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
}
