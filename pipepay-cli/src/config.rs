//! Client configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "https://scompute-client.swashapp.io"
//! services_host = "https://api.swashapp.io"
//! jwt_signing_key = "$PIPEPAY_JWT_KEY"
//! private_key = "$PIPEPAY_PRIVATE_KEY"
//! confirmation_timeout_secs = 120
//! request_timeout_secs = 30
//!
//! [chains.1]
//! rpc_url = "https://eth.llamarpc.com"
//! rate_limit = 10
//! purchase_contract = "0x..."
//! platform_token = "0x..."
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `pipepay.toml`)
//! - `HOST` - Override the job service host
//! - Secrets referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use alloy_primitives::Address;
use pipepay::chain::ChainId;
use pipepay::config::PurchaseSettings;
use pipepay_evm::networks;
use pipepay_evm::provider::RpcEndpoint;
use pipepay_http::ClientOptions;
use pipepay_http::constants::{DEFAULT_HOST, DEFAULT_SERVICES_HOST};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipepayConfig {
    /// Job service host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Services host issuing authentication nonces.
    #[serde(default = "default_services_host")]
    pub services_host: String,

    /// Key signing the bearer tokens minted from nonce challenges.
    #[serde(default)]
    pub jwt_signing_key: Option<String>,

    /// Private key of the paying wallet (hex, with or without `0x` prefix).
    #[serde(default)]
    pub private_key: Option<String>,

    /// Upper bound on each confirmation wait.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Per-request timeout for the job service.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Chain configurations keyed by EIP-155 chain ID.
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

/// Per-chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// Requests per second sent to `rpc_url`.
    #[serde(default)]
    pub rate_limit: Option<u32>,

    /// Purchase contract address.
    pub purchase_contract: Address,

    /// Platform settlement token address.
    pub platform_token: Address,

    /// Wrapped native currency; defaults from the known networks table.
    #[serde(default)]
    pub wrapped_native: Option<Address>,

    /// V2 router; defaults from the known networks table.
    #[serde(default)]
    pub v2_router: Option<Address>,
}

/// A chain configuration with all defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChain {
    /// EIP-155 chain ID.
    pub chain_id: ChainId,
    /// RPC endpoint.
    pub endpoint: RpcEndpoint,
    /// Purchase contract address.
    pub purchase_contract: Address,
    /// V2 router address.
    pub v2_router: Address,
    /// Purchase flow settings.
    pub settings: PurchaseSettings,
}

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

fn default_services_host() -> String {
    DEFAULT_SERVICES_HOST.to_owned()
}

const fn default_confirmation_timeout_secs() -> u64 {
    120
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl PipepayConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults. After loading, `$VAR` / `${VAR}`
    /// references are expanded from the process environment and `HOST`
    /// overrides the file value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?
        } else {
            String::new()
        };

        let mut config = Self::parse(&content, |name| std::env::var(name).ok())?;
        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        Ok(config)
    }

    /// Parses TOML after expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the expanded text is not a valid configuration.
    pub fn parse(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let expanded = expand_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Job service endpoints and timeout.
    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::default()
            .with_host(&self.host)
            .with_services_host(&self.services_host)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    /// The paying wallet's private key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] or [`ConfigError::Unresolved`].
    pub fn private_key(&self) -> Result<&str, ConfigError> {
        resolved("private_key", self.private_key.as_deref())
    }

    /// The bearer token signing key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] or [`ConfigError::Unresolved`].
    pub fn jwt_signing_key(&self) -> Result<&str, ConfigError> {
        resolved("jwt_signing_key", self.jwt_signing_key.as_deref())
    }

    /// Resolves the configuration of `chain_id`, applying known network defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chain is not configured, its RPC URL is
    /// invalid, or an address has neither a value nor a default.
    pub fn chain(&self, chain_id: ChainId) -> Result<ResolvedChain, ConfigError> {
        let chain = self
            .chains
            .get(&chain_id.to_string())
            .ok_or(ConfigError::UnknownChain(chain_id))?;
        let known = networks::network(chain_id);
        let wrapped_native = chain
            .wrapped_native
            .or_else(|| known.map(|n| n.wrapped_native))
            .ok_or(ConfigError::NoDefault {
                chain_id,
                field: "wrapped_native",
            })?;
        let v2_router = chain
            .v2_router
            .or_else(|| known.and_then(|n| n.v2_router))
            .ok_or(ConfigError::NoDefault {
                chain_id,
                field: "v2_router",
            })?;
        let url = Url::parse(chain.rpc_url.trim())
            .map_err(|source| ConfigError::InvalidRpcUrl { chain_id, source })?;
        let settings = PurchaseSettings::new(chain.platform_token, wrapped_native)
            .with_confirmation_timeout(Duration::from_secs(self.confirmation_timeout_secs));
        Ok(ResolvedChain {
            chain_id,
            endpoint: RpcEndpoint {
                url,
                rate_limit: chain.rate_limit,
            },
            purchase_contract: chain.purchase_contract,
            v2_router,
            settings,
        })
    }
}

fn resolved<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    match value {
        None => Err(ConfigError::Missing(name)),
        Some(v) if v.starts_with('$') => Err(ConfigError::Unresolved(name)),
        Some(v) => Ok(v),
    }
}

/// Expands `$VAR` and `${VAR}` patterns using `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        if var_name.is_empty() {
            result.push('$');
            if braced {
                result.push('{');
            }
        } else if let Some(val) = lookup(&var_name) {
            result.push_str(&val);
        } else {
            result.push('$');
            if braced {
                result.push('{');
            }
            result.push_str(&var_name);
            if braced {
                result.push('}');
            }
        }
    }

    result
}
