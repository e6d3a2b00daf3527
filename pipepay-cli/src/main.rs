//! `pipepay` command-line client.
//!
//! # Usage
//!
//! ```bash
//! # List pipelines
//! pipepay pipelines list
//!
//! # Start and pay for an execution
//! pipepay start churn data.csv --token-name USDC --chain-id 137
//!
//! # Use a custom config path and log level
//! CONFIG=/path/to/pipepay.toml RUST_LOG=debug pipepay pipelines list
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `pipepay.toml`)
//! - `HOST` - Override the job service host
//! - `PIPEPAY_SESSION_TOKEN` - Reuse a previously issued bearer token
//! - `RUST_LOG` - Log level filter (default: `info`)

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pipepay_cli::{Cli, run};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!("pipepay failed: {e}");
        std::process::exit(1);
    }
}
