//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pipepay::chain::ChainId;

/// Pay for and manage remote ML pipeline executions.
#[derive(Debug, Parser)]
#[command(name = "pipepay", version)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = "pipepay.toml")]
    pub config: PathBuf,

    /// Reuse a previously issued bearer token instead of signing a nonce.
    #[arg(long, env = "PIPEPAY_SESSION_TOKEN")]
    pub session_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Code and data files.
    #[command(subcommand)]
    Files(FilesCommand),

    /// Pipeline definitions.
    #[command(subcommand)]
    Pipelines(PipelinesCommand),

    /// Executions of a pipeline.
    #[command(subcommand)]
    Executions(ExecutionsCommand),

    /// Starts a pipeline execution and pays for it on-chain.
    Start {
        /// Pipeline to execute.
        pipeline: String,
        /// Input data file of the execution.
        input_data_file: String,
        /// Registry name of the token to pay with.
        #[arg(long)]
        token_name: String,
        /// Chain to pay on.
        #[arg(long)]
        chain_id: ChainId,
    },
}

/// File commands.
#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// Lists code files.
    Code,
    /// Lists data files.
    Data,
    /// Uploads a code file.
    Upload {
        /// Local file to upload.
        path: PathBuf,
        /// Remote name; defaults to the local file name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Deletes a code file.
    Delete {
        /// Remote file name.
        name: String,
    },
    /// Downloads a code file.
    Download {
        /// Remote file name.
        name: String,
        /// Where to write the file.
        #[arg(long)]
        out: PathBuf,
    },
}

/// Pipeline commands.
#[derive(Debug, Subcommand)]
pub enum PipelinesCommand {
    /// Lists pipelines.
    List,
    /// Shows one pipeline.
    Show {
        /// Pipeline name.
        name: String,
    },
    /// Creates a pipeline.
    Create {
        /// Pipeline name.
        name: String,
        /// Code file preparing the input data.
        #[arg(long)]
        processing_file: String,
        /// Code file evaluating the trained model.
        #[arg(long)]
        evaluation_file: String,
        /// Training framework.
        #[arg(long)]
        framework: String,
        /// Training algorithm.
        #[arg(long)]
        algorithm: String,
        /// Hyper-parameter as `KEY=VALUE`; repeatable.
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Deletes a pipeline.
    Delete {
        /// Pipeline name.
        name: String,
    },
}

/// Execution commands.
#[derive(Debug, Subcommand)]
pub enum ExecutionsCommand {
    /// Lists executions of a pipeline.
    List {
        /// Pipeline name.
        pipeline: String,
    },
    /// Shows one execution.
    Show(ExecutionArgs),
    /// Shows the steps of an execution.
    Steps(ExecutionArgs),
    /// Stops a running execution.
    Stop(ExecutionArgs),
    /// Retries a failed execution.
    Retry(ExecutionArgs),
    /// Deletes an execution.
    Delete(ExecutionArgs),
    /// Downloads the trained model.
    Model {
        #[command(flatten)]
        execution: ExecutionArgs,
        /// Where to write the model.
        #[arg(long)]
        out: PathBuf,
    },
    /// Downloads the execution log.
    Log {
        #[command(flatten)]
        execution: ExecutionArgs,
        /// Where to write the log.
        #[arg(long)]
        out: PathBuf,
    },
}

/// Identifies one execution.
#[derive(Debug, clap::Args)]
pub struct ExecutionArgs {
    /// Pipeline name.
    pub pipeline: String,
    /// Execution ID.
    pub execution_id: String,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
