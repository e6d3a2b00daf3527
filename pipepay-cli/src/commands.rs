//! Command dispatch.
//!
//! Each command builds the job service client from the loaded configuration,
//! performs one call and prints the result as JSON on stdout. Logs go to
//! stderr so the output stays machine-readable.

use std::error::Error;
use std::io::Write;
use std::path::Path;

use alloy_network::EthereumWallet;
use pipepay::api::{Client, PipelineInit};
use pipepay::auth::MessageSigner;
use pipepay::chain::ChainId;
use pipepay::config::PurchaseConfig;
use pipepay::purchase::{PurchaseFlow, PurchaseReceipt};
use pipepay_evm::{Eip155PurchaseChain, LocalMessageSigner, V2RouterOracle};
use pipepay_http::{HttpRequester, Session};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{Cli, Command, ExecutionArgs, ExecutionsCommand, FilesCommand, PipelinesCommand};
use crate::config::PipepayConfig;

type CliResult = Result<(), Box<dyn Error>>;
type ApiClient = Client<HttpRequester<LocalMessageSigner>>;

/// Runs the parsed command line.
///
/// # Errors
///
/// Returns the first configuration, transport, or purchase error.
pub async fn run(cli: Cli) -> CliResult {
    let config = PipepayConfig::load_from(&cli.config)?;
    info!(
        host = %config.host,
        chains = config.chains.len(),
        "Loaded configuration"
    );

    let signer = LocalMessageSigner::from_private_key(config.private_key()?)?;
    let requester = HttpRequester::new(config.client_options(), signer.clone())?;
    let requester = match cli.session_token {
        Some(token) => requester.with_session(
            Session::with_token(token)
                .on_expired(|| warn!("Session token expired; rerun without --session-token")),
        ),
        None => requester.with_signing_key(config.jwt_signing_key()?),
    };
    let client = Client::new(requester);

    match cli.command {
        Command::Files(command) => files(&client, command).await,
        Command::Pipelines(command) => pipelines(&client, command).await,
        Command::Executions(command) => executions(&client, command).await,
        Command::Start {
            pipeline,
            input_data_file,
            token_name,
            chain_id,
        } => {
            let receipt = start(
                &client,
                &config,
                &signer,
                &pipeline,
                &input_data_file,
                &PurchaseConfig {
                    token_name,
                    chain_id,
                },
            )
            .await?;
            print_receipt(&receipt)
        }
    }
}

async fn files(client: &ApiClient, command: FilesCommand) -> CliResult {
    match command {
        FilesCommand::Code => print_json(&client.code_files().await?),
        FilesCommand::Data => print_json(&client.data_files().await?),
        FilesCommand::Upload { path, name } => {
            let name = match name {
                Some(name) => name,
                None => file_name(&path)?,
            };
            let content = std::fs::read(&path)?;
            info!(file = %name, bytes = content.len(), "Uploading code file");
            print_json(&client.upload_code_file(&name, content).await?)
        }
        FilesCommand::Delete { name } => {
            client.delete_code_file(&name).await?;
            info!(file = %name, "Deleted code file");
            Ok(())
        }
        FilesCommand::Download { name, out } => {
            let content = client.download_code_file(&name).await?;
            save(&out, &content)
        }
    }
}

async fn pipelines(client: &ApiClient, command: PipelinesCommand) -> CliResult {
    match command {
        PipelinesCommand::List => print_json(&client.pipelines().await?),
        PipelinesCommand::Show { name } => print_json(&client.pipeline(&name).await?),
        PipelinesCommand::Create {
            name,
            processing_file,
            evaluation_file,
            framework,
            algorithm,
            params,
        } => {
            let init = PipelineInit {
                processing_file,
                evaluation_file,
                framework,
                algorithm,
                hyper_parameters: params.into_iter().collect(),
            };
            client.create_pipeline(&name, &init).await?;
            info!(pipeline = %name, "Created pipeline");
            Ok(())
        }
        PipelinesCommand::Delete { name } => {
            client.delete_pipeline(&name).await?;
            info!(pipeline = %name, "Deleted pipeline");
            Ok(())
        }
    }
}

async fn executions(client: &ApiClient, command: ExecutionsCommand) -> CliResult {
    match command {
        ExecutionsCommand::List { pipeline } => print_json(&client.executions(&pipeline).await?),
        ExecutionsCommand::Show(ExecutionArgs {
            pipeline,
            execution_id,
        }) => print_json(&client.execution(&pipeline, &execution_id).await?),
        ExecutionsCommand::Steps(ExecutionArgs {
            pipeline,
            execution_id,
        }) => print_json(&client.execution_steps(&pipeline, &execution_id).await?),
        ExecutionsCommand::Stop(ExecutionArgs {
            pipeline,
            execution_id,
        }) => {
            client.stop_execution(&pipeline, &execution_id).await?;
            info!(%pipeline, %execution_id, "Stopped execution");
            Ok(())
        }
        ExecutionsCommand::Retry(ExecutionArgs {
            pipeline,
            execution_id,
        }) => {
            client.retry_execution(&pipeline, &execution_id).await?;
            info!(%pipeline, %execution_id, "Retried execution");
            Ok(())
        }
        ExecutionsCommand::Delete(ExecutionArgs {
            pipeline,
            execution_id,
        }) => {
            client.delete_execution(&pipeline, &execution_id).await?;
            info!(%pipeline, %execution_id, "Deleted execution");
            Ok(())
        }
        ExecutionsCommand::Model { execution, out } => {
            let content = client
                .download_model(&execution.pipeline, &execution.execution_id)
                .await?;
            save(&out, &content)
        }
        ExecutionsCommand::Log { execution, out } => {
            let content = client
                .download_log(&execution.pipeline, &execution.execution_id)
                .await?;
            save(&out, &content)
        }
    }
}

async fn start(
    client: &ApiClient,
    config: &PipepayConfig,
    signer: &LocalMessageSigner,
    pipeline: &str,
    input_data_file: &str,
    purchase: &PurchaseConfig,
) -> Result<PurchaseReceipt, Box<dyn Error>> {
    let chain_id: ChainId = purchase.chain_id;
    let resolved = config.chain(chain_id)?;
    let wallet = EthereumWallet::from(signer.signer().clone());
    let provider = pipepay_evm::provider::connect(
        chain_id,
        std::slice::from_ref(&resolved.endpoint),
        wallet,
    )?;

    let oracle = V2RouterOracle::new(
        provider.clone(),
        resolved.v2_router,
        resolved.settings.wrapped_native,
    );
    let chain =
        Eip155PurchaseChain::connect(provider, resolved.purchase_contract, signer.address())
            .await?;
    let flow = PurchaseFlow::new(chain, oracle, resolved.settings);

    Ok(client
        .start(&flow, pipeline, input_data_file, purchase)
        .await?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptOutput {
    execution_id: String,
    tx_hash: String,
    block_number: Option<u64>,
    gas_limit: u64,
    route: String,
    warnings: Vec<String>,
}

fn print_receipt(receipt: &PurchaseReceipt) -> CliResult {
    print_json(&ReceiptOutput {
        execution_id: receipt.execution_id.clone(),
        tx_hash: receipt.tx_hash.to_string(),
        block_number: receipt.block_number,
        gas_limit: receipt.gas_limit.get(),
        route: receipt.route.to_string(),
        warnings: receipt.warnings.clone(),
    })
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn save(path: &Path, content: &[u8]) -> CliResult {
    std::fs::write(path, content)?;
    info!(path = %path.display(), bytes = content.len(), "Saved download");
    Ok(())
}

fn file_name(path: &Path) -> Result<String, Box<dyn Error>> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| format!("cannot derive a file name from {}", path.display()).into())
}
