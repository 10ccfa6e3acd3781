use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use multisend::{
    config::{Config, Network},
    csv_codec, dispatch,
    operation_log::OperationLog,
    signer::{EthersSigner, TransferSigner},
    MultiSendSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "multisend", version, about = "Send per-recipient token amounts from a CSV file")]
struct Opt {
    /// Network to operate on (Ethereum or Base). Overrides MULTISEND_NETWORK.
    #[arg(long, global = true)]
    network: Option<Network>,

    /// JSON-RPC endpoint. Overrides RPC_URL.
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the tokens available on the selected network
    Tokens,
    /// Resolve every transfer in a CSV file without sending anything
    Plan {
        /// Recipient CSV (address,<SYMBOL>,...)
        csv: PathBuf,
    },
    /// Send every transfer in a CSV file, one transaction at a time
    Send {
        /// Recipient CSV (address,<SYMBOL>,...)
        csv: PathBuf,
        /// Hex private key of the sending wallet
        #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
        private_key: Option<String>,
    },
    /// Re-write a CSV file with the canonical column layout
    Normalize { input: PathBuf, output: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opt = Opt::parse();

    let mut config = Config::from_env()?;
    if let Some(network) = opt.network {
        config = config.with_network(network);
    }
    if let Some(rpc_url) = opt.rpc_url {
        config = config.with_rpc_url(rpc_url)?;
    }

    let registry = Arc::new(
        config
            .registry()
            .context("Failed to load token registry")?,
    );

    match opt.cmd {
        Cmd::Tokens => {
            println!(
                "Tokens on {} (chain {}, native {}):",
                config.network_label(),
                config.network.chain_id(),
                config.native_token()
            );
            for symbol in registry.symbols(config.network) {
                let info = registry.resolve(config.network, &symbol)?;
                match info.address {
                    Some(address) => println!("  {:<8} {:?} ({} decimals)", symbol, address, info.decimals),
                    None => println!("  {:<8} native ({} decimals)", symbol, config.network.native_decimals()),
                }
            }
        }
        Cmd::Plan { csv } => {
            let recipients = csv_codec::read_file(&csv)
                .with_context(|| format!("Failed to read {}", csv.display()))?;
            let transfers = dispatch::plan(&registry, &recipients, config.network)?;
            println!(
                "{} transfer(s) to {} recipient(s) on {}:",
                transfers.len(),
                recipients.len(),
                config.network
            );
            for (i, transfer) in transfers.iter().enumerate() {
                println!("  {}. {}", i + 1, transfer.describe());
            }
        }
        Cmd::Send { csv, private_key } => {
            let text = std::fs::read_to_string(&csv)
                .with_context(|| format!("Failed to read {}", csv.display()))?;

            let log = OperationLog::new(config.log_path.clone().unwrap_or_else(OperationLog::default_path));
            let mut session =
                MultiSendSession::new(Arc::clone(&registry), config.network).with_operation_log(log);
            session.import_csv(&text)?;

            let signer = match private_key {
                Some(key) => Some(EthersSigner::connect(&config, &key).await?),
                None => None,
            };

            let result = session
                .send(signer.as_ref().map(|s| s as &dyn TransferSigner))
                .await;

            let submitted = match &result {
                Ok(report) => &report.submitted,
                Err(failure) => &failure.submitted,
            };
            for sent in submitted {
                println!(
                    "{} {}",
                    sent.transfer.describe(),
                    config.network.tx_explorer_url(&format!("{:?}", sent.tx_hash))
                );
            }
            println!("{}", session.status().unwrap_or_default());

            if result.is_err() {
                bail!("dispatch did not complete");
            }
        }
        Cmd::Normalize { input, output } => {
            let recipients = csv_codec::read_file(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            csv_codec::write_file(&output, &recipients)?;
            println!("Wrote {} recipient(s) to {}", recipients.len(), output.display());
        }
    }

    Ok(())
}
