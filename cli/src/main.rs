//! `relay`, the command line front end for the two-account relay.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relay_core::{reveal, Relay, RelayConfig, TokioScheduler};
use relay_crypto::{derive_address, parse_account, parse_private_key, public_from_private};
use relay_rpc::HttpLedgerClient;
use relay_types::PrivateKey;
use relay_utils::{init_logging, LogFormat, LoggingError};
use relay_work::{HttpWorkProvider, LocalWorkProvider, WorkProvider};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "relay", about = "Relay a message through a derived account and back")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger node JSON API endpoint.
    #[arg(long, env = "RELAY_NODE_URL")]
    node_url: Option<String>,

    /// Work service endpoint (work is generated locally when unset).
    #[arg(long, env = "RELAY_WORK_URL")]
    work_url: Option<String>,

    /// Log output: "human" or "json".
    #[arg(long, env = "RELAY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level or filter, e.g. "debug" or "info,relay_core=trace".
    #[arg(long, env = "RELAY_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Relay the whole balance of KEY's account and print a token for MESSAGE.
    Send {
        #[arg(long)]
        message: String,
        /// Private key of the original account, 64 hex digits.
        #[arg(long, env = "RELAY_KEY", hide_env_values = true)]
        key: String,
    },
    /// Decrypt a token and show the send that vouches for it.
    Reveal {
        #[arg(long)]
        token: String,
        /// Account the relay returned to.
        #[arg(long)]
        recipient: String,
    },
    /// Finish a relay of MESSAGE that stopped part way.
    Resume {
        #[arg(long)]
        message: String,
        #[arg(long, env = "RELAY_KEY", hide_env_values = true)]
        key: String,
    },
    /// Print the address of a private key.
    Address {
        #[arg(long, env = "RELAY_KEY", hide_env_values = true)]
        key: String,
    },
}

#[derive(Serialize)]
struct AddressOutput {
    address: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config(&cli);

    let (format, level) = match &config {
        Ok(config) => (config.log_format, config.log_level.clone()),
        Err(_) => (cli.log_format.unwrap_or_default(), "info".to_string()),
    };
    if let Err(e) = start_logging(format, &level) {
        eprintln!("relay: logging unavailable: {e}");
    }

    let result = match config {
        Ok(config) => execute(cli.command, &config).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("relay failed");
            ExitCode::FAILURE
        }
    }
}

/// Install logging at `level`, falling back to `info` when the filter does not parse.
fn start_logging(format: LogFormat, level: &str) -> Result<(), LoggingError> {
    match init_logging(format, level) {
        Err(e @ LoggingError::Filter { .. }) => {
            init_logging(format, "info")?;
            tracing::warn!(error = %e, "falling back to log level 'info'");
            Ok(())
        }
        other => other,
    }
}

/// File settings (or defaults), then flags and env vars on top.
fn load_config(cli: &Cli) -> anyhow::Result<RelayConfig> {
    let mut config = match &cli.config {
        Some(path) => RelayConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RelayConfig::default(),
    };
    if let Some(url) = &cli.node_url {
        config.node_url = url.clone();
    }
    if let Some(url) = &cli.work_url {
        config.work_url = Some(url.clone());
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn execute(command: Command, config: &RelayConfig) -> anyhow::Result<String> {
    match command {
        Command::Send { message, key } => {
            let secret = parse_key(&key)?;
            let relay = build_relay(config)?;
            let receipt = relay.run(&secret, &message).await?;
            to_json(&receipt)
        }
        Command::Resume { message, key } => {
            let secret = parse_key(&key)?;
            let relay = build_relay(config)?;
            let report = relay.resume(&secret, &message).await?;
            to_json(&report)
        }
        Command::Reveal { token, recipient } => {
            let recipient = parse_account(&recipient).context("invalid recipient address")?;
            let ledger = ledger_client(config)?;
            let revealed = reveal(&ledger, &token, &recipient, config.history_limit).await?;
            to_json(&revealed)
        }
        Command::Address { key } => {
            let secret = parse_key(&key)?;
            let address = derive_address(&public_from_private(&secret));
            to_json(&AddressOutput {
                address: address.to_string(),
            })
        }
    }
}

type CliRelay = Relay<HttpLedgerClient, Arc<dyn WorkProvider>, TokioScheduler>;

fn build_relay(config: &RelayConfig) -> anyhow::Result<CliRelay> {
    let work: Arc<dyn WorkProvider> = match &config.work_url {
        Some(url) => {
            tracing::info!(%url, "using work service");
            Arc::new(HttpWorkProvider::new(url.clone(), config.work_timeout())?)
        }
        None => {
            tracing::info!("generating work locally");
            Arc::new(LocalWorkProvider::new())
        }
    };
    Ok(Relay::new(
        ledger_client(config)?,
        work,
        TokioScheduler,
        config.relay_options()?,
    ))
}

fn ledger_client(config: &RelayConfig) -> anyhow::Result<HttpLedgerClient> {
    tracing::info!(node = %config.node_url, "connecting to ledger node");
    Ok(HttpLedgerClient::new(
        config.node_url.clone(),
        config.representative()?,
        config.node_timeouts(),
    )?)
}

fn parse_key(hex: &str) -> anyhow::Result<PrivateKey> {
    parse_private_key(hex.trim()).context("invalid private key")
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
