//! dda-cli — Key tools for DDACOIN.
//!
//! Generates payout addresses with a WIF backup, creates and inspects
//! recovery phrases, and checks addresses and node connectivity. Nothing is
//! written to disk.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use dda_core::constants::DEFAULT_RPC_TIMEOUT_SECS;
use dda_core::{Address, Network, NetworkParams};
use dda_rpc::{RpcClient, RpcConfig};
use dda_wallet::keys::{derive_from_mnemonic, derive_from_wif};
use dda_wallet::mnemonic::{generate_mnemonic, normalize_mnemonic, validate_mnemonic};
use dda_wallet::DerivedKey;

/// DDACOIN key and address tools.
#[derive(Parser)]
#[command(name = "dda-cli")]
#[command(version, about = "DDACOIN key and address tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh P2PKH address and its WIF backup (e.g. for MINING_ADDR).
    Genaddress(NetworkArgs),
    /// Generate a new 12-word recovery phrase and show its first address.
    Mnemonic(NetworkArgs),
    /// Show the address for a recovery phrase or WIF key (read from the terminal).
    Derive(DeriveArgs),
    /// Check whether an address belongs to the selected network.
    Validate(ValidateArgs),
    /// Check that the node answers RPC calls.
    Status(StatusArgs),
}

#[derive(Args)]
struct NetworkArgs {
    /// Shorthand for `--network testnet`.
    #[arg(long)]
    testnet: bool,

    /// Network (mainnet or testnet).
    #[arg(short, long, default_value = "mainnet")]
    network: Network,
}

impl NetworkArgs {
    fn params(&self) -> &'static NetworkParams {
        if self.testnet {
            Network::Testnet.params()
        } else {
            self.network.params()
        }
    }
}

#[derive(Args)]
struct DeriveArgs {
    #[command(flatten)]
    net: NetworkArgs,

    /// Read a WIF private key instead of a recovery phrase.
    #[arg(long)]
    wif: bool,

    /// External address index (phrases only).
    #[arg(short, long, default_value_t = 0)]
    index: u32,
}

#[derive(Args)]
struct ValidateArgs {
    #[command(flatten)]
    net: NetworkArgs,

    /// Address to check.
    address: String,
}

#[derive(Args)]
struct StatusArgs {
    #[command(flatten)]
    net: NetworkArgs,

    /// Node RPC URL (default: https://127.0.0.1:<network RPC port>).
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,

    #[arg(long, env = "RPC_USER", default_value = "")]
    rpc_user: String,

    #[arg(long, env = "RPC_PASS", default_value = "", hide_env_values = true)]
    rpc_pass: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Genaddress(args) => genaddress(args),
        Commands::Mnemonic(args) => new_mnemonic(args),
        Commands::Derive(args) => derive(args),
        Commands::Validate(args) => validate(args),
        Commands::Status(args) => status(args).await,
    }
}

/// Print a random key's address and WIF.
fn genaddress(args: NetworkArgs) -> Result<()> {
    let params = args.params();
    let key = DerivedKey::random(params);
    print!("{}", render_key(&key, params, true));
    Ok(())
}

/// Create a phrase and print it with its first address.
fn new_mnemonic(args: NetworkArgs) -> Result<()> {
    let params = args.params();
    let phrase = generate_mnemonic().context("Failed to generate recovery phrase")?;
    let key = derive_from_mnemonic(&phrase, params, 0)?;

    println!("\n=== RECOVERY PHRASE (12 WORDS) ===");
    println!("  {phrase}");
    println!("\nWARNING: Anyone with this phrase can spend the funds. Store it offline.\n");
    print!("{}", render_key(&key, params, false));
    Ok(())
}

/// Prompt for a phrase or WIF without echo and print the derived address.
fn derive(args: DeriveArgs) -> Result<()> {
    let params = args.net.params();
    let key = if args.wif {
        let wif = prompt_secret("Enter WIF private key")?;
        derive_from_wif(&wif, params)?
    } else {
        let phrase = normalize_mnemonic(&prompt_secret("Enter recovery phrase")?);
        if !validate_mnemonic(&phrase) {
            bail!("Invalid mnemonic phrase");
        }
        derive_from_mnemonic(&phrase, params, args.index)?
    };
    print!("{}", render_key(&key, params, false));
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<()> {
    let params = args.net.params();
    match Address::parse(args.address.trim(), params) {
        Ok(addr) => {
            println!("valid {} address ({:?})", params.name(), addr.kind());
            Ok(())
        }
        Err(e) => bail!("{e}. {}", params.address_hint()),
    }
}

async fn status(args: StatusArgs) -> Result<()> {
    let params = args.net.params();
    let url = args
        .rpc_url
        .unwrap_or_else(|| format!("https://127.0.0.1:{}", params.default_rpc_port));
    debug!(%url, "checking node");

    let mut config = RpcConfig::new(url.clone())
        .with_credentials(args.rpc_user, args.rpc_pass)
        .with_timeout(Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS));
    config.accept_invalid_certs = true;
    let rpc = RpcClient::new(config)?;

    let height = rpc
        .check_connection()
        .await
        .with_context(|| format!("Node at {url} is not answering"))?;
    println!("Node connected ({}, block {height})", params.name());
    Ok(())
}

/// Prompt for a secret without echo.
fn prompt_secret(prompt: &str) -> Result<String> {
    rpassword::prompt_password(format!("{prompt}: ")).context("Failed to read input")
}

fn render_key(key: &DerivedKey, params: &NetworkParams, with_wif: bool) -> String {
    let mut out = format!("Network: {}\nAddress: {}\n", params.name(), key.address);
    if let Some(path) = &key.path {
        out.push_str(&format!("Path: {path}\n"));
    }
    if with_wif {
        out.push_str(&format!("WIF (backup): {}\n", key.to_wif(params)));
    }
    out
}
