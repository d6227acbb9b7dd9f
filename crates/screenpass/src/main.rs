//! Screenpass checkout driver: connect a wallet and buy pay-per-view items
//! from the command line.
//!
//! Configuration priority: CLI args > environment variables > defaults.

use clap::{Parser, Subcommand};
use eyre::eyre;

use screenpass_checkout_adapters::{
    CheckoutConfig, Eip1193Adapter, NftContractAdapter, SystemClockAdapter,
};
use screenpass_checkout_core::{CheckoutOrchestrator, ConnectionState, PurchaseOutcome};

#[derive(Parser, Debug)]
#[command(name = "screenpass")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wallet connection and NFT purchase checkout", long_about = None)]
struct Cli {
    /// JSON-RPC endpoint of the EIP-1193 provider bridge
    #[arg(long, env = "SCREENPASS_PROVIDER_BRIDGE_URL")]
    bridge_url: Option<String>,

    /// Deployed NFT contract address
    #[arg(long, env = "SCREENPASS_CONTRACT_ADDRESS")]
    contract: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect the wallet and negotiate the required chain
    Connect,
    /// Buy one item
    Buy {
        /// Item id (the on-chain token id)
        item: String,
        /// Price in native currency, e.g. 0.0001
        price: String,
    },
    /// Print the configured deployment
    Status,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = CheckoutConfig::read_env()?;
    if let Some(url) = cli.bridge_url {
        config.provider_bridge_url = Some(url);
    }
    if let Some(raw) = cli.contract {
        config.contract_address = raw
            .parse()
            .map_err(|e| eyre!("invalid contract address {raw:?}: {e}"))?;
    }
    config.validate()?;

    let orchestrator = CheckoutOrchestrator::new(
        Eip1193Adapter::with_config(&config),
        NftContractAdapter::with_config(&config),
        SystemClockAdapter,
        config.required_chain.clone(),
    );

    match cli.command {
        Command::Connect => {
            let state = orchestrator.connect_wallet()?;
            println!("session: {}", state.name());
            if let ConnectionState::Connected { account, chain_id } = state {
                println!("account: {account}");
                println!("chain:   {chain_id}");
            }
        }
        Command::Buy { item, price } => {
            orchestrator.connect_wallet()?;
            match orchestrator.purchase(&item, &price)? {
                PurchaseOutcome::Confirmed(receipt) => {
                    println!(
                        "confirmed: tx {} in block {}",
                        receipt.tx_hash, receipt.block_number
                    );
                }
                PurchaseOutcome::Rejected { reason } => {
                    println!("cancelled: {reason}");
                }
                PurchaseOutcome::Failed { error } => {
                    return Err(eyre!("purchase failed: {error}"));
                }
            }
        }
        Command::Status => {
            println!(
                "chain:    {} ({})",
                config.required_chain.display_name,
                config.required_chain.chain_id_hex()
            );
            println!("contract: {}", config.contract_address);
            println!(
                "bridge:   {}",
                config
                    .provider_bridge_url
                    .as_deref()
                    .unwrap_or("deterministic (in-memory)")
            );
        }
    }
    Ok(())
}
