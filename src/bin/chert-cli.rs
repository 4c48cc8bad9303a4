//! Chert CLI - Command-line interface for the Chert SDK
//!
//! Queries node status and blocks, manages local accounts, sends transfers
//! and lists validators and governance proposals.
//!
//! Connection settings default to the `CHERT_*` environment variables and
//! can be overridden with flags.

use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;

use chert_sdk::wallet::Account;
use chert_sdk::{ChertClient, ClientConfig, Context, Network, TransactionRequest};

#[derive(Parser)]
#[command(name = "chert-cli")]
#[command(about = "Chert SDK Command Line Interface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API endpoint URL
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Network to use (mainnet, testnet, devnet)
    #[arg(short, long, global = true)]
    network: Option<Network>,

    /// Bearer token sent with every request
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show network status
    Status,
    /// Show a block (latest when no height is given)
    Block {
        height: Option<u64>,
    },
    /// Account management commands
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Check the balance of an address
    Balance {
        address: String,
    },
    /// Sign and send a transfer
    Send {
        /// Hex-encoded private key of the sender
        #[arg(long, env = "CHERT_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
        /// Recipient address
        #[arg(short, long)]
        to: String,
        /// Amount as a decimal string
        #[arg(short, long)]
        amount: String,
        /// Fee as a decimal string
        #[arg(short, long)]
        fee: String,
        /// Optional memo
        #[arg(short, long)]
        memo: Option<String>,
        /// Sender nonce
        #[arg(long)]
        nonce: Option<u64>,
        /// Wait for confirmation after submitting
        #[arg(short, long)]
        wait: bool,
    },
    /// Wait for a transaction to be confirmed
    Wait {
        hash: String,
        /// Maximum wait in seconds (default: 60)
        #[arg(long)]
        max_wait: Option<u64>,
    },
    /// List validators
    Validators,
    /// List governance proposals
    Proposals {
        /// Maximum number of proposals (0 lets the node decide)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Generate a new key pair
    Create,
    /// Derive the account of an existing private key
    Import {
        #[arg(env = "CHERT_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
    /// Derive a watch-only account from a public key
    Watch {
        public_key: String,
    },
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("reading CHERT_* environment")?;
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint);
    }
    if let Some(network) = cli.network {
        config = config.with_network(network);
    }
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn print_account(account: &Account, show_secret: bool) {
    println!("Address:     {}", account.address);
    println!("Public Key:  {}", account.public_key);
    match &account.private_key {
        Some(secret) if show_secret => println!("Private Key: {}", secret.expose_secret()),
        Some(_) => {}
        None => println!("Watch-only:  yes"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose { "debug" } else { "info" })
        .with_writer(std::io::stderr)
        .init();

    let client = ChertClient::new(build_config(&cli)?).context("creating client")?;
    let ctx = Context::background();

    match &cli.command {
        Commands::Status => {
            let status = client.get_network_status(&ctx).await?;
            println!("Network Status");
            println!("==============");
            println!("Network ID:        {}", status.network_id);
            println!("Block Height:      {}", status.block_height);
            println!("Consensus Version: {}", status.consensus_version);
            println!("Peers:             {}", status.peer_count);
            println!("Syncing:           {}", status.syncing);
            println!("Latest Block Time: {}", status.latest_block_time);
        }
        Commands::Block { height } => {
            let block = match height {
                Some(height) => client.get_block(&ctx, *height).await?,
                None => client.get_latest_block(&ctx).await?,
            };
            println!("Block {}", block.height);
            println!("Hash:          {}", block.hash);
            println!("Previous Hash: {}", block.previous_hash);
            println!("Timestamp:     {}", block.timestamp);
            println!("Proposer:      {}", block.proposer);
            println!("Transactions:  {}", block.transaction_count);
            for tx in &block.transactions {
                println!("  {} {} -> {} ({})", tx.hash, tx.from, tx.to, tx.amount);
            }
        }
        Commands::Account { action } => match action {
            AccountAction::Create => {
                let account = client.wallet().create_account()?;
                println!("✓ Account created on {}", client.config().network);
                print_account(&account, true);
                println!("\nKeep the private key safe; it cannot be recovered.");
            }
            AccountAction::Import { private_key } => {
                let account = client.wallet().import_account(private_key)?;
                print_account(&account, false);
            }
            AccountAction::Watch { public_key } => {
                let account = client.wallet().create_watch_only_account(public_key)?;
                print_account(&account, false);
            }
        },
        Commands::Balance { address } => {
            let balance = client.wallet().get_balance(&ctx, address).await?;
            println!("Available: {}", balance.available);
            println!("Pending:   {}", balance.pending);
            println!("Total:     {}", balance.total);
        }
        Commands::Send {
            private_key,
            to,
            amount,
            fee,
            memo,
            nonce,
            wait,
        } => {
            let account = client.wallet().import_account(private_key)?;
            let mut request = TransactionRequest::new(to, amount, fee);
            if let Some(memo) = memo {
                request = request.with_memo(memo);
            }
            if let Some(nonce) = nonce {
                request = request.with_nonce(*nonce);
            }

            let hash = client
                .wallet()
                .send_transaction(&ctx, &request, &account)
                .await?;
            println!("✓ Transaction submitted: {}", hash);

            if *wait {
                println!("Waiting for confirmation...");
                let tx = client.wallet().wait_for_transaction(&ctx, &hash, None).await?;
                println!("✓ Confirmed in block {}", display_height(tx.block_height));
            }
        }
        Commands::Wait { hash, max_wait } => {
            let tx = client
                .wallet()
                .wait_for_transaction(&ctx, hash, max_wait.map(Duration::from_secs))
                .await?;
            println!("✓ Transaction {} confirmed", tx.hash);
            println!("Block:  {}", display_height(tx.block_height));
            println!("Amount: {}", tx.amount);
            println!("Fee:    {}", tx.fee);
        }
        Commands::Validators => {
            let validators = client.staking().get_validators(&ctx).await?;
            if validators.is_empty() {
                println!("No validators found.");
            }
            for (idx, v) in validators.iter().enumerate() {
                println!("\n{}. {} ({})", idx + 1, v.name, v.address);
                println!("   Status:       {:?}", v.status);
                println!("   Voting Power: {}", v.voting_power);
                println!("   Commission:   {}", v.commission);
                println!("   Delegated:    {} from {} delegators", v.total_delegated, v.delegator_count);
            }
        }
        Commands::Proposals { limit } => {
            let proposals = client.governance().get_proposals(&ctx, *limit).await?;
            if proposals.is_empty() {
                println!("No proposals found.");
            }
            for p in &proposals {
                println!("\n#{} {}", p.id, p.title);
                println!("   Status:   {:?}", p.status);
                println!("   Proposer: {}", p.proposer);
                println!("   Voting:   {} .. {}", p.voting_start_time, p.voting_end_time);
                println!(
                    "   Tally:    yes {} / no {} / abstain {} / veto {}",
                    p.tally.yes, p.tally.no, p.tally.abstain, p.tally.no_with_veto
                );
            }
        }
    }

    Ok(())
}

fn display_height(height: Option<u64>) -> String {
    height.map_or_else(|| "unknown".to_string(), |h| h.to_string())
}
