//! Basic usage: connect, create an account, send a transfer and wait for it

use std::time::Duration;

use chert_sdk::{ChertClient, ClientConfig, Context, Error, Result, TransactionRequest};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Chert Basic Usage Example");
    println!("=========================");

    let config = ClientConfig::from_env()?;
    let client = ChertClient::new(config)?;
    println!("✓ Client configured for {} at {}", client.config().network, client.config().endpoint);

    let ctx = Context::with_timeout(Duration::from_secs(120));

    match client.get_network_status(&ctx).await {
        Ok(status) => println!("✓ Connected: {} at height {}", status.network_id, status.block_height),
        Err(e) => {
            println!("⚠ Could not reach node: {}", e);
            return Ok(());
        }
    }

    let account = client.wallet().create_account()?;
    println!("✓ Account created: {}", account.address);

    let balance = client.wallet().get_balance(&ctx, &account.address).await?;
    println!("Balance: {} available, {} pending", balance.available, balance.pending);

    let request = TransactionRequest::new("chert_0000000000000000000000000000000000000000", "1.5", "0.01")
        .with_memo("hello from the Rust SDK");

    let fee = client.wallet().estimate_fee(&ctx, &request).await?;
    println!("Estimated fee: {}", fee.amount);

    let hash = match client.wallet().send_transaction(&ctx, &request, &account).await {
        Ok(hash) => hash,
        Err(Error::Rpc(e)) => {
            println!("⚠ Node rejected the transfer ({}): {}", e.code, e.message);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    println!("✓ Submitted: {}", hash);

    match client.wallet().wait_for_transaction(&ctx, &hash, None).await {
        Ok(tx) => println!("✓ Confirmed at height {:?}", tx.block_height),
        Err(Error::ConfirmationTimeout { waited, .. }) => {
            println!("⚠ Not confirmed after {:?}; the transfer may still land", waited)
        }
        Err(e) => println!("⚠ Transfer did not go through: {}", e),
    }

    Ok(())
}
