//! Private transfer example: stealth keys, memo encryption and a private send

use chert_sdk::privacy::{PrivacyLevel, PrivateTransactionRequest};
use chert_sdk::{ChertClient, ClientConfig, Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("Chert Private Transfer Example");
    println!("==============================");

    let client = ChertClient::new(ClientConfig::from_env()?)?;
    let privacy = client.privacy();
    let ctx = Context::background();

    let sender = privacy.generate_stealth_keys();
    let recipient = privacy.generate_stealth_keys();
    let recipient_account = privacy.create_stealth_account(
        &recipient.view_keypair.public,
        &recipient.spend_keypair.public,
        None,
    );
    println!("✓ Recipient stealth address: {}", recipient_account.address);

    // Both sides arrive at the same secret
    let ours = privacy.derive_shared_secret(&sender.view_keypair.secret, &recipient.view_keypair.public)?;
    let theirs = privacy.derive_shared_secret(&recipient.view_keypair.secret, &sender.view_keypair.public)?;
    assert_eq!(ours, theirs);

    let sealed = privacy.encrypt_memo("invoice #42", &ours)?;
    println!("Encrypted memo: {}", sealed);
    println!("Recipient reads: {}", privacy.decrypt_memo(&sealed, &theirs)?);

    let request = PrivateTransactionRequest {
        sender_keys: sender,
        amount: "25".to_string(),
        fee: "0.05".to_string(),
        memo: Some("invoice #42".to_string()),
        privacy_level: PrivacyLevel::Stealth,
        nonce: 0,
    };
    match privacy
        .send_private_transaction(
            &ctx,
            &request,
            &recipient.view_keypair.public,
            &recipient.spend_keypair.public,
        )
        .await
    {
        Ok(tx_id) => println!("✓ Private transfer submitted: {}", tx_id),
        Err(e) => println!("⚠ Private transfer failed: {}", e),
    }

    Ok(())
}
