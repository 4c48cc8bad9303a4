//! Staking and governance example: delegate to the first validator and vote

use chert_sdk::governance::{VoteOption, VoteRequest};
use chert_sdk::staking::DelegationRequest;
use chert_sdk::{ChertClient, ClientConfig, Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("Chert Staking & Governance Example");
    println!("==================================");

    let client = ChertClient::new(ClientConfig::from_env()?)?;
    let ctx = Context::background();
    let account = client.wallet().create_account()?;

    let validators = client.staking().get_validators(&ctx).await?;
    println!("Found {} validators", validators.len());

    if let Some(validator) = validators.first() {
        let request = DelegationRequest {
            validator_address: validator.address.clone(),
            amount: "100".to_string(),
            fee: "0.01".to_string(),
        };
        let hash = client.staking().delegate(&ctx, &account.address, &request).await?;
        println!("✓ Delegated to {}: {}", validator.name, hash);

        let rewards = client.staking().get_staking_rewards(&ctx, &account.address).await?;
        println!("Rewards: {} available, {} pending", rewards.available, rewards.pending);
    }

    let power = client.governance().get_voting_power(&ctx, &account.address).await?;
    println!("Voting power: {}", power);

    let proposals = client.governance().get_proposals(&ctx, 5).await?;
    for proposal in &proposals {
        println!("#{} {} ({:?})", proposal.id, proposal.title, proposal.status);
    }

    if let Some(proposal) = proposals.first() {
        let vote = VoteRequest {
            proposal_id: proposal.id.clone(),
            option: VoteOption::Yes,
            fee: "0.01".to_string(),
        };
        let hash = client.governance().vote(&ctx, &account.address, &vote).await?;
        println!("✓ Voted {} on #{}: {}", vote.option, proposal.id, hash);
    }

    Ok(())
}
