//! On-chain governance: proposals and voting

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::context::Context;
use crate::error::Result;
use crate::rpc::{required_str, RpcClient};

/// Governance proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub status: ProposalStatus,
    pub voting_start_time: DateTime<Utc>,
    pub voting_end_time: DateTime<Utc>,
    pub tally: VoteTally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Voting,
    Passed,
    Rejected,
    Executed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub yes: String,
    pub no: String,
    pub abstain: String,
    pub no_with_veto: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes,
    No,
    Abstain,
    NoWithVeto,
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VoteOption::Yes => "yes",
            VoteOption::No => "no",
            VoteOption::Abstain => "abstain",
            VoteOption::NoWithVeto => "no_with_veto",
        })
    }
}

/// Vote intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub proposal_id: String,
    pub option: VoteOption,
    pub fee: String,
}

#[derive(Deserialize)]
struct ProposalList {
    #[serde(default)]
    proposals: Vec<Proposal>,
}

#[derive(Deserialize)]
struct StatusResult {
    status: ProposalStatus,
}

#[derive(Deserialize)]
struct VotingPowerResult {
    voting_power: String,
}

/// Governance operations
#[derive(Debug, Clone)]
pub struct GovernanceManager {
    rpc: RpcClient,
}

impl GovernanceManager {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// List proposals. A `limit` of zero lets the node choose.
    pub async fn get_proposals(&self, ctx: &Context, limit: usize) -> Result<Vec<Proposal>> {
        let mut params = Map::new();
        if limit > 0 {
            params.insert("limit".to_string(), json!(limit));
        }
        let list: ProposalList = self
            .rpc
            .call(ctx, "governance_getProposals", json!([params]))
            .await?;
        Ok(list.proposals)
    }

    pub async fn get_proposal(&self, ctx: &Context, proposal_id: &str) -> Result<Proposal> {
        self.rpc
            .call(ctx, "governance_getProposal", json!([proposal_id]))
            .await
    }

    /// Submit a new proposal. Returns the proposal id assigned by the node.
    pub async fn create_proposal(
        &self,
        ctx: &Context,
        title: &str,
        description: &str,
        proposer: &str,
        fee: &str,
    ) -> Result<String> {
        let params = json!({
            "title": title,
            "description": description,
            "proposer": proposer,
            "fee": fee,
        });
        let result: Map<String, Value> = self
            .rpc
            .call(ctx, "governance_createProposal", json!([params]))
            .await?;
        required_str(&result, "proposal_id", "proposal creation")
    }

    /// Cast a vote. Returns the transaction hash.
    pub async fn vote(&self, ctx: &Context, voter: &str, request: &VoteRequest) -> Result<String> {
        let params = json!({
            "proposal_id": request.proposal_id,
            "voter": voter,
            "option": request.option,
            "fee": request.fee,
        });
        self.submit(ctx, "governance_vote", params, "vote").await
    }

    pub async fn get_proposal_votes(&self, ctx: &Context, proposal_id: &str) -> Result<VoteTally> {
        self.rpc
            .call(ctx, "governance_getProposalVotes", json!([proposal_id]))
            .await
    }

    /// Votes cast by `voter`, keyed by proposal id.
    pub async fn get_voter_votes(
        &self,
        ctx: &Context,
        voter: &str,
    ) -> Result<HashMap<String, VoteOption>> {
        self.rpc
            .call(ctx, "governance_getVoterVotes", json!([voter]))
            .await
    }

    pub async fn execute_proposal(
        &self,
        ctx: &Context,
        proposal_id: &str,
        executor: &str,
        fee: &str,
    ) -> Result<String> {
        let params = json!({
            "proposal_id": proposal_id,
            "executor": executor,
            "fee": fee,
        });
        self.submit(ctx, "governance_executeProposal", params, "proposal execution")
            .await
    }

    /// Cancel a proposal. Only its proposer may do so.
    pub async fn cancel_proposal(
        &self,
        ctx: &Context,
        proposal_id: &str,
        proposer: &str,
        fee: &str,
    ) -> Result<String> {
        let params = json!({
            "proposal_id": proposal_id,
            "proposer": proposer,
            "fee": fee,
        });
        self.submit(ctx, "governance_cancelProposal", params, "proposal cancellation")
            .await
    }

    pub async fn get_proposal_status(
        &self,
        ctx: &Context,
        proposal_id: &str,
    ) -> Result<ProposalStatus> {
        let result: StatusResult = self
            .rpc
            .call(ctx, "governance_getProposalStatus", json!([proposal_id]))
            .await?;
        Ok(result.status)
    }

    pub async fn get_voting_power(&self, ctx: &Context, address: &str) -> Result<String> {
        let result: VotingPowerResult = self
            .rpc
            .call(ctx, "governance_getVotingPower", json!([address]))
            .await?;
        Ok(result.voting_power)
    }

    pub async fn get_governance_stats(&self, ctx: &Context) -> Result<Map<String, Value>> {
        self.rpc.call(ctx, "governance_getStats", ()).await
    }

    async fn submit(&self, ctx: &Context, method: &str, params: Value, what: &str) -> Result<String> {
        let result: Map<String, Value> = self.rpc.call(ctx, method, json!([params])).await?;
        required_str(&result, "tx_hash", what)
    }
}
