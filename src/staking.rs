//! Staking and delegation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::context::Context;
use crate::error::Result;
use crate::rpc::{required_str, RpcClient};

/// Validator information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,
    pub name: String,
    pub voting_power: String,
    pub commission: String,
    pub status: ValidatorStatus,
    pub total_delegated: String,
    pub delegator_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStatus {
    Active,
    Inactive,
    Jailed,
}

/// Delegation intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRequest {
    pub validator_address: String,
    pub amount: String,
    pub fee: String,
}

/// An active delegation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delegation {
    pub validator_address: String,
    pub amount: String,
    pub rewards: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingRewards {
    pub total: String,
    pub available: String,
    pub pending: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_claim: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ValidatorList {
    #[serde(default)]
    validators: Vec<Validator>,
}

#[derive(Deserialize)]
struct DelegationList {
    #[serde(default)]
    delegations: Vec<Delegation>,
}

/// Staking operations
#[derive(Debug, Clone)]
pub struct StakingManager {
    rpc: RpcClient,
}

impl StakingManager {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    pub async fn get_validators(&self, ctx: &Context) -> Result<Vec<Validator>> {
        let list: ValidatorList = self.rpc.call(ctx, "getValidators", ()).await?;
        Ok(list.validators)
    }

    pub async fn get_validator(&self, ctx: &Context, address: &str) -> Result<Validator> {
        self.rpc.call(ctx, "getValidator", json!([address])).await
    }

    /// Delegate `request.amount` to a validator. Returns the transaction hash.
    pub async fn delegate(
        &self,
        ctx: &Context,
        delegator: &str,
        request: &DelegationRequest,
    ) -> Result<String> {
        let params = json!({
            "delegator": delegator,
            "validator": request.validator_address,
            "amount": request.amount,
            "fee": request.fee,
        });
        self.submit(ctx, "staking_delegate", params, "delegation").await
    }

    /// Remove delegation from a validator. Returns the transaction hash.
    pub async fn undelegate(
        &self,
        ctx: &Context,
        delegator: &str,
        request: &DelegationRequest,
    ) -> Result<String> {
        let params = json!({
            "delegator": delegator,
            "validator": request.validator_address,
            "amount": request.amount,
            "fee": request.fee,
        });
        self.submit(ctx, "staking_undelegate", params, "undelegation").await
    }

    pub async fn get_delegations(&self, ctx: &Context, delegator: &str) -> Result<Vec<Delegation>> {
        let list: DelegationList = self.rpc.call(ctx, "getDelegations", json!([delegator])).await?;
        Ok(list.delegations)
    }

    pub async fn get_staking_rewards(&self, ctx: &Context, delegator: &str) -> Result<StakingRewards> {
        self.rpc.call(ctx, "getStakingRewards", json!([delegator])).await
    }

    pub async fn claim_rewards(
        &self,
        ctx: &Context,
        delegator: &str,
        validator: &str,
        fee: &str,
    ) -> Result<String> {
        let params = json!({
            "delegator": delegator,
            "validator": validator,
            "fee": fee,
        });
        self.submit(ctx, "staking_claimRewards", params, "claim rewards").await
    }

    pub async fn register_validator(
        &self,
        ctx: &Context,
        validator: &Validator,
        owner_address: &str,
        fee: &str,
    ) -> Result<String> {
        let params = json!({
            "validator": validator,
            "owner_address": owner_address,
            "fee": fee,
        });
        self.submit(ctx, "staking_registerValidator", params, "validator registration")
            .await
    }

    /// Update a validator's commission rate.
    pub async fn update_commission(
        &self,
        ctx: &Context,
        validator_address: &str,
        owner_address: &str,
        new_rate: u32,
        fee: &str,
    ) -> Result<String> {
        let params = json!({
            "validator_address": validator_address,
            "owner_address": owner_address,
            "new_rate": new_rate,
            "fee": fee,
        });
        self.submit(ctx, "staking_updateCommission", params, "commission update")
            .await
    }

    async fn submit(&self, ctx: &Context, method: &str, params: Value, what: &str) -> Result<String> {
        let result: Map<String, Value> = self.rpc.call(ctx, method, json!([params])).await?;
        required_str(&result, "tx_hash", what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::rpc::testing::ScriptedTransport;

    fn request() -> DelegationRequest {
        DelegationRequest {
            validator_address: "chert_val".to_string(),
            amount: "500".to_string(),
            fee: "0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_delegate_params_and_hash() {
        let node = ScriptedTransport::new();
        node.push_result(json!({"tx_hash": "0xdel"}));
        let staking = StakingManager::new(node.client());

        let hash = staking
            .delegate(&Context::background(), "chert_me", &request())
            .await
            .unwrap();
        assert_eq!(hash, "0xdel");

        let sent = node.last_request();
        assert_eq!(sent.method, "staking_delegate");
        assert_eq!(
            sent.params.unwrap(),
            json!([{"delegator": "chert_me", "validator": "chert_val", "amount": "500", "fee": "0.1"}])
        );
    }

    #[tokio::test]
    async fn test_missing_tx_hash() {
        let node = ScriptedTransport::new();
        node.push_result(json!({"hash": "0xdel"}));
        let err = StakingManager::new(node.client())
            .undelegate(&Context::background(), "chert_me", &request())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid undelegation response");
    }

    #[tokio::test]
    async fn test_get_validators_unwraps_list() {
        let node = ScriptedTransport::new();
        node.push_result(json!({"validators": [{
            "address": "chert_val",
            "name": "alpha",
            "voting_power": "1000",
            "commission": "0.05",
            "status": "active",
            "total_delegated": "900",
            "delegator_count": 12
        }]}));
        let validators = StakingManager::new(node.client())
            .get_validators(&Context::background())
            .await
            .unwrap();
        assert_eq!(validators.len(), 1);
        assert_eq!(validators[0].status, ValidatorStatus::Active);
        assert!(node.last_request().params.is_none());
    }

    #[tokio::test]
    async fn test_update_commission_rpc_error() {
        let node = ScriptedTransport::new();
        node.push_error(-32010, "not validator owner");
        let err = StakingManager::new(node.client())
            .update_commission(&Context::background(), "chert_val", "chert_me", 7, "0.1")
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), Some(-32010));
        assert!(matches!(err, Error::Rpc(_)));
    }

    #[tokio::test]
    async fn test_rewards_and_claim() {
        let node = ScriptedTransport::new();
        node.push_result(json!({"total": "5", "available": "3", "pending": "2"}));
        node.push_result(json!({"tx_hash": "0xclaim"}));
        let staking = StakingManager::new(node.client());
        let ctx = Context::background();

        let rewards = staking.get_staking_rewards(&ctx, "chert_me").await.unwrap();
        assert_eq!(rewards.available, "3");
        assert!(rewards.last_claim.is_none());

        let hash = staking.claim_rewards(&ctx, "chert_me", "chert_val", "0.1").await.unwrap();
        assert_eq!(hash, "0xclaim");
        assert_eq!(node.last_request().method, "staking_claimRewards");
    }
}
