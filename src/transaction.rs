//! Transaction lifecycle: build, sign, submit, await confirmation
//!
//! ```text
//! UnsignedTransaction --sign--> SignedTransaction --submit--> hash
//!     hash --ConfirmationPoller--> Confirmed | Failed/Rejected | timeout
//! ```
//!
//! The node owns the transaction's status; the client only observes it by
//! polling `getTransaction` at a fixed interval within a bounded budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::rpc::{required_str, RpcClient};
use crate::signer::Signer;
use crate::types::{Transaction, TransactionRequest, TransactionStatus};

/// Budget used when the caller passes no confirmation timeout
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between two status fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Fields covered by the signature, in canonical order.
#[derive(Serialize)]
struct SigningPayload<'a> {
    sender: &'a str,
    recipient: &'a str,
    amount: &'a str,
    fee: &'a str,
    nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    memo: Option<&'a str>,
}

/// A transfer intent bound to its sender, not yet signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    sender: String,
    request: TransactionRequest,
}

impl UnsignedTransaction {
    pub fn new(sender: impl Into<String>, request: TransactionRequest) -> Self {
        Self {
            sender: sender.into(),
            request,
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    /// Canonical byte encoding the signature is computed over.
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        let payload = SigningPayload {
            sender: &self.sender,
            recipient: &self.request.to,
            amount: &self.request.amount,
            fee: &self.request.fee,
            nonce: self.request.nonce.unwrap_or_default(),
            memo: self.request.memo.as_deref(),
        };
        serde_json::to_vec(&payload).map_err(Error::Marshal)
    }

    pub fn sign(self, signer: &dyn Signer) -> Result<SignedTransaction> {
        let signature = signer.sign(&self.signing_bytes()?)?;
        Ok(SignedTransaction {
            sender: self.sender,
            recipient: self.request.to,
            amount: self.request.amount,
            fee: self.request.fee,
            nonce: self.request.nonce.unwrap_or_default(),
            signature: hex::encode(signature),
            memo: self.request.memo,
        })
    }
}

/// Wire payload of `sendTransaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub sender: String,
    pub recipient: String,
    pub amount: String,
    pub fee: String,
    pub nonce: u64,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Submit a signed transaction and return the hash assigned by the node.
pub async fn submit(rpc: &RpcClient, ctx: &Context, tx: &SignedTransaction) -> Result<String> {
    let result: Map<String, Value> = rpc.call(ctx, "sendTransaction", json!([tx])).await?;
    let hash = required_str(&result, "hash", "transaction")?;
    info!(hash = %hash, "transaction submitted");
    Ok(hash)
}

/// Fetch a transaction snapshot by hash.
pub async fn fetch(rpc: &RpcClient, ctx: &Context, hash: &str) -> Result<Transaction> {
    rpc.call(ctx, "getTransaction", json!([hash])).await
}

/// Polls a submitted transaction until it reaches a terminal status.
#[derive(Debug, Clone)]
pub struct ConfirmationPoller {
    rpc: RpcClient,
    interval: Duration,
    timeout: Duration,
}

impl ConfirmationPoller {
    pub fn new(rpc: RpcClient) -> Self {
        Self {
            rpc,
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the total budget. A zero duration selects the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            DEFAULT_CONFIRMATION_TIMEOUT
        } else {
            timeout
        };
        self
    }

    /// Wait until `hash` is confirmed.
    ///
    /// A failed fetch (e.g. the node has not indexed the hash yet) is treated
    /// as "not yet available" and polling continues. `Failed`/`Rejected`
    /// end the wait with [`Error::TransactionFailed`].
    ///
    /// [`Error::ConfirmationTimeout`] means no terminal status was seen within
    /// the budget; the transaction may still confirm afterwards. The budget
    /// also bounds each fetch, so a node that stops answering cannot hold the
    /// wait open. Context cancellation aborts the wait immediately.
    pub async fn await_confirmation(&self, ctx: &Context, hash: &str) -> Result<Transaction> {
        let start = Instant::now();
        // None: the budget lies beyond any representable instant.
        let budget_end = start.checked_add(self.timeout);
        let poll_ctx = match budget_end {
            Some(end) => ctx.child().deadline_at(end),
            None => ctx.child(),
        };
        let budget_binds = match (budget_end, ctx.deadline()) {
            (Some(end), Some(caller)) => end < caller,
            (Some(_), None) => true,
            (None, _) => false,
        };

        match self.poll(&poll_ctx, hash, start, budget_end).await {
            Err(Error::DeadlineExceeded) if budget_binds => {
                warn!(hash, "confirmation budget exhausted during fetch");
                Err(Error::ConfirmationTimeout {
                    hash: hash.to_string(),
                    waited: start.elapsed(),
                })
            }
            outcome => outcome,
        }
    }

    async fn poll(
        &self,
        ctx: &Context,
        hash: &str,
        start: Instant,
        budget_end: Option<Instant>,
    ) -> Result<Transaction> {
        let mut polls = 0u32;

        loop {
            ctx.check()?;
            polls += 1;

            match fetch(&self.rpc, ctx, hash).await {
                Ok(tx) => match tx.status {
                    TransactionStatus::Confirmed => {
                        info!(hash, polls, height = ?tx.block_height, "transaction confirmed");
                        return Ok(tx);
                    }
                    TransactionStatus::Failed | TransactionStatus::Rejected => {
                        warn!(hash, status = %tx.status, "transaction reached failure status");
                        return Err(Error::TransactionFailed {
                            hash: hash.to_string(),
                            status: tx.status,
                        });
                    }
                    TransactionStatus::Pending => debug!(hash, polls, "transaction pending"),
                },
                Err(err) if err.is_cancellation() => return Err(err),
                Err(err) => debug!(hash, polls, error = %err, "transaction not available yet"),
            }

            let now = Instant::now();
            if let Some(end) = budget_end {
                if now.checked_add(self.interval).map_or(true, |next| next >= end) {
                    return Err(Error::ConfirmationTimeout {
                        hash: hash.to_string(),
                        waited: now - start,
                    });
                }
            }
            ctx.sleep(self.interval).await?;
        }
    }
}
