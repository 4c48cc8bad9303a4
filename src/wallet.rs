//! Account management and transfers

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use tracing::{debug, info_span, Instrument};

use crate::address::{generate_address, generate_tx_id};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::rpc::RpcClient;
use crate::signer::{Ed25519Signer, Signer};
use crate::transaction::{self, ConfirmationPoller, UnsignedTransaction};
use crate::types::{utils::redact_middle, Balance, Fee, Network, Transaction, TransactionRequest};

/// A key-based account.
///
/// Accounts without a private key are watch-only: they can be queried but
/// cannot sign.
pub struct Account {
    pub address: String,
    pub public_key: String,
    pub private_key: Option<SecretString>,
}

impl Account {
    pub fn is_watch_only(&self) -> bool {
        self.private_key.is_none()
    }

    /// Signing capability for this account.
    pub fn signer(&self) -> Result<Ed25519Signer> {
        let secret = self.private_key.as_ref().ok_or(Error::MissingPrivateKey)?;
        Ed25519Signer::from_secret(secret)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .field("watch_only", &self.is_watch_only())
            .finish()
    }
}

/// Wallet operations: accounts, balances and transfers
#[derive(Debug, Clone)]
pub struct WalletManager {
    rpc: RpcClient,
    network: Network,
}

impl WalletManager {
    pub fn new(rpc: RpcClient, network: Network) -> Self {
        Self { rpc, network }
    }

    /// Create a new account with a freshly generated Ed25519 key pair.
    pub fn create_account(&self) -> Result<Account> {
        self.account_from_signer(Ed25519Signer::generate())
    }

    /// Import an account from a hex-encoded 32-byte private key.
    pub fn import_account(&self, private_key: &str) -> Result<Account> {
        self.account_from_signer(Ed25519Signer::from_hex(private_key)?)
    }

    /// Create a watch-only account from a hex-encoded public key.
    pub fn create_watch_only_account(&self, public_key: &str) -> Result<Account> {
        let public_key = public_key.trim().to_lowercase();
        Ok(Account {
            address: generate_address(&public_key, self.network)?,
            public_key,
            private_key: None,
        })
    }

    fn account_from_signer(&self, signer: Ed25519Signer) -> Result<Account> {
        let public_key = signer.public_key();
        Ok(Account {
            address: generate_address(&public_key, self.network)?,
            public_key,
            private_key: Some(signer.secret_hex()),
        })
    }

    /// Get the balance of an address.
    pub async fn get_balance(&self, ctx: &Context, address: &str) -> Result<Balance> {
        self.rpc.call(ctx, "getBalance", json!([address])).await
    }

    /// Sign `request` with `account` and submit it. Returns the transaction hash.
    ///
    /// Fails with [`Error::MissingPrivateKey`] for watch-only accounts before
    /// anything is sent.
    pub async fn send_transaction(
        &self,
        ctx: &Context,
        request: &TransactionRequest,
        account: &Account,
    ) -> Result<String> {
        let signer = account.signer()?;
        let local_id = generate_tx_id();
        let span = info_span!(
            "send_transaction",
            local_id = %local_id,
            from = %redact_middle(&account.address, 10, 4)
        );

        async {
            let signed = UnsignedTransaction::new(account.address.clone(), request.clone())
                .sign(&signer)?;
            debug!("transaction signed");
            transaction::submit(&self.rpc, ctx, &signed).await
        }
        .instrument(span)
        .await
    }

    /// Estimate the fee of a transfer. The estimate is advisory.
    pub async fn estimate_fee(&self, ctx: &Context, request: &TransactionRequest) -> Result<Fee> {
        self.rpc.call(ctx, "estimateFee", json!([request])).await
    }

    /// Get a transaction by hash.
    pub async fn get_transaction(&self, ctx: &Context, hash: &str) -> Result<Transaction> {
        transaction::fetch(&self.rpc, ctx, hash).await
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// `timeout` of `None` or zero uses the 60 second default. See
    /// [`ConfirmationPoller::await_confirmation`] for the meaning of each
    /// outcome, in particular that a timeout leaves the transaction's fate
    /// unknown.
    pub async fn wait_for_transaction(
        &self,
        ctx: &Context,
        hash: &str,
        timeout: Option<Duration>,
    ) -> Result<Transaction> {
        ConfirmationPoller::new(self.rpc.clone())
            .with_timeout(timeout.unwrap_or_default())
            .await_confirmation(ctx, hash)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::is_valid_address;
    use crate::rpc::testing::ScriptedTransport;
    use crate::signer::verify_signature;
    use crate::transaction::SignedTransaction;
    use secrecy::ExposeSecret;
    use std::sync::Arc;

    fn manager() -> (Arc<ScriptedTransport>, WalletManager) {
        let node = ScriptedTransport::new();
        let wallet = WalletManager::new(node.client(), Network::Mainnet);
        (node, wallet)
    }

    #[test]
    fn test_create_account() {
        let (_, wallet) = manager();
        let account = wallet.create_account().unwrap();
        assert!(is_valid_address(&account.address, Network::Mainnet));
        assert!(!account.is_watch_only());
        assert_ne!(
            account.public_key,
            *account.private_key.as_ref().unwrap().expose_secret()
        );
    }

    #[test]
    fn test_import_matches_created() {
        let (_, wallet) = manager();
        let created = wallet.create_account().unwrap();
        let secret = created.private_key.as_ref().unwrap().expose_secret().clone();
        let imported = wallet.import_account(&secret).unwrap();
        assert_eq!(created.address, imported.address);
        assert_eq!(created.public_key, imported.public_key);
    }

    #[test]
    fn test_watch_only_cannot_sign() {
        let (_, wallet) = manager();
        let created = wallet.create_account().unwrap();
        let watch = wallet.create_watch_only_account(&created.public_key).unwrap();
        assert_eq!(watch.address, created.address);
        assert!(watch.is_watch_only());
        assert!(matches!(watch.signer(), Err(Error::MissingPrivateKey)));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let (_, wallet) = manager();
        let account = wallet.create_account().unwrap();
        let secret = account.private_key.as_ref().unwrap().expose_secret().clone();
        assert!(!format!("{:?}", account).contains(&secret));
    }

    #[tokio::test]
    async fn test_send_transaction_scenario() {
        let (node, wallet) = manager();
        let account = wallet.create_account().unwrap();
        node.push_result(json!({"hash": "0xabc"}));

        let request = TransactionRequest::new("addrB", "100.0", "0.1");
        let hash = wallet
            .send_transaction(&Context::background(), &request, &account)
            .await
            .unwrap();
        assert_eq!(hash, "0xabc");

        let sent = node.last_request();
        assert_eq!(sent.method, "sendTransaction");
        let params = sent.params.unwrap();
        let payload: SignedTransaction = serde_json::from_value(params[0].clone()).unwrap();
        assert_eq!(payload.sender, account.address);
        assert_eq!(payload.recipient, "addrB");
        assert_eq!(payload.amount, "100.0");
        assert_eq!(payload.fee, "0.1");

        let signed_bytes = UnsignedTransaction::new(account.address.clone(), request)
            .signing_bytes()
            .unwrap();
        assert!(verify_signature(&account.public_key, &signed_bytes, &payload.signature).unwrap());
    }

    #[tokio::test]
    async fn test_send_from_watch_only_sends_nothing() {
        let (node, wallet) = manager();
        let created = wallet.create_account().unwrap();
        let watch = wallet.create_watch_only_account(&created.public_key).unwrap();
        let err = wallet
            .send_transaction(
                &Context::background(),
                &TransactionRequest::new("addrB", "1", "0.1"),
                &watch,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingPrivateKey));
        assert!(node.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_request() {
        let (node, wallet) = manager();
        let ctx = Context::background();
        ctx.cancel();
        let err = wallet.get_balance(&ctx, "chert_x").await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(node.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_balance_and_fee() {
        let (node, wallet) = manager();
        node.push_result(json!({"available": "10", "pending": "1", "total": "11"}));
        node.push_result(json!({"amount": "0.01", "gas_limit": 21000}));
        let ctx = Context::background();

        let balance = wallet.get_balance(&ctx, "chert_x").await.unwrap();
        assert_eq!(balance.total, "11");
        assert_eq!(node.last_request().params.unwrap(), json!(["chert_x"]));

        let fee = wallet
            .estimate_fee(&ctx, &TransactionRequest::new("addrB", "1", "0.1"))
            .await
            .unwrap();
        assert_eq!(fee.amount, "0.01");
        assert_eq!(fee.gas_limit, Some(21000));
        assert_eq!(fee.gas_price, None);
        assert_eq!(node.last_request().method, "estimateFee");
    }
}
