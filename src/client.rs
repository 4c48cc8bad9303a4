//! Client facade for connecting to a Chert node

use std::sync::Arc;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::governance::GovernanceManager;
use crate::privacy::PrivacyManager;
use crate::rpc::{ApiError, ApiResponse, HttpTransport, RpcClient, RpcTransport};
use crate::staking::StakingManager;
use crate::transaction;
use crate::types::{Block, NetworkStatus, Transaction};
use crate::wallet::WalletManager;

/// Main entry point of the SDK.
///
/// Owns the configuration and one shared [`RpcClient`]; every manager gets a
/// clone of that RPC handle and nothing else.
///
/// # Example
/// ```no_run
/// use chert_sdk::{ChertClient, ClientConfig, Context};
///
/// # async fn example() -> chert_sdk::Result<()> {
/// let client = ChertClient::new(ClientConfig::default())?;
/// let ctx = Context::with_timeout(std::time::Duration::from_secs(10));
/// let status = client.get_network_status(&ctx).await?;
/// println!("height {}", status.block_height);
/// # Ok(())
/// # }
/// ```
pub struct ChertClient {
    config: ClientConfig,
    http: reqwest::Client,
    rpc: RpcClient,
    wallet: WalletManager,
    privacy: PrivacyManager,
    staking: StakingManager,
    governance: GovernanceManager,
}

impl ChertClient {
    /// Create a client speaking JSON-RPC over HTTP. Empty/zero config values
    /// fall back to defaults.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.normalized();
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        let http = transport.http_client().clone();
        Ok(Self::assemble(config, http, Arc::new(transport)))
    }

    /// Create a client whose RPC calls go through a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn RpcTransport>) -> Result<Self> {
        let config = config.normalized();
        config.validate()?;
        let http = HttpTransport::build_client(&config)?;
        Ok(Self::assemble(config, http, transport))
    }

    fn assemble(config: ClientConfig, http: reqwest::Client, transport: Arc<dyn RpcTransport>) -> Self {
        let rpc = RpcClient::from_arc(transport);
        Self {
            wallet: WalletManager::new(rpc.clone(), config.network),
            privacy: PrivacyManager::new(rpc.clone()),
            staking: StakingManager::new(rpc.clone()),
            governance: GovernanceManager::new(rpc.clone()),
            config,
            http,
            rpc,
        }
    }

    pub fn wallet(&self) -> &WalletManager {
        &self.wallet
    }

    pub fn privacy(&self) -> &PrivacyManager {
        &self.privacy
    }

    pub fn staking(&self) -> &StakingManager {
        &self.staking
    }

    pub fn governance(&self) -> &GovernanceManager {
        &self.governance
    }

    /// The shared JSON-RPC handle, for methods the managers do not wrap.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get_network_status(&self, ctx: &Context) -> Result<NetworkStatus> {
        self.rpc.call(ctx, "getNetworkStatus", ()).await
    }

    pub async fn get_latest_block(&self, ctx: &Context) -> Result<Block> {
        self.rpc.call(ctx, "getLatestBlock", ()).await
    }

    pub async fn get_block(&self, ctx: &Context, height: u64) -> Result<Block> {
        self.rpc.call(ctx, "getBlock", json!([height])).await
    }

    pub async fn get_transaction(&self, ctx: &Context, hash: &str) -> Result<Transaction> {
        transaction::fetch(&self.rpc, ctx, hash).await
    }

    /// Whether the node answers `getNetworkStatus`.
    pub async fn is_connected(&self, ctx: &Context) -> bool {
        self.get_network_status(ctx).await.is_ok()
    }

    /// Call a REST-style endpoint at `endpoint + path`.
    ///
    /// These endpoints wrap their payload as `{data, success, error}`. An HTTP
    /// status of 400 or above, or `success: false`, becomes an error.
    pub async fn request<T, B>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        ctx.check()?;

        let url = format!("{}{}", self.config.endpoint.trim_end_matches('/'), path);
        let mut req = self.http.request(method.clone(), &url);
        if !self.config.headers.keys().any(|k| k.eq_ignore_ascii_case("accept")) {
            req = req.header(ACCEPT, HeaderValue::from_static("application/json"));
        }
        if let Some(body) = body {
            req = req.body(serde_json::to_vec(body).map_err(Error::Marshal)?);
        }

        debug!(%method, path, "sending API request");
        let (status, bytes) = ctx
            .run(async {
                let response = req.send().await?;
                let status = response.status();
                Ok::<_, Error>((status, response.bytes().await?))
            })
            .await?;

        if status.as_u16() >= 400 {
            return Err(match serde_json::from_slice::<ApiError>(&bytes) {
                Ok(api_err) => Error::Api(api_err),
                Err(_) => Error::HttpStatus {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                },
            });
        }

        let api_resp: ApiResponse = serde_json::from_slice(&bytes).map_err(Error::Decode)?;
        if !api_resp.success {
            return Err(Error::Api(api_resp.error.unwrap_or_else(|| ApiError {
                code: "request_failed".to_string(),
                message: "API request failed".to_string(),
                data: None,
            })));
        }

        let payload = api_resp.data.as_deref().map_or("null", |raw| raw.get());
        serde_json::from_str(payload).map_err(Error::ResultShape)
    }
}
