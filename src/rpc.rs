//! JSON-RPC 2.0 transport
//!
//! [`RpcClient`] is the single call contract every manager goes through: it
//! builds the envelope, hands the bytes to an [`RpcTransport`], and decodes
//! either a typed result or the node's error object.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{ClientConfig, SDK_VERSION};
use crate::context::Context;
use crate::error::{Error, Result};

/// Protocol version tag carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// RPC request structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: u64,
}

/// RPC response structure; `result` is kept raw until the caller's type is known
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Option<Box<RawValue>>,
    #[serde(default)]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// RPC error structure, returned verbatim from the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// Envelope used by the REST-style auxiliary endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// Error object of the REST-style auxiliary endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Moves one serialized envelope to the node and returns the raw response body.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, body: Vec<u8>) -> Result<Vec<u8>>;
}

/// HTTP POST transport backed by `reqwest`
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from client configuration (endpoint, timeout, headers).
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            http: Self::build_client(config)?,
        })
    }

    /// The configured HTTP client, shared with the REST helper.
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn build_client(config: &ClientConfig) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(config.header_map()?)
            .user_agent(format!("chert-sdk-rust/{}", SDK_VERSION))
            .build()?)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        let response = self.http.post(&self.endpoint).body(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();

        // Some nodes pair an error envelope with a non-2xx status; let the
        // caller surface the structured error in that case.
        if !status.is_success() && !carries_rpc_error(&bytes) {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes)
    }
}

fn carries_rpc_error(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .map(|v| v.get("error").map_or(false, |e| e.is_object()))
        .unwrap_or(false)
}

/// Shared JSON-RPC call contract.
///
/// Cheap to clone; clones share the same transport. Safe to use from many
/// tasks at once, since each call is an independent round trip.
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(transport: impl RpcTransport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Call a JSON-RPC method and deserialize the result into `T`.
    ///
    /// `params` serializing to `null` (e.g. `()`) is omitted from the
    /// envelope. A node error object is returned as [`Error::Rpc`] unmodified;
    /// a result that does not fit `T` is [`Error::ResultShape`]. No retries.
    pub async fn call<T, P>(&self, ctx: &Context, method: &str, params: P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        ctx.check()?;

        let request = self.build_request(method, params)?;
        let body = serde_json::to_vec(&request).map_err(Error::Marshal)?;
        debug!(method, id = request.id, "sending RPC request");

        let raw = ctx.run(self.transport.post(body)).await?;
        let response: RpcResponse = serde_json::from_slice(&raw).map_err(Error::Decode)?;

        if let Some(error) = response.error {
            debug!(method, code = error.code, "RPC call returned error");
            return Err(Error::Rpc(error));
        }

        if let Some(ref id) = response.id {
            if id.as_u64() != Some(request.id) {
                warn!(method, expected = request.id, got = %id, "RPC response id mismatch");
            }
        }

        let payload = response.result.as_deref().map_or("null", RawValue::get);
        serde_json::from_str(payload).map_err(Error::ResultShape)
    }

    /// Build the outbound envelope for `method` without sending it.
    pub fn build_request<P: Serialize>(&self, method: &str, params: P) -> Result<RpcRequest> {
        let params = serde_json::to_value(params).map_err(Error::Marshal)?;
        Ok(RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        })
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient").finish_non_exhaustive()
    }
}

/// Pull a required string field out of a loosely-typed result.
///
/// `what` names the operation in the resulting "invalid ... response" error.
pub(crate) fn required_str(result: &Map<String, Value>, key: &str, what: &str) -> Result<String> {
    match result.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(Error::InvalidResponse(what.to_string())),
    }
}

/// Pull an optional string field; a present value of another type is still an error.
pub(crate) fn optional_str(
    result: &Map<String, Value>,
    key: &str,
    what: &str,
) -> Result<Option<String>> {
    match result.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::InvalidResponse(what.to_string())),
    }
}
