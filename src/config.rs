//! Client configuration

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Error, Result};
use crate::types::Network;

/// SDK version reported in the user agent
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.chert.com";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`ChertClient`](crate::client::ChertClient).
///
/// Set once at client creation; the client never mutates it afterwards.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Blockchain network
    pub network: Network,
    /// Per-request timeout
    pub timeout: Duration,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Extra HTTP headers; these win over the SDK defaults on conflict
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            network: Network::Mainnet,
            timeout: DEFAULT_TIMEOUT,
            api_key: None,
            headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create config with endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Read configuration overrides from the environment.
    ///
    /// Recognized variables: `CHERT_ENDPOINT`, `CHERT_NETWORK`,
    /// `CHERT_TIMEOUT_SECS` and `CHERT_API_KEY`. Unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("CHERT_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(network) = std::env::var("CHERT_NETWORK") {
            config.network = network.parse()?;
        }
        if let Ok(secs) = std::env::var("CHERT_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::InvalidParameter(format!("CHERT_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(key) = std::env::var("CHERT_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace empty/zero values with defaults.
    pub(crate) fn normalized(mut self) -> Self {
        if self.endpoint.trim().is_empty() {
            self.endpoint = DEFAULT_ENDPOINT.to_string();
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if matches!(self.api_key.as_deref(), Some("")) {
            self.api_key = None;
        }
        self
    }

    /// Check that the endpoint is an http(s) URL and the timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            Error::InvalidParameter(format!("invalid endpoint {}: {}", self.endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::InvalidParameter(format!(
                "unsupported endpoint scheme: {}",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidParameter("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Headers sent with every request: JSON content type, bearer auth when
    /// an API key is set, then the caller's headers.
    pub(crate) fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref key) = self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| Error::InvalidParameter("api key is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidParameter(format!("invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                Error::InvalidParameter(format!("invalid value for header {}", name))
            })?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}
