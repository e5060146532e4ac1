//! Remote Data Gateway: JSON request/response against the remote list API.
//!
//! Every call targets `{base_url}/{endpoint}`. Failures are returned, never
//! swallowed here; the loaders and the reconciler decide how to degrade. The
//! gateway never touches local state.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::GatewayError;

/// Endpoint paths relative to the base URL.
pub mod endpoints {
    pub const MODULES: &str = "modules";
    pub const TASKS: &str = "todolist";
    pub const TEAMS: &str = "teams";
    pub const RECOMMENDATION: &str = "recommendation";

    pub fn task(id: u64) -> String {
        format!("{TASKS}/{id}")
    }

    pub fn employees(team_id: u64) -> String {
        format!("employees/{team_id}/employees")
    }
}

/// Header that makes tunnelled backends skip their browser interstitial.
pub const TUNNEL_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

/// Request/response contract of the remote list API.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get(&self, endpoint: &str) -> Result<Value, GatewayError>;
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, GatewayError>;
    async fn put(&self, endpoint: &str, body: &Value) -> Result<Value, GatewayError>;
    async fn delete(&self, endpoint: &str) -> Result<Value, GatewayError>;
}

/// [`Gateway`] over HTTP using `reqwest`.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    skip_tunnel_warning: bool,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            skip_tunnel_warning: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url.clone()).with_tunnel_warning_skipped(config.skip_tunnel_warning)
    }

    pub fn with_tunnel_warning_skipped(mut self, skip: bool) -> Self {
        self.skip_tunnel_warning = skip;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL and an endpoint with exactly one slash.
    pub fn url_for(&self, endpoint: &str) -> Result<url::Url, GatewayError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            endpoint.trim().trim_start_matches('/')
        );
        url::Url::parse(&joined).map_err(|e| GatewayError::Url {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    async fn send(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value, GatewayError> {
        let url = self.url_for(endpoint)?;
        debug!(%method, %url, "gateway request");

        let mut request = self.client.request(method, url);
        if self.skip_tunnel_warning {
            request = request.header(TUNNEL_WARNING_HEADER, "true");
        }
        if let Some(b) = body {
            request = request.json(b);
        }

        let transport = |source| GatewayError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        decode_body(endpoint, &bytes)
    }
}

/// Decode a success body. An empty body is JSON `null`.
pub fn decode_body(endpoint: &str, bytes: &[u8]) -> Result<Value, GatewayError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|source| GatewayError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get(&self, endpoint: &str) -> Result<Value, GatewayError> {
        self.send(Method::GET, endpoint, None).await
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, GatewayError> {
        self.send(Method::POST, endpoint, Some(body)).await
    }

    async fn put(&self, endpoint: &str, body: &Value) -> Result<Value, GatewayError> {
        self.send(Method::PUT, endpoint, Some(body)).await
    }

    async fn delete(&self, endpoint: &str) -> Result<Value, GatewayError> {
        self.send(Method::DELETE, endpoint, None).await
    }
}
