use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Point-to-point JSON-RPC call to a daemon or wallet
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> AppResult<Value>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// JSON-RPC 2.0 over HTTP, posting to `<url>/json_rpc`
pub struct JsonRpcClient {
    client: reqwest::Client,
    endpoint: String,
}

impl JsonRpcClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/json_rpc", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl RpcTransport for JsonRpcClient {
    async fn call(&self, method: &str, params: Value) -> AppResult<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: "0",
            method,
            params,
        };

        debug!("→ {} {}", self.endpoint, method);

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::rpc(
                method,
                format!("HTTP {}: {}", status, error_text),
            ));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AppError::invalid_response(method, e.to_string()))?;

        if let Some(error) = body.error {
            return Err(AppError::rpc(
                method,
                format!("code {}: {}", error.code, error.message),
            ));
        }

        body.result
            .ok_or_else(|| AppError::invalid_response(method, "missing result"))
    }
}
