// Scripted RPC transport for driving executors and the pass pipeline in tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::rpc::RpcTransport;
use crate::error::{AppError, AppResult};

type Handler = Box<dyn Fn(&str, &Value) -> AppResult<Value> + Send + Sync>;

pub struct ScriptedRpc {
    handler: Handler,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedRpc {
    pub fn new(handler: impl Fn(&str, &Value) -> AppResult<Value> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Daemon reporting a fixed hard fork version
    pub fn daemon(version: u64) -> Self {
        Self::new(move |method, _| match method {
            "hard_fork_info" => Ok(json!({ "version": version, "status": "OK" })),
            other => Err(AppError::rpc(other, "unknown method")),
        })
    }

    /// Wallet accepting every transfer; the hash is derived from the first destination
    pub fn wallet_ok() -> Self {
        Self::new(|method, params| wallet_reply(method, params))
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

pub fn wallet_reply(method: &str, params: &Value) -> AppResult<Value> {
    match method {
        "transfer_split" => {
            let destinations = params["destinations"].as_array().cloned().unwrap_or_default();
            let first = destinations
                .first()
                .and_then(|d| d["address"].as_str())
                .unwrap_or_default();
            let total: i64 = destinations
                .iter()
                .filter_map(|d| d["amount"].as_i64())
                .sum();
            let tx_hash = format!("tx-{}", first);
            let keys = if params["get_tx_keys"].as_bool().unwrap_or(false) {
                vec![format!("key-{}", first)]
            } else {
                Vec::new()
            };
            Ok(json!({
                "tx_hash_list": [tx_hash],
                "amount_list": [total],
                "tx_key_list": keys,
            }))
        }
        "sendTransaction" => {
            let first = params["transfers"][0]["address"].as_str().unwrap_or_default();
            Ok(json!({
                "transactionHash": format!("tx-{}", first),
                "transactionSecretKey": format!("key-{}", first),
            }))
        }
        other => Err(AppError::rpc(other, "unknown method")),
    }
}

#[async_trait]
impl RpcTransport for ScriptedRpc {
    async fn call(&self, method: &str, params: Value) -> AppResult<Value> {
        self.calls.lock().push((method.to_string(), params.clone()));
        (self.handler)(method, &params)
    }
}
