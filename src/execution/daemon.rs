use serde::Deserialize;
use std::sync::Arc;

use super::rpc::RpcTransport;
use crate::error::{AppError, AppResult};

const HARD_FORK_INFO: &str = "hard_fork_info";

#[derive(Debug, Deserialize)]
struct HardForkInfo {
    version: u64,
}

/// Chain daemon queries needed by the payout pass
#[derive(Clone)]
pub struct DaemonClient {
    transport: Arc<dyn RpcTransport>,
}

impl DaemonClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    pub async fn hard_fork_version(&self) -> AppResult<u64> {
        let result = self
            .transport
            .call(HARD_FORK_INFO, serde_json::json!({}))
            .await?;

        let info: HardForkInfo = serde_json::from_value(result)
            .map_err(|e| AppError::invalid_response(HARD_FORK_INFO, e.to_string()))?;

        Ok(info.version)
    }
}
