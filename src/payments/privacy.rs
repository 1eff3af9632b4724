use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::{PrivacyMode, TxPrivacyConfig};
use crate::error::AppResult;
use crate::execution::DaemonClient;
use crate::ledger::LedgerStore;

/// Per-transaction privacy flag understood by post-fork wallets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacySetting {
    Public,
    Private,
}

impl PrivacySetting {
    /// Stored worker flag: `1` opts into public transactions
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(str::trim) {
            Some("1") => PrivacySetting::Public,
            _ => PrivacySetting::Private,
        }
    }
}

/// Resolves the privacy field for a destination's transfer request
pub struct PrivacyResolver {
    config: TxPrivacyConfig,
    daemon: DaemonClient,
    store: Arc<dyn LedgerStore>,
}

impl PrivacyResolver {
    pub fn new(config: TxPrivacyConfig, daemon: DaemonClient, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            config,
            daemon,
            store,
        }
    }

    /// `None` when disabled or when the chain has not reached the gating fork
    pub async fn resolve(&self, address: &str) -> AppResult<Option<PrivacySetting>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let version = self.daemon.hard_fork_version().await?;
        if version < self.config.min_hard_fork {
            debug!(
                "Hard fork version {} below {}, no privacy setting",
                version, self.config.min_hard_fork
            );
            return Ok(None);
        }

        let setting = match self.config.mode {
            PrivacyMode::Public => PrivacySetting::Public,
            PrivacyMode::Private => PrivacySetting::Private,
            PrivacyMode::PerAddress => {
                let flag = self.store.privacy_flag(address).await?;
                PrivacySetting::from_flag(flag.as_deref())
            }
        };

        Ok(Some(setting))
    }
}
