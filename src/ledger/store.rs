use async_trait::async_trait;

use super::models::{Account, LedgerMutation, PaymentLog};
use crate::error::AppResult;

/// Ledger store - the source of truth for balances and payment history
///
/// INVARIANTS:
/// - `apply` is all-or-nothing for one mutation
/// - there is no ordering between mutations of different batches
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Every tracked worker account
    async fn fetch_accounts(&self) -> AppResult<Vec<Account>>;

    /// Raw per-address privacy flag, if the worker set one
    async fn privacy_flag(&self, address: &str) -> AppResult<Option<String>>;

    /// Apply one batch's mutation atomically
    async fn apply(&self, mutation: &LedgerMutation) -> AppResult<()>;
}

/// Key layout under a coin namespace
#[derive(Debug, Clone)]
pub struct KeySpace {
    coin: String,
}

impl KeySpace {
    pub fn new(coin: impl Into<String>) -> Self {
        Self { coin: coin.into() }
    }

    pub fn worker(&self, account_id: &str) -> String {
        format!("{}:workers:{}", self.coin, account_id)
    }

    pub fn workers_pattern(&self) -> String {
        format!("{}:workers:*", self.coin)
    }

    /// Account id is the last `:`-separated segment of a worker key
    pub fn account_id<'a>(&self, worker_key: &'a str) -> &'a str {
        worker_key.rsplit(':').next().unwrap_or(worker_key)
    }

    pub fn payments(&self, log: &PaymentLog) -> String {
        match log {
            PaymentLog::All => format!("{}:payments:all", self.coin),
            PaymentLog::Destination(address) => format!("{}:payments:{}", self.coin, address),
        }
    }

    pub fn privacy_settings(&self, address: &str) -> String {
        format!("{}:publictransactionsettings:{}", self.coin, address)
    }
}

/// Lenient integer parse for hash fields; unset or garbage reads as `None`
pub fn parse_amount(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}
