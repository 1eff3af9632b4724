use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use super::models::{Account, LedgerMutation, LedgerOp};
use super::store::{parse_amount, KeySpace, LedgerStore};
use crate::error::AppResult;

/// Redis-backed ledger
#[derive(Clone)]
pub struct RedisLedgerStore {
    connection: ConnectionManager,
    keys: KeySpace,
}

impl RedisLedgerStore {
    pub async fn connect(redis_url: &str, coin: &str) -> AppResult<Self> {
        info!("📊 Connecting to redis...");
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        info!("✓ Redis connection established");

        Ok(Self {
            connection,
            keys: KeySpace::new(coin),
        })
    }
}

/// MULTI/EXEC pipeline applying one mutation
fn mutation_pipeline(keys: &KeySpace, mutation: &LedgerMutation) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic();

    for op in &mutation.ops {
        match op {
            LedgerOp::IncrementField {
                account_id,
                field,
                delta,
            } => {
                pipe.cmd("HINCRBY")
                    .arg(keys.worker(account_id))
                    .arg(field.as_str())
                    .arg(*delta)
                    .ignore();
            }
            LedgerOp::AppendPayment {
                log,
                timestamp,
                record,
            } => {
                pipe.cmd("ZADD")
                    .arg(keys.payments(log))
                    .arg(*timestamp)
                    .arg(record.entry_for(log))
                    .ignore();
            }
        }
    }

    pipe
}

#[async_trait]
impl LedgerStore for RedisLedgerStore {
    async fn fetch_accounts(&self) -> AppResult<Vec<Account>> {
        let mut con = self.connection.clone();

        let worker_keys: Vec<String> = redis::cmd("KEYS")
            .arg(self.keys.workers_pattern())
            .query_async(&mut con)
            .await?;

        if worker_keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in &worker_keys {
            pipe.cmd("HMGET")
                .arg(key)
                .arg("balance")
                .arg("minPayoutLevel")
                .arg("paid");
        }

        let replies: Vec<(Option<String>, Option<String>, Option<String>)> =
            pipe.query_async(&mut con).await?;

        let accounts = worker_keys
            .iter()
            .zip(replies)
            .map(|(key, (balance, min_level, paid))| Account {
                id: self.keys.account_id(key).to_string(),
                balance: parse_amount(balance.as_deref()).unwrap_or(0),
                min_payout_level: parse_amount(min_level.as_deref()),
                paid: parse_amount(paid.as_deref()).unwrap_or(0),
            })
            .collect::<Vec<_>>();

        debug!("Fetched {} worker accounts", accounts.len());
        Ok(accounts)
    }

    async fn privacy_flag(&self, address: &str) -> AppResult<Option<String>> {
        let mut con = self.connection.clone();
        let flag: Option<String> = redis::cmd("GET")
            .arg(self.keys.privacy_settings(address))
            .query_async(&mut con)
            .await?;
        Ok(flag)
    }

    async fn apply(&self, mutation: &LedgerMutation) -> AppResult<()> {
        if mutation.is_empty() {
            return Ok(());
        }

        let mut con = self.connection.clone();
        let pipe = mutation_pipeline(&self.keys, mutation);
        let _: () = pipe.query_async(&mut con).await?;
        Ok(())
    }
}
