use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::models::{Account, AccountField, LedgerMutation, LedgerOp, PaymentLog};
use super::store::LedgerStore;
use crate::error::{AppError, AppResult};

/// Redis-like in-memory ledger used to drive the pipeline in tests
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    accounts: RwLock<HashMap<String, Account>>,
    privacy_flags: RwLock<HashMap<String, String>>,
    /// log -> (timestamp, entry), insertion ordered
    payments: RwLock<HashMap<PaymentLog, Vec<(i64, String)>>>,
    fail_reads: AtomicBool,
    fail_apply: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.put_account(account);
        }
        store
    }

    pub fn put_account(&self, account: Account) {
        self.accounts.write().insert(account.id.clone(), account);
    }

    pub fn set_privacy_flag(&self, address: &str, flag: &str) {
        self.privacy_flags
            .write()
            .insert(address.to_string(), flag.to_string());
    }

    pub fn account(&self, id: &str) -> Option<Account> {
        self.accounts.read().get(id).cloned()
    }

    pub fn payment_log(&self, log: &PaymentLog) -> Vec<(i64, String)> {
        self.payments.read().get(log).cloned().unwrap_or_default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_apply(&self, fail: bool) {
        self.fail_apply.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn fetch_accounts(&self) -> AppResult<Vec<Account>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("ledger read unavailable".to_string()));
        }
        Ok(self.accounts.read().values().cloned().collect())
    }

    async fn privacy_flag(&self, address: &str) -> AppResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("ledger read unavailable".to_string()));
        }
        Ok(self.privacy_flags.read().get(address).cloned())
    }

    async fn apply(&self, mutation: &LedgerMutation) -> AppResult<()> {
        if self.fail_apply.load(Ordering::SeqCst) {
            return Err(AppError::Internal("ledger write unavailable".to_string()));
        }

        // Both locks held for the whole mutation so it lands as one unit
        let mut accounts = self.accounts.write();
        let mut payments = self.payments.write();

        for op in &mutation.ops {
            match op {
                LedgerOp::IncrementField {
                    account_id,
                    field,
                    delta,
                } => {
                    let account = accounts
                        .entry(account_id.clone())
                        .or_insert_with(|| Account::new(account_id.clone(), 0));
                    match field {
                        AccountField::Balance => account.balance += delta,
                        AccountField::Paid => account.paid += delta,
                    }
                }
                LedgerOp::AppendPayment {
                    log,
                    timestamp,
                    record,
                } => {
                    payments
                        .entry(log.clone())
                        .or_default()
                        .push((*timestamp, record.entry_for(log)));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::models::PaymentRecord;

    #[tokio::test]
    async fn test_apply_mutation() {
        let store = MemoryLedgerStore::with_accounts(vec![Account::new("w1", 200)]);

        let mut mutation = LedgerMutation::new();
        mutation.increment("w1", AccountField::Balance, -150);
        mutation.increment("w1", AccountField::Paid, 150);
        mutation.append_payment(
            PaymentLog::All,
            100,
            PaymentRecord {
                tx_hash: "h1".to_string(),
                amount: 150,
                fee: 1,
                mixin: 5,
                destination_count: 1,
            },
        );

        store.apply(&mutation).await.unwrap();

        let account = store.account("w1").unwrap();
        assert_eq!(account.balance, 50);
        assert_eq!(account.paid, 150);
        assert_eq!(
            store.payment_log(&PaymentLog::All),
            vec![(100, "h1:150:1:5:1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_apply_leaves_state_untouched() {
        let store = MemoryLedgerStore::with_accounts(vec![Account::new("w1", 200)]);
        store.set_fail_apply(true);

        let mut mutation = LedgerMutation::new();
        mutation.increment("w1", AccountField::Balance, -150);

        assert!(store.apply(&mutation).await.is_err());
        assert_eq!(store.account("w1").unwrap().balance, 200);
    }
}
