use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{info, instrument};

use super::batch::{Destination, TransferBatch};
use super::destination::join_login;
use crate::error::AppResult;
use crate::execution::TransferReceipt;
use crate::ledger::models::{LedgerMutation, PaymentLog, PaymentRecord};
use crate::ledger::LedgerStore;

/// Pass-wide history timestamps; each transaction takes the next second so
/// records of one pass never tie.
#[derive(Debug)]
pub struct PassClock {
    base: i64,
    offset: AtomicI64,
}

impl PassClock {
    pub fn new(base: i64) -> Self {
        Self {
            base,
            offset: AtomicI64::new(0),
        }
    }

    pub fn now() -> Self {
        Self::new(chrono::Utc::now().timestamp())
    }

    pub fn next(&self) -> i64 {
        self.base + self.offset.fetch_add(1, Ordering::SeqCst)
    }
}

/// LedgerReconciler - records what the wallet actually sent
pub struct LedgerReconciler {
    store: Arc<dyn LedgerStore>,
    payment_id_separator: String,
}

impl LedgerReconciler {
    pub fn new(store: Arc<dyn LedgerStore>, payment_id_separator: impl Into<String>) -> Self {
        Self {
            store,
            payment_id_separator: payment_id_separator.into(),
        }
    }

    /// Per-destination history key, with the payment id re-attached
    pub fn history_address(&self, batch: &TransferBatch, destination: &Destination) -> String {
        join_login(
            &destination.address,
            batch.payment_id.as_deref(),
            &self.payment_id_separator,
        )
    }

    /// History appends for every sent transaction followed by the batch's pending ops
    pub fn build_mutation(
        &self,
        batch: &TransferBatch,
        receipt: &TransferReceipt,
        clock: &PassClock,
    ) -> LedgerMutation {
        let mut mutation = LedgerMutation::new();

        for tx in &receipt.transactions {
            let timestamp = clock.next();
            let record = PaymentRecord {
                tx_hash: tx.tx_hash.clone(),
                amount: tx.amount,
                fee: batch.fee,
                mixin: batch.mixin,
                destination_count: batch.destinations.len(),
            };

            mutation.append_payment(PaymentLog::All, timestamp, record.clone());
            for destination in &batch.destinations {
                mutation.append_payment(
                    PaymentLog::Destination(self.history_address(batch, destination)),
                    timestamp,
                    record.clone(),
                );
            }
        }

        mutation.ops.extend(batch.mutation.ops.iter().cloned());
        mutation
    }

    /// Applies the whole batch as one atomic store operation. Never retried.
    #[instrument(skip(self, batch, receipt, clock), fields(batch = batch.index))]
    pub async fn reconcile(
        &self,
        batch: &TransferBatch,
        receipt: &TransferReceipt,
        clock: &PassClock,
    ) -> AppResult<()> {
        let mutation = self.build_mutation(batch, receipt, clock);
        self.store.apply(&mutation).await?;

        info!(
            "Ledger updated for batch {} ({} transactions, {} destinations)",
            batch.index,
            receipt.transactions.len(),
            batch.destinations.len()
        );
        Ok(())
    }
}
