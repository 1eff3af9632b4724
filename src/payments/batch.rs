use tracing::debug;

use super::destination::NormalizedAddress;
use super::privacy::PrivacySetting;
use crate::config::PaymentsConfig;
use crate::ledger::models::{AccountField, LedgerMutation};

/// Candidate with its destination resolved and privacy looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCandidate {
    pub account_id: String,
    pub amount: i64,
    pub destination: NormalizedAddress,
    pub privacy: Option<PrivacySetting>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Ledger account debited for this transfer
    pub account_id: String,
    pub address: String,
    pub amount: i64,
    pub payment_id: Option<String>,
}

/// One wallet transfer request plus the ledger changes it owes once sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBatch {
    pub index: usize,
    pub destinations: Vec<Destination>,
    pub fee: i64,
    pub mixin: u32,
    pub priority: u32,
    pub unlock_time: u64,
    pub privacy: Option<PrivacySetting>,
    pub payment_id: Option<String>,
    pub get_tx_keys: bool,
    /// Pending balance debits and paid credits
    pub mutation: LedgerMutation,
}

impl TransferBatch {
    pub fn total_amount(&self) -> i64 {
        self.destinations.iter().map(|d| d.amount).sum()
    }

    pub fn account_ids(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(|d| d.account_id.as_str())
    }
}

/// Packs candidates into transfer batches.
///
/// INVARIANTS:
/// - at most `max_addresses` destinations per batch
/// - batch total never exceeds `max_transaction_amount` when set
/// - a payment-id-bearing destination is alone in its batch
/// - every account appears in at most one batch
pub struct BatchBuilder {
    payments: PaymentsConfig,
    get_tx_keys: bool,
}

#[derive(Default)]
struct Accumulator {
    batches: Vec<TransferBatch>,
    current: Option<TransferBatch>,
}

impl Accumulator {
    fn current_len(&self) -> usize {
        self.current.as_ref().map_or(0, |b| b.destinations.len())
    }

    fn current_amount(&self) -> i64 {
        self.current.as_ref().map_or(0, TransferBatch::total_amount)
    }

    fn close(&mut self) {
        if let Some(batch) = self.current.take() {
            self.batches.push(batch);
        }
    }

    fn finish(mut self) -> Vec<TransferBatch> {
        self.close();
        self.batches
    }
}

impl BatchBuilder {
    pub fn new(payments: PaymentsConfig, get_tx_keys: bool) -> Self {
        Self {
            payments,
            get_tx_keys,
        }
    }

    pub fn build(&self, candidates: Vec<PreparedCandidate>) -> Vec<TransferBatch> {
        let batches = candidates
            .into_iter()
            .fold(Accumulator::default(), |acc, candidate| self.push(acc, candidate))
            .finish();

        debug!("Packed payouts into {} batches", batches.len());
        batches
    }

    fn open_batch(&self, index: usize, privacy: Option<PrivacySetting>) -> TransferBatch {
        TransferBatch {
            index,
            destinations: Vec::new(),
            fee: self.payments.transfer_fee,
            mixin: self.payments.mixin,
            priority: self.payments.priority,
            unlock_time: 0,
            privacy,
            payment_id: None,
            get_tx_keys: self.get_tx_keys,
            mutation: LedgerMutation::new(),
        }
    }

    fn push(&self, mut acc: Accumulator, candidate: PreparedCandidate) -> Accumulator {
        let max_amount = self.payments.max_transaction_amount;

        let mut amount = candidate.amount;
        if let Some(max) = max_amount {
            if amount + acc.current_amount() > max {
                amount = max - acc.current_amount();
            }
        }
        if amount <= 0 {
            return acc;
        }

        let isolated = candidate.destination.payment_id_bearing;
        if isolated && acc.current_len() > 0 {
            acc.close();
        }

        let index = acc.batches.len();
        let batch = acc
            .current
            .get_or_insert_with(|| self.open_batch(index, candidate.privacy));

        let account_id = candidate.account_id;
        batch.mutation.increment(&account_id, AccountField::Balance, -amount);
        if self.payments.miner_pays_fee {
            batch.mutation.increment(
                &account_id,
                AccountField::Balance,
                -self.payments.transfer_fee,
            );
        }
        batch.mutation.increment(&account_id, AccountField::Paid, amount);

        if let Some(payment_id) = &candidate.destination.payment_id {
            batch.payment_id = Some(payment_id.clone());
        }
        batch.destinations.push(Destination {
            account_id,
            address: candidate.destination.address,
            amount,
            payment_id: candidate.destination.payment_id,
        });

        if self.payments.dynamic_transfer_fee {
            batch.fee = self.payments.transfer_fee * batch.destinations.len() as i64;
        }

        let full = batch.destinations.len() >= self.payments.max_addresses;
        let at_max_amount = max_amount.map_or(false, |max| batch.total_amount() >= max);
        if full || at_max_amount || isolated {
            acc.close();
        }

        acc
    }
}
