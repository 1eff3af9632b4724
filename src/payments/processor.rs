use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::batch::{BatchBuilder, PreparedCandidate, TransferBatch};
use super::destination::normalize_destination;
use super::eligibility::{select_candidates, PayoutCandidate};
use super::privacy::PrivacyResolver;
use super::reconciler::{LedgerReconciler, PassClock};
use crate::config::{AddressConfig, Config, PaymentsConfig};
use crate::error::{AppError, AppResult};
use crate::execution::{DaemonClient, TransferExecutor};
use crate::ledger::LedgerStore;
use crate::notifications::{DisplayFormat, NotificationEvent, Notifier};

/// A destination the ledger now shows as paid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidDestination {
    /// Address with payment id re-attached, as the miner knows it
    pub address: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Settled {
        index: usize,
        paid: Vec<PaidDestination>,
    },
    /// Wallet refused or was unreachable; nothing was debited
    Failed { index: usize, error: String },
    /// Wallet accepted the call but its reply was unusable; value may have left
    Unconfirmed {
        index: usize,
        error: String,
        account_ids: Vec<String>,
    },
    /// Value left the wallet but the ledger was not updated
    LedgerUpdateFailed {
        index: usize,
        error: String,
        account_ids: Vec<String>,
    },
}

impl BatchOutcome {
    /// Accounts that may have been paid without the ledger showing it
    pub fn held_accounts(&self) -> &[String] {
        match self {
            BatchOutcome::Unconfirmed { account_ids, .. }
            | BatchOutcome::LedgerUpdateFailed { account_ids, .. } => account_ids,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub pass_id: Uuid,
    pub eligible: usize,
    pub outcomes: Vec<BatchOutcome>,
}

impl PassSummary {
    fn empty(pass_id: Uuid) -> Self {
        Self {
            pass_id,
            eligible: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn settled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BatchOutcome::Settled { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.settled()
    }

    /// Batches with a double-payment risk: unconfirmed sends and unrecorded ones
    pub fn at_risk(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.held_accounts().is_empty())
            .count()
    }

    pub fn paid(&self) -> impl Iterator<Item = &PaidDestination> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                BatchOutcome::Settled { paid, .. } => Some(paid),
                _ => None,
            })
            .flatten()
    }
}

/// PaymentProcessor - one payout pass as an ordered pipeline:
/// read accounts → select → resolve destinations → pack → submit + reconcile → notify
pub struct PaymentProcessor {
    payments: PaymentsConfig,
    addresses: AddressConfig,
    store: Arc<dyn LedgerStore>,
    privacy: PrivacyResolver,
    builder: BatchBuilder,
    executor: TransferExecutor,
    reconciler: LedgerReconciler,
    notifier: Arc<dyn Notifier>,
    display: DisplayFormat,
    /// Accounts whose ledger state is ambiguous after a failed reconcile
    quarantine: Mutex<HashSet<String>>,
}

impl PaymentProcessor {
    pub fn new(
        config: &Config,
        store: Arc<dyn LedgerStore>,
        daemon: DaemonClient,
        executor: TransferExecutor,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            payments: config.payments.clone(),
            addresses: config.addresses.clone(),
            privacy: PrivacyResolver::new(config.tx_privacy.clone(), daemon, store.clone()),
            builder: BatchBuilder::new(config.payments.clone(), config.tx_keys.enabled),
            reconciler: LedgerReconciler::new(
                store.clone(),
                config.addresses.payment_id_separator.clone(),
            ),
            store,
            executor,
            notifier,
            display: DisplayFormat::new(&config.notifications),
            quarantine: Mutex::new(HashSet::new()),
        }
    }

    #[cfg(test)]
    pub fn quarantined(&self) -> Vec<String> {
        let mut ids = self.quarantine.lock().iter().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[instrument(skip(self), fields(pass_id = tracing::field::Empty))]
    pub async fn run_pass(&self) -> AppResult<PassSummary> {
        let pass_id = Uuid::new_v4();
        tracing::Span::current().record("pass_id", tracing::field::display(pass_id));
        let candidates = self.select().await?;

        if candidates.is_empty() {
            info!("No workers' balances reached the minimum payment threshold");
            return Ok(PassSummary::empty(pass_id));
        }

        let eligible = candidates.len();
        let batches = self.pack(candidates).await?;
        let clock = PassClock::now();

        let outcomes = join_all(batches.iter().map(|batch| self.settle(batch, &clock))).await;

        let summary = PassSummary {
            pass_id,
            eligible,
            outcomes,
        };
        self.notify_paid(&summary).await;

        info!(
            "Payments splintered and {} successfully sent, {} failed",
            summary.settled(),
            summary.failed()
        );
        Ok(summary)
    }

    /// Batches the next pass would submit, without submitting them
    #[cfg(test)]
    pub async fn plan(&self) -> AppResult<Vec<TransferBatch>> {
        let candidates = self.select().await?;
        self.pack(candidates).await
    }

    async fn select(&self) -> AppResult<Vec<PayoutCandidate>> {
        let accounts = self.store.fetch_accounts().await?;
        let candidates = select_candidates(&accounts, &self.payments);

        let quarantine = self.quarantine.lock();
        if quarantine.is_empty() {
            return Ok(candidates);
        }

        Ok(candidates
            .into_iter()
            .filter(|candidate| {
                let held = quarantine.contains(&candidate.account_id);
                if held {
                    warn!(
                        "Skipping {}: ledger unreconciled since a previous payment",
                        candidate.account_id
                    );
                }
                !held
            })
            .collect())
    }

    async fn pack(&self, candidates: Vec<PayoutCandidate>) -> AppResult<Vec<TransferBatch>> {
        let mut prepared = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let destination = normalize_destination(&candidate.account_id, &self.addresses);
            let privacy = self.privacy.resolve(&destination.address).await?;
            prepared.push(PreparedCandidate {
                account_id: candidate.account_id,
                amount: candidate.amount,
                destination,
                privacy,
            });
        }

        Ok(self.builder.build(prepared))
    }

    async fn settle(&self, batch: &TransferBatch, clock: &PassClock) -> BatchOutcome {
        let receipt = match self.executor.submit(batch).await {
            Ok(receipt) => receipt,
            Err(e) if e.is_ambiguous_submission() => {
                error!(
                    double_payment_risk = true,
                    "Wallet reply to {} unreadable, payments may have been sent: {}",
                    self.executor.method(),
                    e
                );
                let account_ids = self.hold_for_review(batch, &[], &e).await;
                return BatchOutcome::Unconfirmed {
                    index: batch.index,
                    error: e.to_string(),
                    account_ids,
                };
            }
            Err(e) => {
                error!(
                    "Error with {} RPC request to wallet daemon: {}",
                    self.executor.method(),
                    e
                );
                error!("Payments failed to send to {:?}", batch.destinations);
                return BatchOutcome::Failed {
                    index: batch.index,
                    error: e.to_string(),
                };
            }
        };

        if let Err(e) = self.reconciler.reconcile(batch, &receipt, clock).await {
            error!(
                double_payment_risk = true,
                "Super critical error! Payments sent yet failing to update balance in ledger, double payouts likely to happen: {}",
                e
            );
            let tx_hashes = receipt
                .transactions
                .iter()
                .map(|tx| tx.tx_hash.as_str())
                .collect::<Vec<_>>();
            let account_ids = self.hold_for_review(batch, &tx_hashes, &e).await;
            return BatchOutcome::LedgerUpdateFailed {
                index: batch.index,
                error: e.to_string(),
                account_ids,
            };
        }

        BatchOutcome::Settled {
            index: batch.index,
            paid: batch
                .destinations
                .iter()
                .map(|destination| PaidDestination {
                    address: self.reconciler.history_address(batch, destination),
                    amount: destination.amount,
                })
                .collect(),
        }
    }

    /// Quarantine the batch's accounts and alert the operator. Never retried.
    async fn hold_for_review(
        &self,
        batch: &TransferBatch,
        tx_hashes: &[&str],
        cause: &AppError,
    ) -> Vec<String> {
        let account_ids = batch.account_ids().map(str::to_string).collect::<Vec<_>>();
        error!("Double payments likely to be sent to {:?}", batch.destinations);

        self.quarantine.lock().extend(account_ids.iter().cloned());

        let message = format!(
            "Payments possibly sent (tx {:?}) but not recorded in the ledger for accounts {:?}: {}. \
             Accounts are held from further payouts until reconciled by hand.",
            tx_hashes, account_ids, cause
        );
        if let Err(alert_error) = self.notifier.alert_operator(&message).await {
            error!("Failed to deliver operator alert: {}", alert_error);
        }

        account_ids
    }

    async fn notify_paid(&self, summary: &PassSummary) {
        for paid in summary.paid() {
            info!(
                "Payment of {} to {}",
                self.display.amount(paid.amount),
                paid.address
            );

            let notice = self.display.notice(&paid.address, paid.amount);
            if let Err(e) = self
                .notifier
                .notify(&paid.address, NotificationEvent::Payment, &notice)
                .await
            {
                warn!("Failed to notify {}: {}", paid.address, e);
            }
        }
    }
}
