// Payment scheduler - drives payout passes on a fixed interval
//
// Idle -> RunningPass on trigger, RunningPass -> Idle when the pass ends,
// whatever its outcome. The timer is re-armed only after a pass completes, and
// a trigger that arrives while a pass is running is skipped.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use super::processor::{BatchOutcome, PassSummary, PaymentProcessor};
use crate::error::AppResult;

/// One full payout pass
#[async_trait]
pub trait PayoutPass: Send + Sync {
    async fn run_pass(&self) -> AppResult<PassSummary>;
}

#[async_trait]
impl PayoutPass for PaymentProcessor {
    async fn run_pass(&self) -> AppResult<PassSummary> {
        PaymentProcessor::run_pass(self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    RunningPass,
}

#[derive(Debug)]
pub enum TriggerResult {
    Completed(PassSummary),
    Failed(String),
    /// A pass was already running
    Skipped,
}

/// Returns the scheduler to `Idle` even if the pass future is dropped or panics
struct RunningGuard {
    state: Arc<Mutex<SchedulerState>>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        *self.state.lock() = SchedulerState::Idle;
    }
}

pub struct PaymentScheduler {
    pass: Arc<dyn PayoutPass>,
    interval: Duration,
    state: Arc<Mutex<SchedulerState>>,
}

impl PaymentScheduler {
    pub fn new(pass: Arc<dyn PayoutPass>, interval: Duration) -> Self {
        Self {
            pass,
            interval,
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Run one pass now unless one is already in flight
    pub async fn trigger(&self) -> TriggerResult {
        let _guard = {
            let mut state = self.state.lock();
            if *state == SchedulerState::RunningPass {
                warn!("⏭️ Payment pass still running, skipping trigger");
                return TriggerResult::Skipped;
            }
            *state = SchedulerState::RunningPass;
            RunningGuard {
                state: self.state.clone(),
            }
        };

        info!("🔄 Starting payment pass");

        match self.pass.run_pass().await {
            Ok(summary) => TriggerResult::Completed(summary),
            Err(e) => TriggerResult::Failed(e.to_string()),
        }
    }

    /// Start the scheduler (runs in background)
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                log_result(&self.trigger().await);

                info!(
                    "⏰ Next payment pass in {}s",
                    self.interval.as_secs()
                );
                tokio::time::sleep(self.interval).await;
            }
        })
    }
}

fn log_result(result: &TriggerResult) {
    match result {
        TriggerResult::Completed(summary) => {
            for outcome in &summary.outcomes {
                match outcome {
                    BatchOutcome::Settled { index, paid } => {
                        debug!("Batch {} settled to {} destinations", index, paid.len());
                    }
                    BatchOutcome::Failed { index, error } => {
                        warn!("Batch {} not sent, retried next pass: {}", index, error);
                    }
                    BatchOutcome::Unconfirmed {
                        index,
                        error,
                        account_ids,
                    }
                    | BatchOutcome::LedgerUpdateFailed {
                        index,
                        error,
                        account_ids,
                    } => {
                        error!(
                            "🚨 Batch {} possibly sent but unrecorded, holding {:?}: {}",
                            index, account_ids, error
                        );
                    }
                }
            }
            info!(
                "✓ Payment pass {} completed: {} eligible, {} sent, {} failed, {} at risk",
                summary.pass_id,
                summary.eligible,
                summary.settled(),
                summary.failed(),
                summary.at_risk()
            );
        }
        TriggerResult::Failed(error) => error!("❌ Payment pass failed: {}", error),
        TriggerResult::Skipped => {}
    }
}
