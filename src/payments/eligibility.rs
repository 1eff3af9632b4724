use tracing::{debug, warn};

use crate::config::PaymentsConfig;
use crate::ledger::models::Account;

/// Account selected for payout in the current pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutCandidate {
    pub account_id: String,
    pub amount: i64,
}

/// Effective minimum payout level of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutLevel {
    pub level: i64,
    /// Stored value was outside `[min_payment, max_payment]`
    pub coerced: bool,
}

/// Unset or non-positive stored levels fall back to `min_payment`; anything
/// else is clamped into the configured range.
pub fn effective_payout_level(stored: Option<i64>, payments: &PaymentsConfig) -> PayoutLevel {
    let min = payments.min_payment;
    let requested = match stored {
        Some(level) if level > 0 => level,
        _ => {
            return PayoutLevel {
                level: min,
                coerced: false,
            }
        }
    };

    let mut level = requested.max(min);
    if let Some(max) = payments.max_payment {
        level = level.min(max);
    }

    PayoutLevel {
        level,
        coerced: level != requested,
    }
}

/// Balance rounded down to the denomination, less the fee when the miner pays it
pub fn payable_amount(balance: i64, payments: &PaymentsConfig) -> Option<i64> {
    let denomination = payments.denomination.max(1);
    let mut amount = balance - balance.rem_euclid(denomination);

    if payments.miner_pays_fee {
        amount -= payments.transfer_fee;
    }

    (amount > 0).then_some(amount)
}

/// Eligible accounts with their payout amounts, ordered by account id
pub fn select_candidates(accounts: &[Account], payments: &PaymentsConfig) -> Vec<PayoutCandidate> {
    let mut candidates = Vec::new();

    for account in accounts {
        let payout_level = effective_payout_level(account.min_payout_level, payments);

        if payout_level.coerced {
            warn!(
                "Payout level {:?} for {} out of range, using {}",
                account.min_payout_level, account.id, payout_level.level
            );
        } else if payout_level.level != payments.min_payment {
            debug!(
                "Using payout level of {} for {} (default: {})",
                payout_level.level, account.id, payments.min_payment
            );
        }

        if account.balance < payout_level.level {
            continue;
        }

        if let Some(amount) = payable_amount(account.balance, payments) {
            candidates.push(PayoutCandidate {
                account_id: account.id.clone(),
                amount,
            });
        }
    }

    candidates.sort_by(|a, b| a.account_id.cmp(&b.account_id));
    candidates
}
