use serde::{Deserialize, Serialize};
use std::fmt;

/// Worker account as held in `<coin>:workers:<id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub balance: i64,
    /// Worker-chosen payout threshold, unclamped
    pub min_payout_level: Option<i64>,
    pub paid: i64,
}

#[cfg(test)]
impl Account {
    pub fn new(id: impl Into<String>, balance: i64) -> Self {
        Self {
            id: id.into(),
            balance,
            min_payout_level: None,
            paid: 0,
        }
    }

    pub fn with_min_payout_level(mut self, level: i64) -> Self {
        self.min_payout_level = Some(level);
        self
    }
}

/// Numeric hash fields of a worker account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    Balance,
    Paid,
}

impl AccountField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountField::Balance => "balance",
            AccountField::Paid => "paid",
        }
    }
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time-ordered payment history log
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentLog {
    All,
    Destination(String),
}

/// One transaction as written to the payment history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub tx_hash: String,
    pub amount: i64,
    pub fee: i64,
    pub mixin: u32,
    pub destination_count: usize,
}

impl PaymentRecord {
    /// Member stored in the global log
    pub fn global_entry(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.tx_hash, self.amount, self.fee, self.mixin, self.destination_count
        )
    }

    /// Member stored in a per-destination log
    pub fn destination_entry(&self) -> String {
        format!("{}:{}:{}:{}", self.tx_hash, self.amount, self.fee, self.mixin)
    }

    pub fn entry_for(&self, log: &PaymentLog) -> String {
        match log {
            PaymentLog::All => self.global_entry(),
            PaymentLog::Destination(_) => self.destination_entry(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    IncrementField {
        account_id: String,
        field: AccountField,
        delta: i64,
    },
    AppendPayment {
        log: PaymentLog,
        timestamp: i64,
        record: PaymentRecord,
    },
}

/// Ledger changes for one batch, applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerMutation {
    pub ops: Vec<LedgerOp>,
}

impl LedgerMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, account_id: &str, field: AccountField, delta: i64) {
        self.ops.push(LedgerOp::IncrementField {
            account_id: account_id.to_string(),
            field,
            delta,
        });
    }

    pub fn append_payment(&mut self, log: PaymentLog, timestamp: i64, record: PaymentRecord) {
        self.ops.push(LedgerOp::AppendPayment {
            log,
            timestamp,
            record,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Net change this mutation applies to one account field
    #[cfg(test)]
    pub fn net_delta(&self, account_id: &str, field: AccountField) -> i64 {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LedgerOp::IncrementField {
                    account_id: id,
                    field: f,
                    delta,
                } if id == account_id && *f == field => Some(*delta),
                _ => None,
            })
            .sum()
    }
}
