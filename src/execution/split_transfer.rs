// `transfer_split` wire shape used by monero-family wallets

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::executor::{SentTransaction, TransferReceipt, WalletAdapter};
use crate::error::{AppError, AppResult};
use crate::payments::batch::TransferBatch;
use crate::payments::privacy::PrivacySetting;

const METHOD: &str = "transfer_split";

#[derive(Debug, Serialize)]
struct WireDestination<'a> {
    address: &'a str,
    amount: i64,
}

#[derive(Debug, Serialize)]
struct SplitTransferParams<'a> {
    destinations: Vec<WireDestination<'a>>,
    fee: i64,
    mixin: u32,
    priority: u32,
    unlock_time: u64,
    get_tx_keys: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_privacy_settings: Option<PrivacySetting>,
}

#[derive(Debug, Deserialize)]
struct SplitTransferResult {
    tx_hash_list: Vec<String>,
    amount_list: Vec<i64>,
    #[serde(default)]
    tx_key_list: Vec<String>,
}

pub struct SplitTransferAdapter;

impl WalletAdapter for SplitTransferAdapter {
    fn method(&self) -> &'static str {
        METHOD
    }

    fn build_params(&self, batch: &TransferBatch) -> AppResult<Value> {
        let params = SplitTransferParams {
            destinations: batch
                .destinations
                .iter()
                .map(|d| WireDestination {
                    address: &d.address,
                    amount: d.amount,
                })
                .collect(),
            fee: batch.fee,
            mixin: batch.mixin,
            priority: batch.priority,
            unlock_time: batch.unlock_time,
            get_tx_keys: batch.get_tx_keys,
            payment_id: batch.payment_id.as_deref(),
            tx_privacy_settings: batch.privacy,
        };
        Ok(serde_json::to_value(params)?)
    }

    fn parse_receipt(&self, _batch: &TransferBatch, result: Value) -> AppResult<TransferReceipt> {
        let result: SplitTransferResult = serde_json::from_value(result)
            .map_err(|e| AppError::invalid_response(METHOD, e.to_string()))?;

        if result.tx_hash_list.len() != result.amount_list.len() {
            return Err(AppError::invalid_response(
                METHOD,
                format!(
                    "{} hashes but {} amounts",
                    result.tx_hash_list.len(),
                    result.amount_list.len()
                ),
            ));
        }

        let transactions = result
            .tx_hash_list
            .into_iter()
            .zip(result.amount_list)
            .enumerate()
            .map(|(i, (tx_hash, amount))| SentTransaction {
                tx_hash,
                amount,
                tx_key: result.tx_key_list.get(i).cloned(),
            })
            .collect();

        Ok(TransferReceipt { transactions })
    }
}
