// `sendTransaction` wire shape used by bytecoin-family walletd

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::executor::{SentTransaction, TransferReceipt, WalletAdapter};
use crate::error::{AppError, AppResult};
use crate::payments::batch::TransferBatch;

const METHOD: &str = "sendTransaction";

#[derive(Debug, Serialize)]
struct WireTransfer<'a> {
    address: &'a str,
    amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionParams<'a> {
    transfers: Vec<WireTransfer<'a>>,
    fee: i64,
    anonymity: u32,
    unlock_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionResult {
    transaction_hash: String,
    #[serde(default)]
    transaction_secret_key: Option<String>,
}

pub struct SendTransactionAdapter;

impl WalletAdapter for SendTransactionAdapter {
    fn method(&self) -> &'static str {
        METHOD
    }

    fn build_params(&self, batch: &TransferBatch) -> AppResult<Value> {
        let params = SendTransactionParams {
            transfers: batch
                .destinations
                .iter()
                .map(|d| WireTransfer {
                    address: &d.address,
                    amount: d.amount,
                })
                .collect(),
            fee: batch.fee,
            anonymity: batch.mixin,
            unlock_time: batch.unlock_time,
            payment_id: batch.payment_id.as_deref(),
        };
        Ok(serde_json::to_value(params)?)
    }

    /// walletd never splits, so the one transaction carries the whole batch
    fn parse_receipt(&self, batch: &TransferBatch, result: Value) -> AppResult<TransferReceipt> {
        let result: SendTransactionResult = serde_json::from_value(result)
            .map_err(|e| AppError::invalid_response(METHOD, e.to_string()))?;

        Ok(TransferReceipt {
            transactions: vec![SentTransaction {
                tx_hash: result.transaction_hash,
                amount: batch.total_amount(),
                tx_key: result.transaction_secret_key,
            }],
        })
    }
}
