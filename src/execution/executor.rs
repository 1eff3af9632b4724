use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::rpc::RpcTransport;
use super::send_transaction::SendTransactionAdapter;
use super::split_transfer::SplitTransferAdapter;
use super::tx_keys::TxKeySink;
use crate::config::DaemonType;
use crate::error::{AppError, AppResult};
use crate::payments::batch::TransferBatch;

/// One on-chain transaction produced by a transfer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub tx_hash: String,
    pub amount: i64,
    pub tx_key: Option<String>,
}

/// Wallet acknowledgement for one batch; a batch may be split into several transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transactions: Vec<SentTransaction>,
}

/// Wire shape of the wallet's transfer call for one daemon family
pub trait WalletAdapter: Send + Sync {
    fn method(&self) -> &'static str;

    fn build_params(&self, batch: &TransferBatch) -> AppResult<Value>;

    fn parse_receipt(&self, batch: &TransferBatch, result: Value) -> AppResult<TransferReceipt>;
}

pub fn adapter_for(daemon_type: DaemonType) -> Box<dyn WalletAdapter> {
    match daemon_type {
        DaemonType::Default => Box::new(SplitTransferAdapter),
        DaemonType::Bytecoin => Box::new(SendTransactionAdapter),
    }
}

/// TransferExecutor - submits batches to the wallet service
///
/// INVARIANTS:
/// - Never retries a submission; one call per batch
/// - Batches are independent, callers may submit them concurrently
pub struct TransferExecutor {
    wallet: Arc<dyn RpcTransport>,
    adapter: Box<dyn WalletAdapter>,
    tx_key_sink: Option<Arc<dyn TxKeySink>>,
}

impl TransferExecutor {
    pub fn new(wallet: Arc<dyn RpcTransport>, daemon_type: DaemonType) -> Self {
        Self {
            wallet,
            adapter: adapter_for(daemon_type),
            tx_key_sink: None,
        }
    }

    pub fn with_tx_key_sink(mut self, sink: Arc<dyn TxKeySink>) -> Self {
        self.tx_key_sink = Some(sink);
        self
    }

    pub fn method(&self) -> &'static str {
        self.adapter.method()
    }

    /// Transport failures and JSON-RPC `error` replies mean nothing was sent.
    /// A reply that cannot be read is `AppError::AmbiguousSubmission`: the
    /// wallet may already have broadcast the transfer.
    #[instrument(skip(self, batch), fields(batch = batch.index, destinations = batch.destinations.len()))]
    pub async fn submit(&self, batch: &TransferBatch) -> AppResult<TransferReceipt> {
        let method = self.adapter.method();
        let params = self.adapter.build_params(batch)?;

        let result = self
            .wallet
            .call(method, params)
            .await
            .map_err(|e| match e {
                AppError::InvalidResponse { method, message } => {
                    AppError::AmbiguousSubmission { method, message }
                }
                other => other,
            })?;

        let receipt = self
            .adapter
            .parse_receipt(batch, result)
            .map_err(|e| AppError::ambiguous_submission(method, e.to_string()))?;

        info!(
            "Payments sent via wallet daemon: {:?}",
            receipt
                .transactions
                .iter()
                .map(|tx| tx.tx_hash.as_str())
                .collect::<Vec<_>>()
        );

        if let Some(sink) = &self.tx_key_sink {
            for tx in &receipt.transactions {
                let Some(key) = tx.tx_key.as_deref() else {
                    continue;
                };
                if let Err(e) = sink.record(&tx.tx_hash, key).await {
                    error!("Error writing tx key for {}: {}", tx.tx_hash, e);
                }
            }
        }

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::testing::ScriptedRpc;
    use crate::payments::batch::tests::batch_of;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl TxKeySink for RecordingSink {
        async fn record(&self, tx_hash: &str, tx_key: &str) -> AppResult<()> {
            self.lines
                .lock()
                .push((tx_hash.to_string(), tx_key.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_submit_uses_configured_adapter() {
        let wallet = Arc::new(ScriptedRpc::wallet_ok());
        let executor = TransferExecutor::new(wallet.clone(), DaemonType::Bytecoin);
        let batch = batch_of(&[("w1", "addr1", 150)]);

        let receipt = executor.submit(&batch).await.unwrap();

        assert_eq!(receipt.transactions.len(), 1);
        let calls = wallet.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sendTransaction");
        assert_eq!(calls[0].1["transfers"][0]["amount"], 150);
    }

    #[tokio::test]
    async fn test_tx_keys_are_recorded() {
        let wallet = Arc::new(ScriptedRpc::wallet_ok());
        let sink = Arc::new(RecordingSink::default());
        let executor =
            TransferExecutor::new(wallet, DaemonType::Default).with_tx_key_sink(sink.clone());
        let mut batch = batch_of(&[("w1", "addr1", 150)]);
        batch.get_tx_keys = true;

        let receipt = executor.submit(&batch).await.unwrap();

        let lines = sink.lines.lock().clone();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, receipt.transactions[0].tx_hash);
    }

    #[tokio::test]
    async fn test_unreadable_reply_is_ambiguous() {
        let wallet = Arc::new(ScriptedRpc::new(|_, _| {
            Ok(serde_json::json!({ "tx_hash_list": ["sent-hash"], "amount_list": [] }))
        }));
        let executor = TransferExecutor::new(wallet, DaemonType::Default);
        let batch = batch_of(&[("w1", "addr1", 150)]);

        let err = executor.submit(&batch).await.unwrap_err();
        assert!(err.is_ambiguous_submission());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_ambiguous() {
        let wallet = Arc::new(ScriptedRpc::new(|method, _| {
            Err(AppError::invalid_response(method, "expected value at line 1"))
        }));
        let executor = TransferExecutor::new(wallet, DaemonType::Bytecoin);
        let batch = batch_of(&[("w1", "addr1", 150)]);

        let err = executor.submit(&batch).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::AmbiguousSubmission { ref method, .. } if method == "sendTransaction"
        ));
    }

    #[tokio::test]
    async fn test_wallet_error_is_returned() {
        let wallet = Arc::new(ScriptedRpc::new(|method, _| {
            Err(AppError::rpc(method, "not enough money"))
        }));
        let executor = TransferExecutor::new(wallet, DaemonType::Default);
        let batch = batch_of(&[("w1", "addr1", 150)]);

        let result = executor.submit(&batch).await;
        assert!(matches!(result, Err(AppError::Rpc { .. })));
    }
}
