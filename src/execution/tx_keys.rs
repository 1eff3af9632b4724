use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AppResult;

/// Audit sink for transaction keys returned by the wallet
#[async_trait]
pub trait TxKeySink: Send + Sync {
    async fn record(&self, tx_hash: &str, tx_key: &str) -> AppResult<()>;
}

/// Appends `tx_hash:<hash>, tx_key:<key>` lines to a file
pub struct FileTxKeySink {
    path: PathBuf,
    // concurrent batches share the file
    write_lock: Mutex<()>,
}

impl FileTxKeySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn line(tx_hash: &str, tx_key: &str) -> String {
        format!("tx_hash:{}, tx_key:{}\n", tx_hash, tx_key)
    }
}

#[async_trait]
impl TxKeySink for FileTxKeySink {
    async fn record(&self, tx_hash: &str, tx_key: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(Self::line(tx_hash, tx_key).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
