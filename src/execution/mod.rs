pub mod daemon;
pub mod executor;
pub mod rpc;
pub mod send_transaction;
pub mod split_transfer;
pub mod tx_keys;

#[cfg(test)]
pub mod testing;

pub use daemon::DaemonClient;
pub use executor::{TransferExecutor, TransferReceipt};
pub use rpc::JsonRpcClient;
pub use tx_keys::FileTxKeySink;
