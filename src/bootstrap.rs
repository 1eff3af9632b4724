use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::execution::{DaemonClient, FileTxKeySink, JsonRpcClient, TransferExecutor};
use crate::ledger::RedisLedgerStore;
use crate::notifications::{LogNotifier, Notifier, WebhookNotifier};
use crate::payments::{PaymentProcessor, PaymentScheduler};

pub async fn initialize_scheduler(config: &Config) -> AppResult<Arc<PaymentScheduler>> {
    info!("Initializing payment components ...");

    let store = Arc::new(RedisLedgerStore::connect(&config.redis_url, &config.coin).await?);

    let daemon = DaemonClient::new(Arc::new(JsonRpcClient::new(&config.daemon.url)));
    info!("✅ Daemon RPC at {}", config.daemon.url);

    let mut executor = TransferExecutor::new(
        Arc::new(JsonRpcClient::new(&config.wallet.url)),
        config.daemon_type,
    );
    info!(
        "✅ Wallet RPC at {} using {}",
        config.wallet.url,
        executor.method()
    );

    if config.tx_keys.enabled {
        executor = executor.with_tx_key_sink(Arc::new(FileTxKeySink::new(&config.tx_keys.log_path)));
        info!("✅ Transaction keys logged to {}", config.tx_keys.log_path);
    }

    let notifier: Arc<dyn Notifier> = if config.notifications.webhook_url.is_some()
        || config.notifications.operator_webhook_url.is_some()
    {
        Arc::new(WebhookNotifier::new(
            config.notifications.webhook_url.clone(),
            config.notifications.operator_webhook_url.clone(),
        ))
    } else {
        warn!("⚠️  No notification webhooks configured - notices will only be logged");
        Arc::new(LogNotifier)
    };

    let processor = Arc::new(PaymentProcessor::new(
        config,
        store,
        daemon,
        executor,
        notifier,
    ));

    info!(
        "✅ Payment processor ready (interval {}s, max {} addresses per transfer)",
        config.payments.interval_secs, config.payments.max_addresses
    );

    Ok(Arc::new(PaymentScheduler::new(processor, config.interval())))
}
