// Miner payment notices and operator alerts
//
// Delivery is a JSON webhook; with no webhook configured notices are only logged.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

use crate::config::NotificationConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationEvent {
    Payment,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::Payment => "payment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotice {
    pub display_address: String,
    pub display_amount: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        address: &str,
        event: NotificationEvent,
        notice: &PaymentNotice,
    ) -> AppResult<()>;

    /// Out-of-band alert for conditions that need a human
    async fn alert_operator(&self, message: &str) -> AppResult<()>;
}

/// Human-readable amounts and shortened addresses
#[derive(Debug, Clone)]
pub struct DisplayFormat {
    coin_symbol: String,
    coin_decimals: u32,
    display_decimals: u32,
}

impl DisplayFormat {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            coin_symbol: config.coin_symbol.clone(),
            coin_decimals: config.coin_decimals,
            display_decimals: config.display_decimals,
        }
    }

    pub fn amount(&self, atomic_units: i64) -> String {
        let coins = Decimal::new(atomic_units, self.coin_decimals).round_dp(self.display_decimals);
        format!(
            "{:.*} {}",
            self.display_decimals as usize, coins, self.coin_symbol
        )
    }

    /// First and last seven characters
    pub fn address(&self, address: &str) -> String {
        let chars = address.chars().collect::<Vec<_>>();
        if chars.len() <= 14 {
            return address.to_string();
        }
        let head = chars[..7].iter().collect::<String>();
        let tail = chars[chars.len() - 7..].iter().collect::<String>();
        format!("{}...{}", head, tail)
    }

    pub fn notice(&self, address: &str, amount: i64) -> PaymentNotice {
        PaymentNotice {
            display_address: self.address(address),
            display_amount: self.amount(amount),
        }
    }
}

/// Logs notices instead of delivering them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        address: &str,
        event: NotificationEvent,
        notice: &PaymentNotice,
    ) -> AppResult<()> {
        info!(
            "📣 {} notice for {}: {}",
            event.as_str(),
            address,
            notice.display_amount
        );
        Ok(())
    }

    async fn alert_operator(&self, message: &str) -> AppResult<()> {
        error!("🚨 OPERATOR ALERT: {}", message);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    address: &'a str,
    event: NotificationEvent,
    data: &'a PaymentNotice,
}

#[derive(Debug, Serialize)]
struct OperatorAlert<'a> {
    level: &'static str,
    message: &'a str,
}

/// Posts notices and alerts as JSON to configured webhooks
pub struct WebhookNotifier {
    client: reqwest::Client,
    miner_url: Option<String>,
    operator_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(miner_url: Option<String>, operator_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            miner_url,
            operator_url,
        }
    }

    async fn post<T: Serialize + Sync>(&self, url: &str, body: &T) -> AppResult<()> {
        let response = self.client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Notification(format!(
                "webhook {} rejected notice: {}",
                url, error_text
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        address: &str,
        event: NotificationEvent,
        notice: &PaymentNotice,
    ) -> AppResult<()> {
        let Some(url) = self.miner_url.as_deref() else {
            return LogNotifier.notify(address, event, notice).await;
        };

        let payload = WebhookPayload {
            address,
            event,
            data: notice,
        };
        self.post(url, &payload).await
    }

    async fn alert_operator(&self, message: &str) -> AppResult<()> {
        // always leave a trace in the logs, webhook or not
        LogNotifier.alert_operator(message).await?;

        let Some(url) = self.operator_url.as_deref() else {
            return Ok(());
        };
        self.post(
            url,
            &OperatorAlert {
                level: "critical",
                message,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn format() -> DisplayFormat {
        DisplayFormat::new(&NotificationConfig {
            coin_symbol: "XMR".to_string(),
            coin_decimals: 12,
            display_decimals: 4,
            ..NotificationConfig::default()
        })
    }

    #[test]
    fn test_display_amount() {
        assert_eq!(format().amount(1_234_567_890_000), "1.2346 XMR");
        assert_eq!(format().amount(500_000_000_000), "0.5000 XMR");
        assert_eq!(
            Decimal::new(1_234_567_890_000, 12).round_dp(4),
            dec!(1.2346)
        );
    }

    #[test]
    fn test_display_address() {
        assert_eq!(
            format().address("4AdUndXHHZ6cfufTMvppY6JwXNouMBzSkbLYfpAV5Usx"),
            "4AdUndX...pAV5Usx"
        );
        assert_eq!(format().address("short"), "short");
    }

    #[test]
    fn test_notice_serializes_camel_case() {
        let notice = format().notice("addr", 1_000_000_000_000);
        let value = serde_json::to_value(&notice).unwrap();
        assert_eq!(value["displayAddress"], "addr");
        assert_eq!(value["displayAmount"], "1.0000 XMR");
    }
}
