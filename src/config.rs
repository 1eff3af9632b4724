use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::AppResult;

/// Default config file stem, resolved by the `config` crate (payments.toml, payments.json, ...)
const DEFAULT_CONFIG_FILE: &str = "payments";

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct Config {
    /// Namespace prefix for every ledger key
    #[validate(length(min = 1))]
    pub coin: String,
    pub redis_url: String,
    pub daemon: RpcEndpoint,
    pub wallet: RpcEndpoint,
    pub daemon_type: DaemonType,
    #[validate]
    pub payments: PaymentsConfig,
    #[validate]
    pub addresses: AddressConfig,
    pub tx_privacy: TxPrivacyConfig,
    pub tx_keys: TxKeyConfig,
    #[validate]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RpcEndpoint {
    pub url: String,
}

/// Wallet daemon family, selects the transfer wire adapter
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DaemonType {
    #[default]
    Default,
    Bytecoin,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[validate(schema(function = "validate_payout_range"))]
#[serde(default)]
pub struct PaymentsConfig {
    /// Seconds between the end of one pass and the start of the next
    #[validate(range(min = 1))]
    pub interval_secs: u64,
    #[validate(range(min = 0))]
    pub min_payment: i64,
    pub max_payment: Option<i64>,
    /// Balances are truncated to a multiple of this before payout
    #[validate(range(min = 1))]
    pub denomination: i64,
    #[validate(range(min = 0))]
    pub transfer_fee: i64,
    pub dynamic_transfer_fee: bool,
    pub miner_pays_fee: bool,
    #[validate(range(min = 1))]
    pub max_addresses: usize,
    #[validate(range(min = 1))]
    pub max_transaction_amount: Option<i64>,
    pub mixin: u32,
    pub priority: u32,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            min_payment: 100_000_000_000,
            max_payment: None,
            denomination: 10_000_000_000,
            transfer_fee: 4_000_000_000,
            dynamic_transfer_fee: true,
            miner_pays_fee: true,
            max_addresses: 50,
            max_transaction_amount: None,
            mixin: 5,
            priority: 0,
        }
    }
}

fn validate_payout_range(payments: &PaymentsConfig) -> Result<(), ValidationError> {
    match payments.max_payment {
        Some(max) if max < payments.min_payment => {
            Err(ValidationError::new("max_payment_below_min_payment"))
        }
        _ => Ok(()),
    }
}

/// Rules for splitting worker logins into a wallet address and payment id
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(default)]
pub struct AddressConfig {
    #[validate(length(min = 1))]
    pub payment_id_separator: String,
    /// Legacy fixed-difficulty suffix separator (`address<sep><difficulty>`)
    pub fixed_diff_separator: Option<String>,
    pub integrated_address_prefix: Option<String>,
    pub integrated_address_length: Option<usize>,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            payment_id_separator: "+".to_string(),
            fixed_diff_separator: None,
            integrated_address_prefix: None,
            integrated_address_length: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyMode {
    Public,
    #[default]
    Private,
    /// Looked up per address in the ledger store
    #[serde(alias = "settings")]
    PerAddress,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TxPrivacyConfig {
    pub enabled: bool,
    /// Hard fork version from which the wallet accepts a privacy setting
    pub min_hard_fork: u64,
    pub mode: PrivacyMode,
}

impl Default for TxPrivacyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_hard_fork: 10,
            mode: PrivacyMode::Private,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TxKeyConfig {
    pub enabled: bool,
    pub log_path: String,
}

impl Default for TxKeyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: "payments_txkey.log".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[validate(schema(function = "validate_display_decimals"))]
#[serde(default)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    pub operator_webhook_url: Option<String>,
    pub coin_symbol: String,
    /// Atomic units per coin, as a power of ten; decimal scale caps it at 28
    #[validate(range(max = 28))]
    pub coin_decimals: u32,
    pub display_decimals: u32,
}

fn validate_display_decimals(notifications: &NotificationConfig) -> Result<(), ValidationError> {
    if notifications.display_decimals > notifications.coin_decimals {
        return Err(ValidationError::new("display_decimals_above_coin_decimals"));
    }
    Ok(())
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            operator_webhook_url: None,
            coin_symbol: "XMR".to_string(),
            coin_decimals: 12,
            display_decimals: 4,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coin: "xmr".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            daemon: RpcEndpoint {
                url: "http://127.0.0.1:18081".to_string(),
            },
            wallet: RpcEndpoint {
                url: "http://127.0.0.1:18082".to_string(),
            },
            daemon_type: DaemonType::Default,
            payments: PaymentsConfig::default(),
            addresses: AddressConfig::default(),
            tx_privacy: TxPrivacyConfig::default(),
            tx_keys: TxKeyConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Config {
    /// Layered load: built-in defaults, then the config file, then
    /// `PAYMENTS__SECTION__KEY` environment variables.
    pub fn load() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let path = std::env::var("PAYMENTS_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("PAYMENTS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.payments.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.addresses.payment_id_separator, "+");
        assert_eq!(config.interval(), std::time::Duration::from_secs(300));
    }

    #[test]
    fn test_rejects_zero_max_addresses() {
        let mut config = Config::default();
        config.payments.max_addresses = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_max_payment_below_min() {
        let mut config = Config::default();
        config.payments.min_payment = 1_000;
        config.payments.max_payment = Some(500);
        assert!(config.validate().is_err());

        config.payments.max_payment = Some(5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unrepresentable_coin_decimals() {
        let mut config = Config::default();
        config.notifications.coin_decimals = 29;
        config.notifications.display_decimals = 4;
        assert!(config.validate().is_err());

        config.notifications.coin_decimals = 28;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_display_decimals_above_coin_decimals() {
        let mut config = Config::default();
        config.notifications.coin_decimals = 8;
        config.notifications.display_decimals = 9;
        assert!(config.validate().is_err());

        config.notifications.display_decimals = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_privacy_mode_accepts_settings_alias() {
        let mode: PrivacyMode = serde_json::from_str("\"settings\"").unwrap();
        assert_eq!(mode, PrivacyMode::PerAddress);

        let daemon: DaemonType = serde_json::from_str("\"bytecoin\"").unwrap();
        assert_eq!(daemon, DaemonType::Bytecoin);
    }
}
