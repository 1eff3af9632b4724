use crate::config::AddressConfig;

/// Worker login resolved into a wallet address and optional payment id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAddress {
    pub address: String,
    pub payment_id: Option<String>,
    /// Must be paid in a transaction of its own
    pub payment_id_bearing: bool,
}

/// Address with the payment id re-attached, as the miner's login reads
pub fn join_login(address: &str, payment_id: Option<&str>, separator: &str) -> String {
    match payment_id {
        Some(payment_id) => format!("{}{}{}", address, separator, payment_id),
        None => address.to_string(),
    }
}

/// Parse a worker login such as `address`, `address+paymentid` or
/// `address.difficulty` into a transfer destination.
///
/// A malformed payment id is never an error: it is dropped and the address is
/// paid as an ordinary destination.
pub fn normalize_destination(raw: &str, rules: &AddressConfig) -> NormalizedAddress {
    let login = match rules.fixed_diff_separator.as_deref() {
        Some(separator) => strip_fixed_diff(raw, separator),
        None => raw,
    };

    let parts = login.split(rules.payment_id_separator.as_str()).collect::<Vec<_>>();

    if parts.len() >= 2 {
        let candidate = sanitize_payment_id(parts[1]);
        let payment_id = is_valid_payment_id(&candidate).then_some(candidate);
        return NormalizedAddress {
            address: parts[0].to_string(),
            payment_id_bearing: payment_id.is_some(),
            payment_id,
        };
    }

    NormalizedAddress {
        address: login.to_string(),
        payment_id: None,
        payment_id_bearing: is_integrated_address(login, rules),
    }
}

/// Drop a trailing `<separator><digits>` fixed-difficulty suffix
fn strip_fixed_diff<'a>(login: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        return login;
    }
    match login.rsplit_once(separator) {
        Some((address, difficulty))
            if !difficulty.is_empty() && difficulty.chars().all(|c| c.is_ascii_digit()) =>
        {
            address
        }
        _ => login,
    }
}

fn sanitize_payment_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

fn is_valid_payment_id(payment_id: &str) -> bool {
    matches!(payment_id.len(), 16 | 64)
}

/// Integrated addresses carry their payment id inside the address itself
pub fn is_integrated_address(address: &str, rules: &AddressConfig) -> bool {
    let Some(prefix) = rules.integrated_address_prefix.as_deref() else {
        return false;
    };
    if !address.starts_with(prefix) {
        return false;
    }
    rules
        .integrated_address_length
        .map_or(true, |length| address.len() == length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> AddressConfig {
        AddressConfig::default()
    }

    #[test]
    fn test_plain_address() {
        let normalized = normalize_destination("abcDEF", &rules());
        assert_eq!(normalized.address, "abcDEF");
        assert_eq!(normalized.payment_id, None);
        assert!(!normalized.payment_id_bearing);
    }

    #[test]
    fn test_valid_short_payment_id() {
        let normalized = normalize_destination("abcDEF+0123456789abcdef", &rules());
        assert_eq!(normalized.address, "abcDEF");
        assert_eq!(normalized.payment_id.as_deref(), Some("0123456789abcdef"));
        assert!(normalized.payment_id_bearing);
        assert_eq!(
            join_login(&normalized.address, normalized.payment_id.as_deref(), "+"),
            "abcDEF+0123456789abcdef"
        );
    }

    #[test]
    fn test_valid_long_payment_id_is_sanitized() {
        let long = "a".repeat(64);
        let raw = format!("addr+{}-{}", &long[..32], &long[32..]);
        let normalized = normalize_destination(&raw, &rules());
        assert_eq!(normalized.payment_id.as_deref(), Some(long.as_str()));
        assert!(normalized.payment_id_bearing);
    }

    #[test]
    fn test_short_payment_id_is_discarded() {
        let normalized = normalize_destination("addr+short", &rules());
        assert_eq!(normalized.address, "addr");
        assert_eq!(normalized.payment_id, None);
        assert!(!normalized.payment_id_bearing);
        assert_eq!(
            join_login(&normalized.address, normalized.payment_id.as_deref(), "+"),
            "addr"
        );
    }

    #[test]
    fn test_fixed_diff_suffix_is_stripped() {
        let rules = AddressConfig {
            fixed_diff_separator: Some(".".to_string()),
            ..AddressConfig::default()
        };

        assert_eq!(normalize_destination("addr.5000", &rules).address, "addr");

        let normalized = normalize_destination("addr+0123456789abcdef.5000", &rules);
        assert_eq!(normalized.address, "addr");
        assert_eq!(normalized.payment_id.as_deref(), Some("0123456789abcdef"));

        // not a difficulty, left alone
        assert_eq!(normalize_destination("addr.worker", &rules).address, "addr.worker");
    }

    #[test]
    fn test_integrated_address_is_payment_id_bearing() {
        let rules = AddressConfig {
            integrated_address_prefix: Some("4".to_string()),
            integrated_address_length: Some(10),
            ..AddressConfig::default()
        };

        let integrated = normalize_destination("4123456789", &rules);
        assert!(integrated.payment_id_bearing);
        assert_eq!(integrated.payment_id, None);

        assert!(!normalize_destination("412345", &rules).payment_id_bearing);
        assert!(!normalize_destination("8123456789", &rules).payment_id_bearing);
    }
}
