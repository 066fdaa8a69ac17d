//! Shop settings (singleton).

use serde::{Deserialize, Serialize};

use crate::types::Amount;

/// A bank account shown on the checkout/payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub bank_name: String,
    pub account_number: String,
    pub holder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Store-wide settings. At most one record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Flat shipping fee added to every order at checkout.
    #[serde(default)]
    pub shipping_fee: Amount,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
    #[serde(default)]
    pub product_details_text: String,
    #[serde(default)]
    pub product_specs_text: String,
    #[serde(default)]
    pub shipping_return_text: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let settings = Settings::default();
        assert_eq!(settings.shipping_fee, Amount::ZERO);
        assert!(settings.bank_accounts.is_empty());
    }

    #[test]
    fn test_wire_names() {
        let settings = Settings {
            shipping_fee: Amount::new(5000),
            bank_accounts: vec![BankAccount {
                bank_name: "Khan".into(),
                account_number: "123".into(),
                holder: "Shop".into(),
                note: None,
            }],
            ..Settings::default()
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["shippingFee"], 5000);
        assert_eq!(json["bankAccounts"][0]["bankName"], "Khan");
    }
}
