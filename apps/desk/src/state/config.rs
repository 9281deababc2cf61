//! # Configuration State
//!
//! The slice of [`DeskConfig`] that commands read at runtime.
//!
//! ## Thread Safety
//! Read-only after initialization, so no mutex needed.

use billbook_core::{Money, Percent};
use serde::Serialize;

use crate::config::DeskConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (printed on bills)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Tax a new cart starts with
    pub default_tax_percent: Percent,

    /// Discount a new cart starts with
    pub default_discount_percent: Percent,
}

impl From<&DeskConfig> for ConfigState {
    fn from(config: &DeskConfig) -> Self {
        ConfigState {
            store_name: config.store.name.clone(),
            currency_symbol: config.store.currency_symbol.clone(),
            default_tax_percent: Percent::from_percentage(config.billing.default_tax_percent),
            default_discount_percent: Percent::from_percentage(
                config.billing.default_discount_percent,
            ),
        }
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState::from(&DeskConfig::default())
    }
}

impl ConfigState {
    /// Formats an amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(37170)), "₹371.70");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let whole = (cents / 100).abs();
        let frac = (cents % 100).abs();

        format!(
            "{}{}{}.{:02}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            whole,
            frac
        )
    }
}
