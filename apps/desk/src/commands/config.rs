//! # Configuration Commands

use crate::state::ConfigState;

/// Store name, currency and default percentages for display.
pub fn get_config(config: &ConfigState) -> ConfigState {
    config.clone()
}
