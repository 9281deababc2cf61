//! # Desk Configuration
//!
//! Configuration loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BILLBOOK_DB_PATH=/srv/shop/billbook.db                             │
//! │     BILLBOOK_TAX_PERCENT=18                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $BILLBOOK_CONFIG, or                                               │
//! │     ~/.config/billbook/billbook.toml (Linux)                           │
//! │     ~/Library/Application Support/com.billbook.desk/billbook.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "Sharma General Store"
//! currency_symbol = "₹"
//!
//! [billing]
//! default_tax_percent = 18.0
//! default_discount_percent = 0.0
//!
//! [database]
//! path = "/srv/shop/billbook.db"
//!
//! [draft]
//! autosave_interval_secs = 5
//!
//! [logging]
//! filter = "info,billbook=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DeskError, DeskResult};

/// Points at an explicit config file.
pub const CONFIG_PATH_VAR: &str = "BILLBOOK_CONFIG";

const CONFIG_FILE_NAME: &str = "billbook.toml";
const DATABASE_FILE_NAME: &str = "billbook.db";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Shown on printed bills.
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_store_name() -> String {
    "Billbook Store".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Percentages a new cart starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSettings {
    #[serde(default = "default_tax_percent")]
    pub default_tax_percent: f64,

    #[serde(default)]
    pub default_discount_percent: f64,
}

fn default_tax_percent() -> f64 {
    18.0
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            default_tax_percent: default_tax_percent(),
            default_discount_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSettings {
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,
}

fn default_autosave_interval() -> u64 {
    5
}

impl Default for DraftSettings {
    fn default() -> Self {
        DraftSettings {
            autosave_interval_secs: default_autosave_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives. `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,billbook=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Desk Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub billing: BillingSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub draft: DraftSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl DeskConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`path`, else `$BILLBOOK_CONFIG`, else the platform
    ///    config dir). A missing file is not an error.
    /// 3. `BILLBOOK_*` environment variables
    ///
    /// The result is validated before it is returned.
    pub fn load(path: Option<PathBuf>) -> DeskResult<Self> {
        let path = path
            .or_else(|| std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file without applying overrides.
    pub fn from_file(path: &Path) -> DeskResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DeskResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(DeskError::InvalidConfig("store name must not be empty".into()));
        }

        for (field, value) in [
            ("default_tax_percent", self.billing.default_tax_percent),
            ("default_discount_percent", self.billing.default_discount_percent),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(DeskError::InvalidConfig(format!(
                    "{} must be between 0 and 100, got {}",
                    field, value
                )));
            }
        }

        if self.draft.autosave_interval_secs == 0 {
            return Err(DeskError::InvalidConfig(
                "autosave_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `BILLBOOK_*` overrides read through `var`.
    ///
    /// Unparseable numbers are logged and ignored.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("BILLBOOK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(name) = var("BILLBOOK_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(symbol) = var("BILLBOOK_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }

        if let Some(raw) = var("BILLBOOK_TAX_PERCENT") {
            match raw.trim().parse::<f64>() {
                Ok(pct) => self.billing.default_tax_percent = pct,
                Err(_) => warn!(value = %raw, "Ignoring unparseable BILLBOOK_TAX_PERCENT"),
            }
        }

        if let Some(raw) = var("BILLBOOK_DISCOUNT_PERCENT") {
            match raw.trim().parse::<f64>() {
                Ok(pct) => self.billing.default_discount_percent = pct,
                Err(_) => warn!(value = %raw, "Ignoring unparseable BILLBOOK_DISCOUNT_PERCENT"),
            }
        }

        if let Some(raw) = var("BILLBOOK_AUTOSAVE_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.draft.autosave_interval_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring unparseable BILLBOOK_AUTOSAVE_SECS"),
            }
        }

        if let Some(filter) = var("BILLBOOK_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the database file, creating the platform data directory when
    /// no explicit path is configured.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.billbook.desk/billbook.db`
    /// - **Windows**: `%APPDATA%\billbook\desk\data\billbook.db`
    /// - **Linux**: `~/.local/share/billbook/billbook.db`
    pub fn database_path(&self) -> DeskResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = project_dirs().ok_or(DeskError::NoPlatformDir("data"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.draft.autosave_interval_secs)
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "billbook", "desk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DeskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.billing.default_tax_percent, 18.0);
        assert_eq!(config.autosave_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DeskConfig = toml::from_str(
            r#"
            [store]
            name = "Corner Shop"

            [billing]
            default_tax_percent = 5.0
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Corner Shop");
        assert_eq!(config.store.currency_symbol, "₹");
        assert_eq!(config.billing.default_tax_percent, 5.0);
        assert_eq!(config.billing.default_discount_percent, 0.0);
        assert_eq!(config.draft.autosave_interval_secs, 5);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = DeskConfig::default();
        let env = vars(&[
            ("BILLBOOK_DB_PATH", "/tmp/shop.db"),
            ("BILLBOOK_TAX_PERCENT", "12.5"),
            ("BILLBOOK_AUTOSAVE_SECS", "30"),
        ]);

        config.apply_overrides(|k| env.get(k).cloned());

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/shop.db")));
        assert_eq!(config.billing.default_tax_percent, 12.5);
        assert_eq!(config.draft.autosave_interval_secs, 30);
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/shop.db"));
    }

    #[test]
    fn test_bad_env_numbers_are_ignored() {
        let mut config = DeskConfig::default();
        let env = vars(&[("BILLBOOK_TAX_PERCENT", "lots"), ("BILLBOOK_AUTOSAVE_SECS", "-1")]);

        config.apply_overrides(|k| env.get(k).cloned());

        assert_eq!(config.billing.default_tax_percent, 18.0);
        assert_eq!(config.draft.autosave_interval_secs, 5);
    }

    #[test]
    fn test_validation() {
        let mut config = DeskConfig::default();
        config.billing.default_discount_percent = 120.0;
        assert!(matches!(config.validate(), Err(DeskError::InvalidConfig(_))));

        config.billing.default_discount_percent = 10.0;
        config.draft.autosave_interval_secs = 0;
        assert!(config.validate().is_err());

        config.draft.autosave_interval_secs = 1;
        config.store.name = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let path = std::env::temp_dir().join(format!("billbook-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "[draft]\nautosave_interval_secs = 9\n[logging]\nfilter = \"warn\"\n",
        )
        .unwrap();

        let config = DeskConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.draft.autosave_interval_secs, 9);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let path = std::env::temp_dir().join(format!("billbook-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[store\nname = ").unwrap();

        let result = DeskConfig::from_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(DeskError::ConfigParse(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&DeskConfig::default()).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[draft]"));
    }
}
