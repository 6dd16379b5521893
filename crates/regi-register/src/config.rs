//! # Register Configuration
//!
//! Backend location, register context and scanner settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     REGI_API_URL=http://10.0.0.5:8000/api                              │
//! │     REGI_EMPLOYEE_CODE=E001                                            │
//! │     REGI_TAX_RATE_BPS=1000                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/regi.toml (Linux)                                    │
//! │     ~/Library/Application Support/com.regi.pos/regi.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8000/api, 10% tax                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000/api"
//! timeout_secs = 10
//! connect_timeout_secs = 5
//!
//! [register]
//! employee_code = "E001"
//! tax_rate_bps = 1000
//!
//! [scanner]
//! fps = 10
//! qrbox_width = 250
//! qrbox_height = 250
//! aspect_ratio = 1.0
//!
//! [display]
//! currency_symbol = "¥"
//! currency_decimals = 0
//! ```

use std::path::PathBuf;
use std::time::Duration;

use regi_client::config::DEFAULT_BASE_URL;
use regi_client::ClientConfig;
use regi_core::validation::validate_tax_rate_bps;
use regi_core::{Money, TaxRate, DEFAULT_TAX_RATE_BPS};
use regi_scan::DecodeOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coordinator::CoordinatorOptions;
use crate::error::{RegisterError, RegisterResult};

// =============================================================================
// Backend Settings
// =============================================================================

/// Where the backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Register Settings
// =============================================================================

/// Per-register context sent with purchases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterSettings {
    /// Operator code, sent as `emp_cd`. Omitted from requests when unset.
    #[serde(default)]
    pub employee_code: Option<String>,

    /// Fixed tax rate for the client-side estimate (basis points).
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,
}

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

impl Default for RegisterSettings {
    fn default() -> Self {
        RegisterSettings {
            employee_code: None,
            tax_rate_bps: default_tax_rate_bps(),
        }
    }
}

// =============================================================================
// Scanner Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerSettings {
    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_qrbox")]
    pub qrbox_width: u32,

    #[serde(default = "default_qrbox")]
    pub qrbox_height: u32,

    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
}

fn default_fps() -> u32 {
    10
}

fn default_qrbox() -> u32 {
    250
}

fn default_aspect_ratio() -> f64 {
    1.0
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            fps: default_fps(),
            qrbox_width: default_qrbox(),
            qrbox_height: default_qrbox(),
            aspect_ratio: default_aspect_ratio(),
        }
    }
}

// =============================================================================
// Display Settings
// =============================================================================

/// How amounts are printed by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Minor-unit digits (0 for yen, 2 for dollars).
    #[serde(default)]
    pub currency_decimals: u8,
}

fn default_currency_symbol() -> String {
    "¥".to_string()
}

/// Largest supported `currency_decimals`.
const MAX_CURRENCY_DECIMALS: u8 = 4;

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            currency_symbol: default_currency_symbol(),
            currency_decimals: 0,
        }
    }
}

impl DisplaySettings {
    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust
    /// use regi_core::Money;
    /// use regi_register::config::DisplaySettings;
    ///
    /// let display = DisplaySettings::default();
    /// assert_eq!(display.format_currency(Money::from_minor(1500)), "¥1,500");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let minor = amount.minor();
        let sign = if minor < 0 { "-" } else { "" };
        let decimals = self.currency_decimals.min(MAX_CURRENCY_DECIMALS);

        if decimals == 0 {
            return format!("{}{}{}", sign, self.currency_symbol, Money::from_minor(minor.abs()));
        }

        let divisor = 10_i64.pow(u32::from(decimals));
        let whole = Money::from_minor((minor / divisor).abs());
        let frac = (minor % divisor).abs();

        format!(
            "{}{}{}.{:0width$}",
            sign,
            self.currency_symbol,
            whole,
            frac,
            width = usize::from(decimals)
        )
    }
}

// =============================================================================
// Main Register Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub register: RegisterSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (regi.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RegisterResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as TOML, creating parent directories.
    ///
    /// Returns the path written.
    pub fn save(&self, config_path: Option<PathBuf>) -> RegisterResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RegisterError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RegisterError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| RegisterError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Register config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RegisterResult<()> {
        self.client_config()
            .parsed_base_url()
            .map_err(|e| RegisterError::InvalidConfig(e.to_string()))?;

        if self.backend.timeout_secs == 0 || self.backend.connect_timeout_secs == 0 {
            return Err(RegisterError::InvalidConfig(
                "backend timeouts must be greater than 0".into(),
            ));
        }

        validate_tax_rate_bps(self.register.tax_rate_bps)
            .map_err(|e| RegisterError::InvalidConfig(e.to_string()))?;

        if self.scanner.fps == 0 {
            return Err(RegisterError::InvalidConfig(
                "scanner fps must be greater than 0".into(),
            ));
        }

        if self.scanner.qrbox_width == 0 || self.scanner.qrbox_height == 0 {
            return Err(RegisterError::InvalidConfig(
                "scanner qrbox dimensions must be greater than 0".into(),
            ));
        }

        if !(self.scanner.aspect_ratio.is_finite() && self.scanner.aspect_ratio > 0.0) {
            return Err(RegisterError::InvalidConfig(
                "scanner aspect_ratio must be a positive number".into(),
            ));
        }

        if self.display.currency_decimals > MAX_CURRENCY_DECIMALS {
            return Err(RegisterError::InvalidConfig(format!(
                "display currency_decimals must be at most {}",
                MAX_CURRENCY_DECIMALS
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `REGI_*` overrides from a variable lookup.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("REGI_API_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.base_url = url;
        }

        if let Some(code) = var("REGI_EMPLOYEE_CODE") {
            let code = code.trim().to_string();
            self.register.employee_code = if code.is_empty() { None } else { Some(code) };
        }

        if let Some(bps) = var("REGI_TAX_RATE_BPS") {
            match bps.trim().parse::<u32>() {
                Ok(parsed) => {
                    debug!(tax_rate_bps = parsed, "Overriding tax rate from environment");
                    self.register.tax_rate_bps = parsed;
                }
                Err(_) => warn!(value = %bps, "Ignoring non-numeric REGI_TAX_RATE_BPS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "regi", "pos")
            .map(|dirs| dirs.config_dir().join("regi.toml"))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.backend.base_url.clone(),
            timeout: Duration::from_secs(self.backend.timeout_secs),
            connect_timeout: Duration::from_secs(self.backend.connect_timeout_secs),
        }
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            fps: self.scanner.fps,
            qrbox_width: self.scanner.qrbox_width,
            qrbox_height: self.scanner.qrbox_height,
            aspect_ratio: self.scanner.aspect_ratio,
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.register.tax_rate_bps)
    }

    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            employee_code: self.register.employee_code.clone(),
            tax_rate: self.tax_rate(),
            decode_options: self.decode_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_config_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("regi-config-{}", uuid::Uuid::new_v4()))
            .join("regi.toml")
    }

    #[test]
    fn test_default_config() {
        let config = RegisterConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000/api");
        assert_eq!(config.register.tax_rate_bps, 1000);
        assert_eq!(config.register.employee_code, None);
        assert_eq!(config.scanner.fps, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = RegisterConfig::default();

        config.backend.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        config.backend.base_url = "https://pos.example.com/api".to_string();
        assert!(config.validate().is_ok());

        config.backend.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.backend.timeout_secs = 10;

        config.register.tax_rate_bps = 20_000;
        assert!(config.validate().is_err());
        config.register.tax_rate_bps = 800;

        config.scanner.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RegisterConfig = toml::from_str(
            r#"
            [register]
            employee_code = "E001"
            "#,
        )
        .unwrap();

        assert_eq!(config.register.employee_code.as_deref(), Some("E001"));
        assert_eq!(config.register.tax_rate_bps, 1000);
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.scanner.qrbox_width, 250);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("REGI_API_URL", "http://10.0.0.5:8000/api"),
            ("REGI_EMPLOYEE_CODE", " E042 "),
            ("REGI_TAX_RATE_BPS", "800"),
        ]
        .into_iter()
        .collect();

        let mut config = RegisterConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://10.0.0.5:8000/api");
        assert_eq!(config.register.employee_code.as_deref(), Some("E042"));
        assert_eq!(config.tax_rate().bps(), 800);
    }

    #[test]
    fn test_bad_numeric_override_is_ignored() {
        let mut config = RegisterConfig::default();
        config.apply_overrides(|key| (key == "REGI_TAX_RATE_BPS").then(|| "ten".to_string()));
        assert_eq!(config.register.tax_rate_bps, 1000);
    }

    #[test]
    fn test_save_then_load_file() {
        let path = temp_config_path();
        let mut config = RegisterConfig::default();
        config.register.employee_code = Some("E001".into());
        config.scanner.fps = 15;

        config.save(Some(path.clone())).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[backend]"));
        assert!(contents.contains("[scanner]"));

        let loaded: RegisterConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_format_currency_yen() {
        let display = DisplaySettings::default();
        assert_eq!(display.format_currency(Money::from_minor(300)), "¥300");
        assert_eq!(display.format_currency(Money::from_minor(1234567)), "¥1,234,567");
        assert_eq!(display.format_currency(Money::from_minor(-150)), "-¥150");
        assert_eq!(display.format_currency(Money::zero()), "¥0");
    }

    #[test]
    fn test_format_currency_with_decimals() {
        let display = DisplaySettings {
            currency_symbol: "$".into(),
            currency_decimals: 2,
        };
        assert_eq!(display.format_currency(Money::from_minor(1234)), "$12.34");
        assert_eq!(display.format_currency(Money::from_minor(1)), "$0.01");
        assert_eq!(display.format_currency(Money::from_minor(123456789)), "$1,234,567.89");
        assert_eq!(display.format_currency(Money::from_minor(-1234)), "-$12.34");
    }

    #[test]
    fn test_derived_settings() {
        let config = RegisterConfig::default();
        assert_eq!(config.client_config().timeout, Duration::from_secs(10));
        assert_eq!(config.decode_options(), DecodeOptions::default());
        assert_eq!(config.coordinator_options().tax_rate.bps(), 1000);
    }
}
