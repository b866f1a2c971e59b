//! # Client Configuration
//!
//! Settings for the booking client, read from a YAML file. Every field has a
//! default, so an empty file (or no file at all) gives a working client
//! pointed at the production API.
//!
//! ## YAML Format
//!
//! ```yaml
//! api_base_url: "https://api-tcc-v2pq.onrender.com"
//! request_timeout_secs: 60
//! default_consultation_price: "200.00"
//! payment_method: "PIX"
//! logging:
//!   level: "info"
//! slot_catalog:
//!   default: ["08:00", "09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00", "17:00"]
//!   per_professional:
//!     7: ["09:00", "10:00"]
//! session_file: "/home/ana/.local/share/clinivida/session.json"
//! ```
//!
//! `CLINIVIDA_API_URL` and `CLINIVIDA_LOG` override the base URL and the log
//! level after the file is read.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::PaymentMethod;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::state::availability_state::{SlotCatalog, DEFAULT_SLOT_TIMES};

pub const DEFAULT_API_BASE_URL: &str = "https://api-tcc-v2pq.onrender.com";
pub const API_URL_ENV: &str = "CLINIVIDA_API_URL";
pub const LOG_LEVEL_ENV: &str = "CLINIVIDA_LOG";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Start times offered by default and per professional, as `HH:MM` strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotCatalogConfig {
    pub default: Vec<String>,
    pub per_professional: HashMap<i64, Vec<String>>,
}

impl Default for SlotCatalogConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_SLOT_TIMES.iter().map(|t| t.to_string()).collect(),
            per_professional: HashMap::new(),
        }
    }
}

/// Booking client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Price used when a professional has no (valid) consultation price
    pub default_consultation_price: Decimal,
    pub payment_method: PaymentMethod,
    pub logging: LoggingConfig,
    pub slot_catalog: SlotCatalogConfig,
    /// Where the session is persisted; defaults to the user data directory
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 60,
            default_consultation_price: Decimal::new(200, 0),
            payment_method: PaymentMethod::Pix,
            logging: LoggingConfig::default(),
            slot_catalog: SlotCatalogConfig::default(),
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = if yaml.trim().is_empty() {
            ClientConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a YAML file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        info!("⚙️ Loaded client config from {:?}", path);
        Ok(config)
    }

    /// Like [`ClientConfig::load`], but falls back to defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                debug!("Using default client config");
                Ok(config)
            }
        }
    }

    /// Apply `CLINIVIDA_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (used by the environment and by tests)
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!("API base URL overridden by {}", API_URL_ENV);
            self.api_base_url = url;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.logging.level = level;
        }
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.default_consultation_price.is_sign_negative() {
            return Err(ConfigError::Invalid(
                "default_consultation_price cannot be negative".to_string(),
            ));
        }
        self.slot_catalog()?;
        Ok(())
    }

    /// Build the slot catalog described by this configuration
    pub fn slot_catalog(&self) -> Result<SlotCatalog, ConfigError> {
        let mut catalog = SlotCatalog::new(self.slot_catalog.default.as_slice())?;
        for (professional_id, times) in &self.slot_catalog.per_professional {
            catalog = catalog.with_professional(*professional_id, times.as_slice())?;
        }
        Ok(catalog)
    }

    /// Session file location
    pub fn session_path(&self) -> PathBuf {
        match &self.session_file {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("clinivida")
                .join("session.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.default_consultation_price, Decimal::new(200, 0));
        assert_eq!(config.payment_method, PaymentMethod::Pix);
        assert_eq!(config.slot_catalog().unwrap().slots_for(1).len(), 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        assert_eq!(ClientConfig::from_yaml("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
api_base_url: "http://localhost:3000"
default_consultation_price: "150.00"
slot_catalog:
  per_professional:
    7: ["09:00", "10:00"]
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.default_consultation_price, Decimal::new(150, 0));

        let catalog = config.slot_catalog().unwrap();
        assert_eq!(catalog.slots_for(7).len(), 2);
        assert_eq!(catalog.slots_for(8).len(), 9);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            ClientConfig::from_yaml("request_timeout_secs: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_yaml("default_consultation_price: -1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_yaml("slot_catalog:\n  default: [\"8am\"]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ClientConfig::from_yaml("request_timeout_secs: [1, 2]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let mut config = ClientConfig::default();
        config.apply_overrides_with(|key| match key {
            API_URL_ENV => Some("http://staging.local".to_string()),
            LOG_LEVEL_ENV => Some("debug".to_string()),
            _ => None,
        });

        assert_eq!(config.api_base_url, "http://staging.local");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut config = ClientConfig::default();
        config.apply_overrides_with(|_| Some("   ".to_string()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs: 5").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::load(Path::new("/definitely/not/here/clinivida.yaml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_session_path_override() {
        let config = ClientConfig {
            session_file: Some(PathBuf::from("/tmp/clinivida-session.json")),
            ..ClientConfig::default()
        };
        assert_eq!(config.session_path(), PathBuf::from("/tmp/clinivida-session.json"));
    }
}
