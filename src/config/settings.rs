use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::AppInfo;
use crate::device::catalog::{default_catalog, validate_catalog, CatalogError};
use crate::device::protocol::ReadbackMode;
use crate::device::IndicatorGroup;
use crate::serial::DEFAULT_BAUD_RATE;

/// Environment variable pointing at the settings file
pub const CONFIG_ENV: &str = "CHP_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid indicator catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub app_name: String,
    /// Reported as `DEVELOPMENT` instead of the crate version
    pub development: bool,
    /// Port opened at startup
    pub auto_connect: Option<String>,
    pub baud_rate: u32,
    pub readback: ReadbackMode,
    pub log_level: String,
    pub request_capacity: usize,
    pub event_capacity: usize,
    pub indicators: Vec<IndicatorGroup>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: "CHP Lighting Controller".to_string(),
            development: cfg!(debug_assertions),
            auto_connect: None,
            baud_rate: DEFAULT_BAUD_RATE,
            readback: ReadbackMode::Mirror,
            log_level: "info".to_string(),
            request_capacity: 64,
            event_capacity: 256,
            indicators: default_catalog(),
        }
    }
}

impl AppSettings {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let settings: AppSettings = serde_json::from_str(&raw)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `$CHP_CONFIG`, or defaults when unset
    pub fn from_env() -> Result<Self, SettingsError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.baud_rate == 0 {
            return Err(SettingsError::Invalid("baud_rate must be non-zero".to_string()));
        }
        if self.request_capacity == 0 || self.event_capacity == 0 {
            return Err(SettingsError::Invalid("channel capacities must be non-zero".to_string()));
        }
        validate_catalog(&self.indicators)?;
        Ok(())
    }

    pub fn app_info(&self) -> AppInfo {
        AppInfo {
            app_name: self.app_name.clone(),
            app_version: if self.development {
                "DEVELOPMENT".to_string()
            } else {
                env!("CARGO_PKG_VERSION").to_string()
            },
        }
    }
}
