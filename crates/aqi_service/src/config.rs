//! Service configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, `AQI_*` environment variables (nested keys use `__`, e.g.
//! `AQI_PALETTE__POOR`), the bare `PORT` variable, then CLI flags.

use aqi_core::{FeatureKeys, Palette};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::ServiceError;

/// Configuration file read when present and `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config/aqi.toml";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ServiceError::Config(format!(
                "unknown log format '{other}' (expected 'pretty' or 'json')"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Runtime configuration of the AQI service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// JSON array of feature column names
    pub schema_path: PathBuf,
    /// Tree-ensemble model in JSON form
    pub model_path: PathBuf,
    /// Refuse to start when the schema or model cannot be loaded
    pub require_artifacts: bool,
    /// Allow any origin, method and header
    pub cors_permissive: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    pub features: FeatureKeys,
    pub palette: Palette,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10_000,
            schema_path: PathBuf::from("model_columns.json"),
            model_path: PathBuf::from("aqi_model.json"),
            require_artifacts: false,
            cors_permissive: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            features: FeatureKeys::default(),
            palette: Palette::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; otherwise [`DEFAULT_CONFIG_PATH`] is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ServiceError> {
        let resolved = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ServiceError::Config(format!(
                        "configuration file {} not found (specified via --config)",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()),
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved {
            builder = builder.add_source(File::from(path.as_path()));
        }
        builder = builder.add_source(
            Environment::with_prefix("AQI")
                .prefix_separator("_")
                .separator("__"),
        );

        let mut config: ServiceConfig = builder.build()?.try_deserialize()?;
        config.apply_port_env(std::env::var("PORT").ok().as_deref())?;
        Ok(config)
    }

    /// Parse configuration from TOML text (no environment layering)
    pub fn from_toml_str(raw: &str) -> Result<Self, ServiceError> {
        let config = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Honor the conventional `PORT` variable set by hosting platforms
    pub fn apply_port_env(&mut self, port: Option<&str>) -> Result<(), ServiceError> {
        if let Some(raw) = port.map(str::trim).filter(|raw| !raw.is_empty()) {
            self.port = raw
                .parse()
                .map_err(|_| ServiceError::Config(format!("PORT is not a valid port: '{raw}'")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.host.trim().is_empty() {
            return Err(ServiceError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ServiceError::Config(
                "port must be greater than zero".to_string(),
            ));
        }
        if self.schema_path.as_os_str().is_empty() {
            return Err(ServiceError::Config(
                "schema_path must not be empty".to_string(),
            ));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(ServiceError::Config(
                "model_path must not be empty".to_string(),
            ));
        }

        let keys = &self.features;
        for (name, value) in [
            ("features.month_key", &keys.month_key),
            ("features.day_key", &keys.day_key),
            ("features.year_key", &keys.year_key),
            ("features.city_prefix", &keys.city_prefix),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::Config(format!("{name} must not be empty")));
            }
        }

        self.palette
            .validate()
            .map_err(|e| ServiceError::Config(format!("palette: {e}")))?;

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
