//! Configuration management for the parity-dice ledger

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::Level;
use crate::error::{CasinoError, CasinoResult};
use crate::error::logging::{LogFormat, LogOutput, LoggingConfig};

/// Base units in one whole unit of native currency
pub const ONE_UNIT: u64 = 1_000_000_000_000_000_000;

/// Token units issued per whole unit of native currency
pub const DEFAULT_RATE: u64 = 1000;

/// Main configuration for the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CasinoConfig {
    /// Token economics
    pub token: TokenConfig,
    /// Logging configuration
    pub logging: LoggingSection,
}

/// Exchange rate and mint cap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token units per whole native unit
    pub rate: u64,
    /// Base units per whole native unit
    pub one_unit: u64,
    /// Mint cap, expressed in native base units.
    ///
    /// Compared directly against token amounts, so at the default the cap
    /// can never be reached.
    pub max_mint: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            one_unit: ONE_UNIT,
            max_mint: 5 * ONE_UNIT,
        }
    }
}

/// Serializable logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// human or json
    pub format: String,
    /// stdout or stderr
    pub output: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "human".to_string(),
            output: "stdout".to_string(),
        }
    }
}

impl LoggingSection {
    /// Convert into the runtime logging configuration
    pub fn to_logging_config(&self) -> CasinoResult<LoggingConfig> {
        let level = self.level.parse::<Level>().map_err(|_| CasinoError::Configuration {
            message: format!("Unknown log level '{}'", self.level),
            field: "logging.level".to_string(),
        })?;

        let format = match self.format.as_str() {
            "human" => LogFormat::Human,
            "json" => LogFormat::Json,
            other => {
                return Err(CasinoError::Configuration {
                    message: format!("Unknown log format '{}'", other),
                    field: "logging.format".to_string(),
                })
            }
        };

        let output = match self.output.as_str() {
            "stdout" => LogOutput::Stdout,
            "stderr" => LogOutput::Stderr,
            other => {
                return Err(CasinoError::Configuration {
                    message: format!("Unknown log output '{}'", other),
                    field: "logging.output".to_string(),
                })
            }
        };

        Ok(LoggingConfig { level, format, output })
    }
}

impl CasinoConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CasinoResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| CasinoError::Configuration {
            message: format!("Failed to read config file: {}", e),
            field: "config_file".to_string(),
        })?;

        let config: CasinoConfig = toml::from_str(&content).map_err(|e| CasinoError::Configuration {
            message: format!("Failed to parse config file: {}", e),
            field: "config_format".to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> CasinoResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CasinoError::Configuration {
            message: format!("Failed to serialize config: {}", e),
            field: "config_serialization".to_string(),
        })?;

        fs::write(path, content).map_err(|e| CasinoError::Configuration {
            message: format!("Failed to write config file: {}", e),
            field: "config_write".to_string(),
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> CasinoResult<()> {
        if self.token.rate == 0 {
            return Err(CasinoError::Configuration {
                message: "Exchange rate must be greater than 0".to_string(),
                field: "token.rate".to_string(),
            });
        }

        if self.token.one_unit == 0 {
            return Err(CasinoError::Configuration {
                message: "Native unit size must be greater than 0".to_string(),
                field: "token.one_unit".to_string(),
            });
        }

        if self.token.max_mint == 0 {
            return Err(CasinoError::Configuration {
                message: "Mint cap must be greater than 0".to_string(),
                field: "token.max_mint".to_string(),
            });
        }

        self.logging.to_logging_config()?;

        Ok(())
    }

    /// Production configuration: reference economics, JSON logs on stderr
    pub fn production() -> Self {
        Self {
            token: TokenConfig::default(),
            logging: LoggingSection {
                level: "info".to_string(),
                format: "json".to_string(),
                output: "stderr".to_string(),
            },
        }
    }

    /// Development configuration with a reachable mint cap
    pub fn development() -> Self {
        Self {
            token: TokenConfig {
                max_mint: 1_000_000,
                ..TokenConfig::default()
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                ..LoggingSection::default()
            },
        }
    }
}
