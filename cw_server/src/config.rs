//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use casino_war::{GameSettings, TableConfig};
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Table configuration handed to the actor
    pub table: TableConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable fails validation.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:6789"
                    .parse()
                    .expect("Default bind address is valid")
            });

        let table = TableConfig {
            name: std::env::var("TABLE_NAME").unwrap_or_else(|_| "Main Table".to_string()),
            settings: GameSettings {
                max_seats: parse_env_or("TABLE_MAX_SEATS", 6),
                table_number: parse_env_or("TABLE_NUMBER", 1),
                min_bet: parse_env_or("TABLE_MIN_BET", 10),
                max_bet: parse_env_or("TABLE_MAX_BET", 1000),
            },
        };

        Ok(ServerConfig { bind, table })
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table.settings.max_seats == 0 {
            return Err(ConfigError::Invalid {
                var: "TABLE_MAX_SEATS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.table.settings.max_seats > 20 {
            return Err(ConfigError::Invalid {
                var: "TABLE_MAX_SEATS".to_string(),
                reason: "Must be at most 20 (single 52-card shoe)".to_string(),
            });
        }

        if self.table.settings.min_bet == 0 {
            return Err(ConfigError::Invalid {
                var: "TABLE_MIN_BET".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.table.settings.max_bet < self.table.settings.min_bet {
            return Err(ConfigError::Invalid {
                var: "TABLE_MAX_BET".to_string(),
                reason: format!(
                    "Must be at least the minimum bet ({})",
                    self.table.settings.min_bet
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable with a default fallback.
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
