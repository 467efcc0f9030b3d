//! Table configuration models.

use serde::{Deserialize, Serialize};

use crate::game::GameSettings;

/// Table configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableConfig {
    /// Display name for logs.
    pub name: String,

    /// Game settings handed to the engine.
    pub settings: GameSettings,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Main Table".to_string(),
            settings: GameSettings::default(),
        }
    }
}

impl TableConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.settings.max_seats == 0 {
            return Err("Table must have at least one seat".to_string());
        }
        // A single 52-card shoe has to cover every seat, the dealer, and
        // at least one full war level.
        if self.settings.max_seats > 20 {
            return Err("Max seats must be at most 20 (single 52-card shoe)".to_string());
        }
        if self.settings.min_bet == 0 {
            return Err("Minimum bet must be greater than 0".to_string());
        }
        if self.settings.max_bet < self.settings.min_bet {
            return Err("Maximum bet must be at least the minimum bet".to_string());
        }
        Ok(())
    }
}
