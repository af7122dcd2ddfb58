//! NFL statistics ingestion and game outcome prediction
//!
//! Pulls nflverse datasets into a local SQLite store, reshapes a handful of
//! tables for modelling, and trains a gradient boosted classifier that
//! predicts home-team wins.

pub mod data;
pub mod features;
pub mod predict;
pub mod training;
pub mod transform;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GridironError {
    #[error("Provider fetch failed for {dataset}: {message}")]
    Provider { dataset: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Destination table name must not be empty")]
    EmptyDestination,

    #[error("Model not trained - run `gridiron train` first")]
    NoModel,

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, GridironError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub training: TrainingConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub first_season: u16,
    pub last_season: u16,
}

impl ProviderConfig {
    pub fn seasons(&self) -> Vec<u16> {
        (self.first_season..=self.last_season).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub iterations: usize,
    pub learning_rate: f64,
    pub max_depth: u32,
    pub early_stopping_rounds: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub model_path: String,
    pub feature_schema_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: ProviderConfig {
                first_season: 2018,
                last_season: 2024,
            },
            training: TrainingConfig {
                iterations: 100,
                learning_rate: 0.1,
                max_depth: 3,
                early_stopping_rounds: 10,
                test_fraction: 0.2,
                seed: 42,
            },
            data: DataConfig {
                database_path: "data/nfl.db".to_string(),
                model_path: "model/gbm_model.json".to_string(),
                feature_schema_path: "model/feature_schema.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridironError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| GridironError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridironError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
