// Build configuration
// One JSON file per build; every field has a default, so a file only lists what it changes

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::corruption::SeverityConfig;
use crate::evaluation::EvaluationConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for one corpus build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding `<split>_metadata.csv`
    pub metadata_dir: PathBuf,

    /// Root that metadata `folder` columns are relative to
    pub annotation_root: PathBuf,

    /// Predictions are written to `<output_dir>/<split>/<performance_id>.txt`
    pub output_dir: PathBuf,

    /// SQLite catalog path (default: `<output_dir>/catalog.db`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// JSONL progress trace; no trace is written when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_path: Option<PathBuf>,

    /// Dataset split name ("train", "valid", "test")
    pub split: String,

    /// Seed that every per-performance generator is derived from
    pub base_seed: u64,

    pub severity: SeverityConfig,

    pub evaluation: EvaluationConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            metadata_dir: PathBuf::from("data/metadata"),
            annotation_root: PathBuf::from("data/raw/ACPAS-dataset"),
            output_dir: PathBuf::from("experiments/beat_tracking/beats_with_error"),
            catalog_path: None,
            trace_path: None,
            split: "test".to_string(),
            base_seed: 0,
            severity: SeverityConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: BuildConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the metadata table for the configured split
    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_dir
            .join(format!("{}_metadata.csv", self.split))
    }

    /// Catalog location, falling back to `<output_dir>/catalog.db`
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("catalog.db"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let split = self.split.trim();
        if split.is_empty() || split.contains(&['/', '\\'][..]) || split == "." || split == ".." {
            return Err(ConfigError::Invalid(format!(
                "split must be a plain name, got {:?}",
                self.split
            )));
        }

        self.severity
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.evaluation
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }
}
