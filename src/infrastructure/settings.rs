// Infrastructure: adapter settings
// Loaded from TOML; every field has a default so partial files are accepted

use super::logging::LoggingConfig;
use crate::domain::{
    models::SolverConfig,
    solver_service::{Result, SolverError},
    value_objects::FileFormat,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MilpSolverSettings {
    /// Start every adapter with an empty native model
    pub recreate_model_at_start: bool,
    /// Use plain integer/real native types plus explicit bound constraints
    pub fix_broken_ranges: bool,
    /// Format written by `save_model_to_file`
    pub model_format: FileFormat,
    pub solver: SolverConfig,
    pub logging: LoggingConfig,
}

impl Default for MilpSolverSettings {
    fn default() -> Self {
        Self {
            recreate_model_at_start: true,
            fix_broken_ranges: false,
            model_format: FileFormat::FreeMps,
            solver: SolverConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MilpSolverSettings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn with_fix_broken_ranges(mut self, enabled: bool) -> Self {
        self.fix_broken_ranges = enabled;
        self
    }

    pub fn with_recreate_model_at_start(mut self, enabled: bool) -> Self {
        self.recreate_model_at_start = enabled;
        self
    }

    pub fn with_model_format(mut self, format: FileFormat) -> Self {
        self.model_format = format;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.solver.time_limit {
            if limit.is_nan() || limit <= 0.0 {
                return Err(SolverError::InvalidSettings(format!(
                    "time_limit must be positive, got {}",
                    limit
                )));
            }
        }
        if let Some(gap) = self.solver.gap_tolerance {
            if !(0.0..=1.0).contains(&gap) {
                return Err(SolverError::InvalidSettings(format!(
                    "gap_tolerance must be within [0, 1], got {}",
                    gap
                )));
            }
        }
        Ok(())
    }
}
