//! Verification run configuration.
//!
//! The document is loaded from YAML. Only the structural checks needed to
//! expand the schedule are performed here; time literals are interpreted by
//! the schedule expander.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use vx_common::{Level, LevelType};

use crate::error::ConfigError;

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VxConfig {
    pub baseline: BaselineConfig,
    pub forecast: ForecastConfig,
    pub cycles: TimeSpec,
    pub leadtimes: TimeSpec,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default = "default_threads")]
    pub threads: usize,
    pub variables: BTreeMap<String, VariableConfig>,
    pub workdir: PathBuf,
}

fn default_threads() -> usize {
    1
}

/// Reference dataset, addressed by URL or path template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    pub name: String,
    pub template: String,
}

/// Forecast archive, addressed by path template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub name: String,
    pub path: String,
}

/// Plotting options passed through to the plotting collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default)]
    pub baseline: bool,
}

/// One entry of the `variables` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableConfig {
    pub level_type: LevelType,
    #[serde(default)]
    pub levels: Vec<Level>,
    pub standard_name: String,
}

/// A cycle or lead-time specification: an inclusive range or an explicit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    Range {
        start: Literal,
        step: Literal,
        stop: Literal,
    },
    List(Vec<Literal>),
}

/// A time literal as written in YAML: usually a string, occasionally a bare
/// number of hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Text(String),
    Number(u64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => f.write_str(s),
            Literal::Number(n) => write!(f, "{}", n),
        }
    }
}

impl VxConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), variables = config.variables.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Check the structure the schedule expander relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid(
                "threads must be a positive integer".to_string(),
            ));
        }

        if self.variables.is_empty() {
            return Err(ConfigError::Invalid("no variables configured".to_string()));
        }

        for (name, var) in &self.variables {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("empty variable name".to_string()));
            }

            let invalid = |reason: &str| ConfigError::InvalidVariable {
                name: name.clone(),
                reason: reason.to_string(),
            };

            if var.standard_name.trim().is_empty() {
                return Err(invalid("standard_name must not be empty"));
            }

            if var.level_type.is_single_level() && !var.levels.is_empty() {
                return Err(invalid(&format!(
                    "level type '{}' is single-level and takes no levels",
                    var.level_type
                )));
            }

            if !var.level_type.is_single_level() && var.levels.is_empty() {
                return Err(invalid(&format!(
                    "level type '{}' requires at least one level",
                    var.level_type
                )));
            }

            if var.levels.iter().any(|l| !l.value().is_finite()) {
                return Err(invalid("levels must be finite numbers"));
            }
        }

        Ok(())
    }
}
