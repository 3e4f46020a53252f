//! Error types for the extraction crate.
//!
//! Two tiers: [`PlanError`] stops a run before any job starts, while
//! [`JobFailure`] and [`VariableFailure`] are recorded as outcomes and never
//! escape the orchestrator.

use serde::Serialize;
use thiserror::Error;
use vx_common::{GridShape, TimeCoords, TimeParseError};

/// Errors in the configuration document or its schedule bounds.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid time literal: {0}")]
    Time(#[from] TimeParseError),

    #[error("Invalid {section} range: {reason}")]
    InvalidRange {
        section: &'static str,
        reason: String,
    },

    #[error("Invalid variable '{name}': {reason}")]
    InvalidVariable { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors in a locator template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unsupported placeholder '{{{placeholder}}}' in template '{template}'")]
    UnsupportedPlaceholder { template: String, placeholder: String },

    #[error("Unterminated placeholder at byte {position} in template '{template}'")]
    Unterminated { template: String, position: usize },

    #[error("Empty placeholder in template '{template}'")]
    EmptyPlaceholder { template: String },

    #[error("Invalid width for placeholder '{{{placeholder}}}' in template '{template}'")]
    InvalidWidth { template: String, placeholder: String },
}

/// Hard stops: the run aborts before any job is started.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Why a single extraction job produced no field.
///
/// Every variant is recoverable: the job is skipped and its slot stays empty.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum JobFailure {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("no field matching {0}")]
    NotFound(String),

    #[error("{selector} not present at the requested level (available: {available})")]
    LevelMismatch { selector: String, available: String },

    #[error("malformed source: {0}")]
    MalformedSource(String),

    #[error("no units known for standard name '{0}'")]
    UnknownUnits(String),
}

impl JobFailure {
    /// Stable short name for logs and manifests.
    pub fn kind(&self) -> &'static str {
        match self {
            JobFailure::SourceUnavailable(_) => "SourceUnavailable",
            JobFailure::NotFound(_) => "NotFound",
            JobFailure::LevelMismatch { .. } => "LevelMismatch",
            JobFailure::MalformedSource(_) => "MalformedSource",
            JobFailure::UnknownUnits(_) => "UnknownUnits",
        }
    }
}

/// Why a variable's dataset could not be assembled.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum VariableFailure {
    #[error("grid shape {found:?} at {at} differs from accepted shape {expected:?}")]
    ShapeMismatch {
        expected: GridShape,
        found: GridShape,
        at: TimeCoords,
    },
}

/// Result type for plan construction.
pub type Result<T> = std::result::Result<T, PlanError>;
