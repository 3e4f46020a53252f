//! Forecast verification core.
//!
//! Expands a verification schedule into extraction jobs, resolves each job
//! to a source location, extracts and CF-annotates the matching field, and
//! merges the results into per-variable datasets.
//!
//! # Architecture
//!
//! - [`schedule`]: cycles × lead times × variables × levels → ordered jobs
//! - [`locator`]: typed locator templates, rendered per job
//! - [`extract`]: opens sources through the reader and fetch collaborators
//! - [`normalize`]: attaches CF-1.8 metadata from an injected [`UnitsTable`]
//! - [`orchestrator`]: bounded concurrent execution and deterministic merge
//!
//! Configuration and template errors stop a run before any job starts. Job
//! failures are recorded in the [`RunSummary`] and leave their slot empty.

pub mod cf;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod locator;
pub mod normalize;
pub mod orchestrator;
pub mod schedule;
pub mod source;
pub mod units;
pub mod variable;

// Re-exports
pub use cf::{check_attributes, check_dataset, check_field, CfAttributes, CfViolation, ComplianceReport};
pub use config::{Literal, TimeSpec, VariableConfig, VxConfig};
pub use dataset::Dataset;
pub use error::{ConfigError, JobFailure, PlanError, Result, TemplateError, VariableFailure};
pub use extract::FieldExtractor;
pub use locator::{resolve_locator, Locator, LocatorTemplate, Placeholder};
pub use normalize::{Grid, GriddedField, Normalizer};
pub use orchestrator::{AssemblyStatus, Orchestrator, RunOutcome, RunSummary, SkippedJob, VariableReport};
pub use schedule::{expand_timecoords, ExtractionJob, ExtractionPlan};
pub use source::{SourceDescriptor, SourceKind, SourceRole};
pub use units::{UnitsEntry, UnitsTable};
pub use variable::VariableSpec;
