//! Extraction orchestrator: runs every job of a plan on a bounded worker
//! pool and merges the results into per-variable datasets.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use vx_common::{Level, TimeCoords};

use crate::dataset::Dataset;
use crate::error::{JobFailure, VariableFailure};
use crate::extract::FieldExtractor;
use crate::normalize::{GriddedField, Normalizer};
use crate::schedule::{ExtractionJob, ExtractionPlan};
use crate::source::SourceRole;

/// Outcome of one job.
#[derive(Debug)]
enum JobOutcome {
    Extracted(GriddedField),
    Failed {
        locator: String,
        failure: JobFailure,
    },
    Cancelled,
}

/// A job that produced no field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedJob {
    pub source: SourceRole,
    pub variable: String,
    pub time: TimeCoords,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    pub locator: String,
    pub reason: JobFailure,
}

/// How a variable's dataset assembly ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "failure", rename_all = "lowercase")]
pub enum AssemblyStatus {
    Assembled,
    /// No job succeeded; no dataset was produced
    Empty,
    Failed(VariableFailure),
}

/// Per-(source, variable) accounting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableReport {
    pub source: SourceRole,
    pub variable: String,
    pub expected: usize,
    pub successes: usize,
    pub missing: usize,
    pub status: AssemblyStatus,
}

/// What happened during a run, for the logging and plotting collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_jobs: usize,
    pub succeeded: usize,
    /// Jobs never started because the run was cancelled
    pub cancelled: usize,
    /// In canonical job order
    pub skipped: Vec<SkippedJob>,
    pub variables: Vec<VariableReport>,
}

impl RunSummary {
    /// Number of jobs that did not produce a field.
    pub fn missing(&self) -> usize {
        self.total_jobs - self.succeeded
    }

    /// Skipped jobs for one variable, across sources.
    pub fn skipped_for<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a SkippedJob> + 'a {
        self.skipped.iter().filter(move |s| s.variable == variable)
    }

    pub fn report(&self, source: SourceRole, variable: &str) -> Option<&VariableReport> {
        self.variables
            .iter()
            .find(|r| r.source == source && r.variable == variable)
    }
}

/// Datasets plus the summary of how they were produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Ordered by (source, variable)
    pub datasets: Vec<Dataset>,
    pub summary: RunSummary,
}

impl RunOutcome {
    pub fn dataset(&self, source: SourceRole, variable: &str) -> Option<&Dataset> {
        self.datasets
            .iter()
            .find(|d| d.role == source && d.name == variable)
    }
}

/// Runs extraction jobs concurrently.
pub struct Orchestrator {
    extractor: FieldExtractor,
    normalizer: Normalizer,
    workers: usize,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// `workers` is clamped to at least one.
    pub fn new(extractor: FieldExtractor, normalizer: Normalizer, workers: usize) -> Self {
        Self {
            extractor,
            normalizer,
            workers: workers.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job in `plan`. Job failures are recorded, never returned.
    pub async fn run(&self, plan: &ExtractionPlan) -> RunOutcome {
        info!(
            jobs = plan.jobs.len(),
            workers = self.workers,
            "Starting extraction run"
        );

        let mut results: Vec<(usize, JobOutcome)> = stream::iter(plan.jobs.iter())
            .map(|job| async move {
                if self.cancel.is_cancelled() {
                    return (job.index, JobOutcome::Cancelled);
                }
                (job.index, self.run_job(job).await)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        // Completion order is arbitrary; merge in canonical order.
        results.sort_by_key(|(index, _)| *index);

        let outcome = Self::merge(plan, results);

        info!(
            total = outcome.summary.total_jobs,
            succeeded = outcome.summary.succeeded,
            skipped = outcome.summary.skipped.len(),
            cancelled = outcome.summary.cancelled,
            datasets = outcome.datasets.len(),
            "Extraction run complete"
        );

        outcome
    }

    #[instrument(
        skip(self, job),
        fields(
            source = %job.source.role,
            variable = %job.variable.name,
            time = %job.time,
            level = ?job.level.map(|l| l.value()),
        )
    )]
    async fn run_job(&self, job: &ExtractionJob) -> JobOutcome {
        let locator = job.source.locate(&job.time, &job.variable.name);
        let selector = job.variable.selector(job.level);

        let result = match self.extractor.extract(&locator, &selector).await {
            Ok(raw) => self
                .normalizer
                .normalize(raw, &job.variable, job.time, job.level),
            Err(failure) => Err(failure),
        };

        match result {
            Ok(field) => {
                debug!(locator = %locator, "Field extracted");
                JobOutcome::Extracted(field)
            }
            Err(failure) => {
                if let JobFailure::UnknownUnits(name) = &failure {
                    error!(
                        standard_name = %name,
                        locator = %locator,
                        "No units entry for standard name, skipping job"
                    );
                } else {
                    warn!(
                        locator = %locator,
                        kind = failure.kind(),
                        error = %failure,
                        "Skipping job"
                    );
                }
                JobOutcome::Failed {
                    locator: locator.to_string(),
                    failure,
                }
            }
        }
    }

    /// Single-writer merge of sorted outcomes.
    fn merge(plan: &ExtractionPlan, results: Vec<(usize, JobOutcome)>) -> RunOutcome {
        let mut summary = RunSummary {
            total_jobs: plan.jobs.len(),
            ..Default::default()
        };

        let n_vars = plan.variables.len();
        let mut buckets: Vec<Vec<GriddedField>> = vec![Vec::new(); plan.sources.len() * n_vars];
        let mut expected = vec![0usize; buckets.len()];

        let bucket_of = |job: &ExtractionJob| -> Option<usize> {
            let s = plan.sources.iter().position(|s| s.role == job.source.role)?;
            let v = plan
                .variables
                .iter()
                .position(|v| v.name == job.variable.name)?;
            Some(s * n_vars + v)
        };

        for (index, outcome) in results {
            let Some(job) = plan.jobs.get(index) else {
                continue;
            };
            let bucket = bucket_of(job);
            if let Some(b) = bucket {
                expected[b] += 1;
            }

            match outcome {
                JobOutcome::Extracted(field) => {
                    summary.succeeded += 1;
                    if let Some(b) = bucket {
                        buckets[b].push(field);
                    }
                }
                JobOutcome::Failed { locator, failure } => summary.skipped.push(SkippedJob {
                    source: job.source.role,
                    variable: job.variable.name.clone(),
                    time: job.time,
                    level: job.level,
                    locator,
                    reason: failure,
                }),
                JobOutcome::Cancelled => summary.cancelled += 1,
            }
        }

        let mut datasets = Vec::new();

        for (s, source) in plan.sources.iter().enumerate() {
            for (v, variable) in plan.variables.iter().enumerate() {
                let b = s * n_vars + v;
                let fields = std::mem::take(&mut buckets[b]);
                let successes = fields.len();

                let status = match Dataset::assemble(
                    source,
                    variable,
                    &plan.cycles,
                    &plan.leadtimes,
                    fields,
                ) {
                    Ok(Some(dataset)) => {
                        info!(
                            source = %source.role,
                            variable = %variable.name,
                            successes,
                            slots = dataset.slot_count(),
                            "Assembled dataset"
                        );
                        datasets.push(dataset);
                        AssemblyStatus::Assembled
                    }
                    Ok(None) => {
                        warn!(
                            source = %source.role,
                            variable = %variable.name,
                            "No fields extracted, dataset absent"
                        );
                        AssemblyStatus::Empty
                    }
                    Err(failure) => {
                        error!(
                            source = %source.role,
                            variable = %variable.name,
                            error = %failure,
                            "Dataset assembly failed"
                        );
                        AssemblyStatus::Failed(failure)
                    }
                };

                summary.variables.push(VariableReport {
                    source: source.role,
                    variable: variable.name.clone(),
                    expected: expected[b],
                    successes,
                    missing: expected[b] - successes,
                    status,
                });
            }
        }

        RunOutcome { datasets, summary }
    }
}
