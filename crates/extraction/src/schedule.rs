//! Schedule expansion: cycles × lead times × variables × levels → jobs.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use vx_common::{parse_duration, parse_timestamp, Level, TimeCoords};

use crate::config::{Literal, TimeSpec, VxConfig};
use crate::error::{ConfigError, Result};
use crate::source::SourceDescriptor;
use crate::variable::VariableSpec;

/// One unit of work: a field to extract from one source.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    /// Position in the canonical (source, cycle, leadtime, variable, level) order
    pub index: usize,
    pub source: Arc<SourceDescriptor>,
    pub time: TimeCoords,
    pub variable: Arc<VariableSpec>,
    pub level: Option<Level>,
}

impl fmt::Display for ExtractionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>5} {:<8} {} {}@{}",
            self.index,
            self.source.role.as_str(),
            self.time,
            self.variable.name,
            self.variable.level_type
        )?;
        if let Some(level) = self.level {
            write!(f, " {}", level)?;
        }
        Ok(())
    }
}

/// The fully expanded work for a run.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    pub sources: Vec<Arc<SourceDescriptor>>,
    pub variables: Vec<Arc<VariableSpec>>,
    /// Distinct cycles, ascending
    pub cycles: Vec<DateTime<Utc>>,
    /// Distinct lead times, ascending
    pub leadtimes: Vec<Duration>,
    /// All time coordinates, ascending
    pub timecoords: Vec<TimeCoords>,
    /// All jobs in canonical order
    pub jobs: Vec<ExtractionJob>,
}

impl ExtractionPlan {
    /// Expand a configuration. Fails before any job exists on malformed
    /// schedule bounds or templates.
    pub fn from_config(config: &VxConfig) -> Result<Self> {
        config.validate()?;

        let cycles = expand_cycles(&config.cycles)?;
        let leadtimes = expand_leadtimes(&config.leadtimes)?;
        let timecoords = combine(&cycles, &leadtimes);

        let sources = SourceDescriptor::from_config(config)?;
        let variables = config
            .variables
            .iter()
            .map(|(name, var)| VariableSpec::from_config(name, var))
            .collect();

        let plan = Self::new(sources, timecoords, variables);

        info!(
            cycles = plan.cycles.len(),
            leadtimes = plan.leadtimes.len(),
            variables = plan.variables.len(),
            jobs = plan.jobs.len(),
            "Expanded verification schedule"
        );

        Ok(plan)
    }

    /// Build a plan from already-expanded parts.
    pub fn new(
        sources: Vec<SourceDescriptor>,
        timecoords: Vec<TimeCoords>,
        variables: Vec<VariableSpec>,
    ) -> Self {
        let mut sources: Vec<Arc<SourceDescriptor>> = sources.into_iter().map(Arc::new).collect();
        sources.sort_by_key(|s| s.role);

        let timecoords: Vec<TimeCoords> = timecoords
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let cycles: Vec<DateTime<Utc>> = timecoords
            .iter()
            .map(|tc| tc.cycle)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let leadtimes: Vec<Duration> = timecoords
            .iter()
            .map(|tc| tc.leadtime)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let variables: Vec<Arc<VariableSpec>> = variables.into_iter().map(Arc::new).collect();
        let jobs = expand_jobs(&sources, &timecoords, &variables);

        Self {
            sources,
            variables,
            cycles,
            leadtimes,
            timecoords,
            jobs,
        }
    }

    /// Jobs for one source and variable, in canonical order.
    pub fn jobs_for<'a>(
        &'a self,
        source: &'a SourceDescriptor,
        variable: &'a VariableSpec,
    ) -> impl Iterator<Item = &'a ExtractionJob> + 'a {
        self.jobs
            .iter()
            .filter(move |j| j.source.role == source.role && j.variable.name == variable.name)
    }
}

/// Cross product in canonical order: source, cycle, leadtime, variable, level.
pub fn expand_jobs(
    sources: &[Arc<SourceDescriptor>],
    timecoords: &[TimeCoords],
    variables: &[Arc<VariableSpec>],
) -> Vec<ExtractionJob> {
    let mut jobs = Vec::new();

    for source in sources {
        for time in timecoords {
            for variable in variables {
                for level in variable.level_slots() {
                    jobs.push(ExtractionJob {
                        index: jobs.len(),
                        source: Arc::clone(source),
                        time: *time,
                        variable: Arc::clone(variable),
                        level,
                    });
                }
            }
        }
    }

    jobs
}

/// Every (cycle, leadtime) pair, ordered by cycle then lead time.
pub fn combine(cycles: &[DateTime<Utc>], leadtimes: &[Duration]) -> Vec<TimeCoords> {
    cycles
        .iter()
        .flat_map(|cycle| {
            leadtimes.iter().map(move |leadtime| TimeCoords {
                cycle: *cycle,
                leadtime: *leadtime,
            })
        })
        .collect()
}

/// Expand cycles and lead times into the ordered set of time coordinates.
pub fn expand_timecoords(
    cycles: &TimeSpec,
    leadtimes: &TimeSpec,
) -> std::result::Result<Vec<TimeCoords>, ConfigError> {
    Ok(combine(
        &expand_cycles(cycles)?,
        &expand_leadtimes(leadtimes)?,
    ))
}

/// Ascending, deduplicated cycles.
pub fn expand_cycles(spec: &TimeSpec) -> std::result::Result<Vec<DateTime<Utc>>, ConfigError> {
    match spec {
        TimeSpec::Range { start, step, stop } => {
            let start = parse_timestamp(&start.to_string())?;
            let stop = parse_timestamp(&stop.to_string())?;
            let step = parse_step(step)?;
            step_range("cycles", start, stop, step)
        }
        TimeSpec::List(items) => {
            let set = items
                .iter()
                .map(|l| parse_timestamp(&l.to_string()))
                .collect::<std::result::Result<BTreeSet<_>, _>>()?;
            non_empty_list("cycles", set)
        }
    }
}

/// Ascending, deduplicated lead times.
pub fn expand_leadtimes(spec: &TimeSpec) -> std::result::Result<Vec<Duration>, ConfigError> {
    match spec {
        TimeSpec::Range { start, step, stop } => {
            let start = parse_duration(&start.to_string())?;
            let stop = parse_duration(&stop.to_string())?;
            let step = parse_step(step)?;
            step_range("leadtimes", start, stop, step)
        }
        TimeSpec::List(items) => {
            let set = items
                .iter()
                .map(|l| parse_duration(&l.to_string()))
                .collect::<std::result::Result<BTreeSet<_>, _>>()?;
            non_empty_list("leadtimes", set)
        }
    }
}

fn parse_step(step: &Literal) -> std::result::Result<Duration, ConfigError> {
    Ok(parse_duration(&step.to_string())?)
}

/// Inclusive stepping from `start` to `stop`.
fn step_range<T>(
    section: &'static str,
    start: T,
    stop: T,
    step: Duration,
) -> std::result::Result<Vec<T>, ConfigError>
where
    T: Copy + PartialOrd + std::ops::Add<Duration, Output = T> + std::fmt::Debug,
{
    if step <= Duration::zero() {
        return Err(ConfigError::InvalidRange {
            section,
            reason: "step must be positive".to_string(),
        });
    }

    if stop < start {
        return Err(ConfigError::InvalidRange {
            section,
            reason: format!("stop {:?} precedes start {:?}", stop, start),
        });
    }

    let mut values = Vec::new();
    let mut current = start;
    while current <= stop {
        values.push(current);
        current = current + step;
    }
    Ok(values)
}

fn non_empty_list<T>(
    section: &'static str,
    set: BTreeSet<T>,
) -> std::result::Result<Vec<T>, ConfigError> {
    if set.is_empty() {
        return Err(ConfigError::InvalidRange {
            section,
            reason: "list must not be empty".to_string(),
        });
    }
    Ok(set.into_iter().collect())
}
