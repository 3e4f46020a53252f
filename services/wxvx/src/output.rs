//! Artifact writer: datasets and the run manifest under the work directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use extraction::{Dataset, RunOutcome, RunSummary};
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

/// Manifest handed to the statistics and plotting collaborators.
#[derive(Debug, Serialize)]
struct RunManifest<'a> {
    plot_baseline: bool,
    datasets: Vec<String>,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Where a dataset is written, relative to `workdir`.
pub fn dataset_path(workdir: &Path, dataset: &Dataset) -> PathBuf {
    workdir
        .join("grids")
        .join(dataset.role.as_str())
        .join(format!("{}.json", dataset.name))
}

/// Write every dataset and `run-summary.json`. Returns the manifest path.
pub async fn write_artifacts(
    workdir: &Path,
    outcome: &RunOutcome,
    plot_baseline: bool,
) -> Result<PathBuf> {
    let mut written = Vec::with_capacity(outcome.datasets.len());

    for dataset in &outcome.datasets {
        let path = dataset_path(workdir, dataset);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let bytes = dataset
            .to_json_bytes()
            .with_context(|| format!("Failed to serialize dataset {}", dataset.name))?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(path = %path.display(), "Wrote dataset");
        written.push(path.display().to_string());
    }

    let manifest = RunManifest {
        plot_baseline,
        datasets: written,
        summary: &outcome.summary,
    };
    let manifest_path = workdir.join("run-summary.json");
    let bytes = serde_json::to_vec_pretty(&manifest).context("Failed to serialize run summary")?;
    fs::create_dir_all(workdir)
        .await
        .with_context(|| format!("Failed to create {}", workdir.display()))?;
    fs::write(&manifest_path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    info!(
        path = %manifest_path.display(),
        datasets = outcome.datasets.len(),
        "Wrote run artifacts"
    );

    Ok(manifest_path)
}
