//! Metrics for the analysis pipeline.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init`].

use std::fmt;
use std::fs;
use std::path::Path;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

use crate::error::{EdaError, Result};

/// All metric names used in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Loader
    LoaderRowsLoaded,
    LoaderColumns,
    LoaderFailures,
    LoaderDuration,

    // Cleaner
    CleanerRowsCleaned,
    CleanerAbsentValues,
    CleanerDuration,

    // Downstream stages
    StageDuration,
    ChartsWritten,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::LoaderRowsLoaded => "movie_eda_loader_rows_loaded_total",
            MetricName::LoaderColumns => "movie_eda_loader_columns",
            MetricName::LoaderFailures => "movie_eda_loader_failures_total",
            MetricName::LoaderDuration => "movie_eda_loader_duration_seconds",
            MetricName::CleanerRowsCleaned => "movie_eda_cleaner_rows_cleaned_total",
            MetricName::CleanerAbsentValues => "movie_eda_cleaner_absent_values_total",
            MetricName::CleanerDuration => "movie_eda_cleaner_duration_seconds",
            MetricName::StageDuration => "movie_eda_stage_duration_seconds",
            MetricName::ChartsWritten => "movie_eda_charts_written_total",
        }
    }
}

/// Install the Prometheus recorder. Call at most once per process.
pub fn init() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EdaError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;
    info!("Metrics system initialized");
    Ok(handle)
}

/// Write the current metric values in Prometheus text format
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, handle.render())?;
    info!("Wrote metrics snapshot to {}", path.display());
    Ok(())
}

/// End-of-run snapshot. Failures are logged and reported as `false`.
pub fn flush_snapshot(handle: &PrometheusHandle, path: &Path) -> bool {
    match write_snapshot(handle, path) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to write metrics snapshot to {}: {}", path.display(), e);
            false
        }
    }
}

pub mod loader {
    use super::MetricName;

    pub fn rows_loaded(rows: usize, columns: usize) {
        ::metrics::counter!(MetricName::LoaderRowsLoaded.as_str()).increment(rows as u64);
        ::metrics::gauge!(MetricName::LoaderColumns.as_str()).set(columns as f64);
    }

    pub fn failed(kind: &'static str) {
        ::metrics::counter!(MetricName::LoaderFailures.as_str(), "kind" => kind).increment(1);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::LoaderDuration.as_str()).record(secs);
    }
}

pub mod cleaner {
    use super::MetricName;

    pub fn rows_cleaned(rows: usize) {
        ::metrics::counter!(MetricName::CleanerRowsCleaned.as_str()).increment(rows as u64);
    }

    pub fn absent_values(field: &'static str, count: usize) {
        ::metrics::counter!(MetricName::CleanerAbsentValues.as_str(), "field" => field)
            .increment(count as u64);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::CleanerDuration.as_str()).record(secs);
    }
}

pub mod stages {
    use super::MetricName;

    pub fn duration(stage: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::StageDuration.as_str(), "stage" => stage).record(secs);
    }

    pub fn chart_written(chart: &'static str) {
        ::metrics::counter!(MetricName::ChartsWritten.as_str(), "chart" => chart).increment(1);
    }
}
