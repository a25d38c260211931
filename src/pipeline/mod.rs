//! Load → clean → explore → chart → report.
//!
//! The loader and cleaner form the core; the remaining stages only read the
//! cleaned table and can be switched off independently.

pub mod ingestion;
pub mod processing;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, info_span, instrument, warn};

use crate::analysis::{explore, EdaSummary};
use crate::config::Config;
use crate::constants::{
    COL_GENRE_CLEAN, COL_IMDB_RATING_CLEAN, COL_IMDB_VOTES_CLEAN, COL_RATING_CLEAN,
    COL_RUNTIME_CLEAN, COL_YEAR_CLEAN, REQUIRED_COLUMNS,
};
use crate::error::{DataUnavailable, Result};
use crate::observability::metrics;
use crate::report::AnalysisReport;
use crate::types::CleanedTable;
use crate::visualization::ChartRenderer;

use ingestion::{LoadSummary, Loader};
use processing::{Cleaner, MovieCleaner};

/// Which downstream stages to run after cleaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stages {
    pub eda: bool,
    pub charts: bool,
    pub report: bool,
}

impl Stages {
    pub fn all() -> Self {
        Self {
            eda: true,
            charts: true,
            report: true,
        }
    }

    pub fn eda_only() -> Self {
        Self {
            eda: true,
            charts: false,
            report: false,
        }
    }

    pub fn report_only() -> Self {
        Self {
            eda: false,
            charts: false,
            report: true,
        }
    }
}

/// Everything a run produced
#[derive(Debug)]
pub struct PipelineResult {
    pub load_summary: LoadSummary,
    pub cleaned: CleanedTable,
    pub eda: Option<EdaSummary>,
    pub charts: Vec<PathBuf>,
    pub report: Option<AnalysisReport>,
}

pub struct Pipeline {
    config: Config,
    cleaner: Box<dyn Cleaner>,
    /// Echo section output to stdout
    print: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cleaner: Box::new(MovieCleaner::new()),
            print: true,
        }
    }

    pub fn with_cleaner(mut self, cleaner: Box<dyn Cleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.print = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn section(&self, title: &str) {
        if self.print {
            println!("\n{}", "=".repeat(50));
            println!("{}", title);
            println!("{}", "=".repeat(50));
        }
    }

    /// Load the configured file and derive the cleaned table.
    ///
    /// A load failure is returned as-is so the caller can stop the run.
    #[instrument(skip(self), fields(path = %self.config.data.path.display()))]
    pub fn load_and_clean(&self) -> std::result::Result<(LoadSummary, CleanedTable), DataUnavailable> {
        let loader = Loader::new().with_head_rows(self.config.analysis.head_rows);
        let outcome = loader.load(&self.config.data.path)?;
        if self.print {
            println!("✅ Dataset loaded from {}", self.config.data.path.display());
            println!("{}", outcome.summary);
        }

        let cleaned = self.cleaner.clean(&outcome.table);
        Ok((outcome.summary, cleaned))
    }

    /// Run the pipeline. Nothing after the loader executes when the data
    /// file is unavailable.
    pub fn run(&self, stages: Stages) -> Result<PipelineResult> {
        let t_pipeline = Instant::now();
        let (load_summary, cleaned) = self.load_and_clean()?;

        let eda = if stages.eda || stages.charts {
            let _span = info_span!("eda").entered();
            let started = Instant::now();
            let summary = explore(&cleaned, &self.config.analysis);
            metrics::stages::duration("eda", started.elapsed().as_secs_f64());
            if stages.eda {
                self.section("EXPLORATORY DATA ANALYSIS");
                if self.print {
                    print!("{}", summary);
                }
            }
            Some(summary)
        } else {
            None
        };

        let mut charts = Vec::new();
        if stages.charts && self.config.charts.enabled {
            let _span = info_span!("charts").entered();
            self.section("VISUALIZATION");
            let started = Instant::now();
            if let Some(summary) = &eda {
                let renderer = ChartRenderer::new(&self.config.charts, &self.config.analysis);
                charts = renderer.render_all(&cleaned, &summary.correlation)?;
            }
            metrics::stages::duration("charts", started.elapsed().as_secs_f64());
            if self.print {
                for path in &charts {
                    println!("📈 {}", path.display());
                }
            }
        } else if stages.charts {
            warn!("Chart rendering disabled in configuration");
        }

        let report = if stages.report {
            let _span = info_span!("report").entered();
            let started = Instant::now();
            let report = AnalysisReport::build(&cleaned);
            metrics::stages::duration("report", started.elapsed().as_secs_f64());
            self.section("ANALYSIS REPORT");
            if self.print {
                print!("{}", report);
            }
            if let Some(path) = &self.config.report.json_path {
                report.write_json(path)?;
            }
            Some(report)
        } else {
            None
        };

        metrics::stages::duration("pipeline", t_pipeline.elapsed().as_secs_f64());
        info!(
            rows = cleaned.len(),
            charts = charts.len(),
            "Pipeline finished in {:.2}s",
            t_pipeline.elapsed().as_secs_f64()
        );

        Ok(PipelineResult {
            load_summary,
            cleaned,
            eda,
            charts,
            report,
        })
    }

    /// Write the cleaned table as CSV: raw fields followed by derived ones
    pub fn persist_cleaned(table: &CleanedTable, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;

        let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        header.extend([
            COL_YEAR_CLEAN,
            COL_RUNTIME_CLEAN,
            COL_RATING_CLEAN,
            COL_IMDB_RATING_CLEAN,
            COL_IMDB_VOTES_CLEAN,
            COL_GENRE_CLEAN,
        ]);
        writer.write_record(&header)?;

        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let num = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        for row in &table.rows {
            let raw = &row.raw;
            writer.write_record([
                text(&raw.title),
                text(&raw.year),
                text(&raw.runtime),
                text(&raw.rating),
                text(&raw.imdb_rating),
                text(&raw.imdb_votes),
                text(&raw.genre),
                text(&raw.director),
                text(&raw.metacritic),
                row.year_clean.map(|y| y.to_string()).unwrap_or_default(),
                row.runtime_clean.map(|r| r.to_string()).unwrap_or_default(),
                text(&row.rating_clean),
                num(row.imdb_rating_clean),
                num(row.imdb_votes_clean),
                text(&row.genre_clean),
            ])?;
        }
        writer.flush()?;
        info!("Wrote {} cleaned rows to {}", table.len(), path.display());
        Ok(())
    }
}
