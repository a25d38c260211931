use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{DEFAULT_CONFIG_PATH, DEFAULT_DATA_PATH};
use crate::error::{EdaError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub charts: ChartConfig,
    pub report: ReportConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATA_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of the top-rated / most-voted lists
    pub top_n: usize,
    /// Leading years listed in the films-per-year table
    pub year_rows: usize,
    /// Rated films a director needs before appearing in the director ranking
    pub min_director_movies: usize,
    /// Trailing window of years shown in the per-year charts
    pub recent_years: usize,
    pub histogram_bins: usize,
    /// Rows echoed by the loader diagnostics
    pub head_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            year_rows: 10,
            min_director_movies: 5,
            recent_years: 50,
            histogram_bins: 30,
            head_rows: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("output/charts"),
            width: 1800,
            height: 1200,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub json_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub output_path: PathBuf,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_path: PathBuf::from("output/metrics.prom"),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `movie_eda.toml` in the
    /// working directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    debug!("No {} found, using default configuration", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EdaError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.analysis.histogram_bins == 0 {
            return Err(EdaError::Config("analysis.histogram_bins must be at least 1".to_string()));
        }
        if self.charts.width == 0 || self.charts.height == 0 {
            return Err(EdaError::Config("charts.width and charts.height must be non-zero".to_string()));
        }
        Ok(())
    }
}
