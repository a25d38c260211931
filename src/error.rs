use std::path::PathBuf;
use thiserror::Error;

/// The source dataset could not be turned into a raw table.
///
/// Every variant is fatal for a run: nothing downstream of the loader may
/// execute once one of these is returned.
#[derive(Error, Debug)]
pub enum DataUnavailable {
    #[error("data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("data file {} could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data file {} is not valid CSV: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("data file {} is missing required columns: {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
}

#[derive(Error, Debug)]
pub enum EdaError {
    #[error(transparent)]
    DataUnavailable(#[from] DataUnavailable),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for EdaError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        EdaError::Chart(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EdaError>;
