use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{info, instrument};

use super::aggregates::{top_n, yearly_counts};
use super::stats::{describe, CorrelationMatrix, Describe};
use crate::config::AnalysisConfig;
use crate::types::{CleanedMovie, CleanedTable, NumericColumn};

/// Entry of a top-N listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMovie {
    pub title: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub imdb_rating: Option<f64>,
    pub imdb_votes: Option<f64>,
}

impl From<&CleanedMovie> for RankedMovie {
    fn from(movie: &CleanedMovie) -> Self {
        Self {
            title: movie.raw.title.clone(),
            director: movie.raw.director.clone(),
            genre: movie.genre_clean.clone(),
            imdb_rating: movie.imdb_rating_clean,
            imdb_votes: movie.imdb_votes_clean,
        }
    }
}

/// Results of the exploratory analysis stage
#[derive(Debug, Clone, Serialize)]
pub struct EdaSummary {
    pub describe: Vec<(String, Describe)>,
    pub correlation: CorrelationMatrix,
    pub top_rated: Vec<RankedMovie>,
    pub most_voted: Vec<RankedMovie>,
    pub yearly_counts: BTreeMap<i32, usize>,
    /// How many of the earliest years the text rendering lists
    #[serde(skip)]
    pub years_shown: usize,
}

/// Descriptive statistics, correlations and top-N lists
#[instrument(skip_all, fields(rows = table.len()))]
pub fn explore(table: &CleanedTable, config: &AnalysisConfig) -> EdaSummary {
    let describe_rows = NumericColumn::ALL
        .iter()
        .map(|col| (col.name().to_string(), describe(&table.numeric_values(*col))))
        .collect();

    let columns: Vec<Vec<Option<f64>>> = NumericColumn::ALL
        .iter()
        .map(|col| table.rows.iter().map(|r| col.value(r)).collect())
        .collect();
    let labels = NumericColumn::ALL.iter().map(|c| c.name().to_string()).collect();
    let correlation = CorrelationMatrix::compute(labels, &columns);

    let top_rated = top_n(table, NumericColumn::ImdbRating, config.top_n)
        .into_iter()
        .map(RankedMovie::from)
        .collect();
    let most_voted = top_n(table, NumericColumn::ImdbVotes, config.top_n)
        .into_iter()
        .map(RankedMovie::from)
        .collect();

    let yearly_counts = yearly_counts(table);
    info!(years = yearly_counts.len(), "Exploratory analysis complete");

    EdaSummary {
        describe: describe_rows,
        correlation,
        top_rated,
        most_voted,
        yearly_counts,
        years_shown: config.year_rows,
    }
}

impl fmt::Display for EdaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Descriptive statistics:")?;
        writeln!(
            f,
            "{:<18} {:>6} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>12}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for (name, d) in &self.describe {
            writeln!(
                f,
                "{:<18} {:>6} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>12}",
                name,
                d.count,
                fmt_opt(d.mean, 3),
                fmt_opt(d.std, 3),
                fmt_opt(d.min, 2),
                fmt_opt(d.q25, 2),
                fmt_opt(d.median, 2),
                fmt_opt(d.q75, 2),
                fmt_opt(d.max, 2),
            )?;
        }

        writeln!(f, "\nCorrelation between numeric columns:")?;
        write!(f, "{:<18}", "")?;
        for label in &self.correlation.labels {
            write!(f, " {:>18}", label)?;
        }
        writeln!(f)?;
        for (label, row) in self.correlation.labels.iter().zip(&self.correlation.values) {
            write!(f, "{:<18}", label)?;
            for value in row {
                write!(f, " {:>18}", fmt_opt(*value, 3))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\nTop {} rated films:", self.top_rated.len())?;
        for m in &self.top_rated {
            writeln!(
                f,
                "  {:<40} {:>5} {:<30} {}",
                m.title.as_deref().unwrap_or("-"),
                fmt_opt(m.imdb_rating, 1),
                m.genre.as_deref().unwrap_or("-"),
                m.director.as_deref().unwrap_or("-"),
            )?;
        }

        writeln!(f, "\nTop {} most voted films:", self.most_voted.len())?;
        for m in &self.most_voted {
            writeln!(
                f,
                "  {:<40} {:>10} {:>5} {}",
                m.title.as_deref().unwrap_or("-"),
                fmt_opt(m.imdb_votes, 0),
                fmt_opt(m.imdb_rating, 1),
                m.director.as_deref().unwrap_or("-"),
            )?;
        }

        writeln!(f, "\nFilms per year (first {} years):", self.years_shown)?;
        for (year, count) in self.yearly_counts.iter().take(self.years_shown) {
            writeln!(f, "  {}  {}", year, count)?;
        }
        Ok(())
    }
}

pub(crate) fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "NaN".to_string(),
    }
}
