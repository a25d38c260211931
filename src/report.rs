use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::analysis::aggregates::{director_counts, genre_counts, idx_max};
use crate::analysis::eda::fmt_opt;
use crate::analysis::stats::{mean, pearson};
use crate::error::Result;
use crate::types::{CleanedTable, NumericColumn};

pub const FINDINGS: [&str; 5] = [
    "The relationship between runtime and IMDb rating was analysed.",
    "The most popular genres were identified.",
    "Film counts and rating trends over the years were examined.",
    "The correlation between metacritic score and IMDb rating was computed.",
    "The most successful directors (at least 5 films) were listed.",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmHighlight {
    pub title: Option<String>,
    pub value: f64,
}

/// Average rating of the films released in one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRating {
    pub year: i32,
    pub mean_rating: Option<f64>,
}

/// Summary figures of a run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_movies: usize,
    pub mean_rating: Option<f64>,
    pub mean_votes: Option<f64>,
    pub mean_runtime: Option<f64>,
    pub best_movie: Option<FilmHighlight>,
    pub most_voted_movie: Option<FilmHighlight>,
    pub most_popular_genre: Option<String>,
    pub most_prolific_director: Option<String>,
    pub oldest_year: Option<YearRating>,
    pub recent_year: Option<YearRating>,
    pub runtime_rating_correlation: Option<f64>,
    pub metacritic_rating_correlation: Option<f64>,
    pub findings: Vec<String>,
}

impl AnalysisReport {
    #[instrument(skip_all, fields(rows = table.len()))]
    pub fn build(table: &CleanedTable) -> Self {
        let highlight = |column: NumericColumn| {
            idx_max(table, column).and_then(|movie| {
                column.value(movie).map(|value| FilmHighlight {
                    title: movie.raw.title.clone(),
                    value,
                })
            })
        };

        let years: Vec<i32> = table.rows.iter().filter_map(|r| r.year_clean).collect();
        let year_rating = |year: i32| {
            let ratings: Vec<f64> = table
                .rows
                .iter()
                .filter(|r| r.year_clean == Some(year))
                .filter_map(|r| r.imdb_rating_clean)
                .collect();
            YearRating {
                year,
                mean_rating: mean(&ratings),
            }
        };

        let report = Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            total_movies: table.len(),
            mean_rating: mean(&table.numeric_values(NumericColumn::ImdbRating)),
            mean_votes: mean(&table.numeric_values(NumericColumn::ImdbVotes)),
            mean_runtime: mean(&table.numeric_values(NumericColumn::Runtime)),
            best_movie: highlight(NumericColumn::ImdbRating),
            most_voted_movie: highlight(NumericColumn::ImdbVotes),
            most_popular_genre: genre_counts(table).into_iter().next().map(|(g, _)| g),
            most_prolific_director: director_counts(table).into_iter().next().map(|(d, _)| d),
            oldest_year: years.iter().min().map(|y| year_rating(*y)),
            recent_year: years.iter().max().map(|y| year_rating(*y)),
            runtime_rating_correlation: correlation(table, NumericColumn::Runtime, NumericColumn::ImdbRating),
            metacritic_rating_correlation: correlation(
                table,
                NumericColumn::Metacritic,
                NumericColumn::ImdbRating,
            ),
            findings: FINDINGS.iter().map(|s| s.to_string()).collect(),
        };
        info!(run_id = %report.run_id, "Report built");
        report
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Wrote report to {}", path.display());
        Ok(())
    }
}

fn correlation(table: &CleanedTable, a: NumericColumn, b: NumericColumn) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = table
        .rows
        .iter()
        .filter_map(|r| Some((a.value(r)?, b.value(r)?)))
        .collect();
    pearson(&pairs)
}

/// Integer with thousands separators
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total films: {}", group_thousands(self.total_movies as f64))?;
        writeln!(f, "Mean IMDb rating: {}", fmt_opt(self.mean_rating, 2))?;
        writeln!(
            f,
            "Mean vote count: {}",
            self.mean_votes.map(group_thousands).unwrap_or_else(|| "NaN".to_string())
        )?;
        writeln!(f, "Mean runtime: {} minutes", fmt_opt(self.mean_runtime, 1))?;

        if let Some(best) = &self.best_movie {
            writeln!(
                f,
                "\nHighest rated film: {} ({})",
                best.title.as_deref().unwrap_or("-"),
                best.value
            )?;
        }
        if let Some(voted) = &self.most_voted_movie {
            writeln!(
                f,
                "Most voted film: {} ({} votes)",
                voted.title.as_deref().unwrap_or("-"),
                group_thousands(voted.value)
            )?;
        }
        writeln!(f, "Most popular genre: {}", self.most_popular_genre.as_deref().unwrap_or("-"))?;
        writeln!(
            f,
            "Most prolific director: {}",
            self.most_prolific_director.as_deref().unwrap_or("-")
        )?;

        if let (Some(oldest), Some(recent)) = (&self.oldest_year, &self.recent_year) {
            writeln!(f, "\nRating trend:")?;
            writeln!(
                f,
                "Mean rating in the oldest year ({}): {}",
                oldest.year,
                fmt_opt(oldest.mean_rating, 2)
            )?;
            writeln!(
                f,
                "Mean rating in the most recent year ({}): {}",
                recent.year,
                fmt_opt(recent.mean_rating, 2)
            )?;
        }

        writeln!(
            f,
            "\nCorrelation between runtime and IMDb rating: {}",
            fmt_opt(self.runtime_rating_correlation, 3)
        )?;
        writeln!(
            f,
            "Correlation between metacritic score and IMDb rating: {}",
            fmt_opt(self.metacritic_rating_correlation, 3)
        )?;

        writeln!(f, "\n{}", "=".repeat(50))?;
        writeln!(f, "KEY FINDINGS")?;
        writeln!(f, "{}", "=".repeat(50))?;
        for (i, finding) in self.findings.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, finding)?;
        }
        Ok(())
    }
}
