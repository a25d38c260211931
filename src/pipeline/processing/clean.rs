use std::collections::HashSet;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::constants::{
    COL_GENRE_CLEAN, COL_IMDB_RATING_CLEAN, COL_IMDB_VOTES_CLEAN, COL_RATING_CLEAN,
    COL_RUNTIME_CLEAN, COL_YEAR_CLEAN, EXCLUDED_RATINGS,
};
use crate::observability::metrics;
use crate::types::{parse_number, CleanedMovie, CleanedTable, RawMovie, RawTable};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("static regex"));

/// Derives analysis-ready columns from a raw table.
///
/// Implementations must be pure: one output row per input row, same order,
/// and the input is never modified.
pub trait Cleaner {
    fn clean(&self, raw: &RawTable) -> CleanedTable;
}

/// The standard movie cleaning rules
pub struct MovieCleaner {
    excluded_ratings: HashSet<&'static str>,
}

impl Default for MovieCleaner {
    fn default() -> Self {
        Self {
            excluded_ratings: EXCLUDED_RATINGS.into_iter().collect(),
        }
    }
}

impl MovieCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clean_movie(&self, raw: &RawMovie) -> CleanedMovie {
        CleanedMovie {
            raw: raw.clone(),
            year_clean: clean_year(raw.year.as_deref()),
            runtime_clean: extract_runtime_minutes(raw.runtime.as_deref()),
            rating_clean: self.clean_rating(raw.rating.as_deref()),
            imdb_rating_clean: parse_number(raw.imdb_rating.as_deref()),
            imdb_votes_clean: parse_number(raw.imdb_votes.as_deref()),
            genre_clean: raw.genre.clone(),
        }
    }

    /// Identity, except the placeholder certifications become absent
    pub fn clean_rating(&self, rating: Option<&str>) -> Option<String> {
        rating
            .filter(|r| !self.excluded_ratings.contains(*r))
            .map(str::to_string)
    }
}

impl Cleaner for MovieCleaner {
    #[instrument(skip(self, raw), fields(rows = raw.len()))]
    fn clean(&self, raw: &RawTable) -> CleanedTable {
        let started = Instant::now();
        let rows: Vec<CleanedMovie> = raw.movies.iter().map(|m| self.clean_movie(m)).collect();
        let table = CleanedTable {
            columns: raw.columns.clone(),
            rows,
        };

        let absent = AbsentCounts::tally(&table);
        for (field, count) in absent.fields() {
            if count > 0 {
                debug!(field, count, "Derived values absent");
            }
            metrics::cleaner::absent_values(field, count);
        }
        metrics::cleaner::rows_cleaned(table.len());
        metrics::cleaner::duration(started.elapsed().as_secs_f64());
        info!("Cleaned {} rows", table.len());

        table
    }
}

/// Numeric year. Integral floats such as `"1999.0"` are accepted.
pub fn clean_year(year: Option<&str>) -> Option<i32> {
    let text = year?.trim();
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    let value = text.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

/// Minutes taken from the first run of ASCII digits anywhere in the text
pub fn extract_runtime_minutes(runtime: Option<&str>) -> Option<u32> {
    let digits = DIGIT_RUN.find(runtime?)?;
    digits.as_str().parse().ok()
}

/// Per-field counts of absent derived values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsentCounts {
    pub year: usize,
    pub runtime: usize,
    pub rating: usize,
    pub imdb_rating: usize,
    pub imdb_votes: usize,
    pub genre: usize,
}

impl AbsentCounts {
    pub fn tally(table: &CleanedTable) -> Self {
        table.rows.iter().fold(Self::default(), |mut acc, row| {
            acc.year += row.year_clean.is_none() as usize;
            acc.runtime += row.runtime_clean.is_none() as usize;
            acc.rating += row.rating_clean.is_none() as usize;
            acc.imdb_rating += row.imdb_rating_clean.is_none() as usize;
            acc.imdb_votes += row.imdb_votes_clean.is_none() as usize;
            acc.genre += row.genre_clean.is_none() as usize;
            acc
        })
    }

    pub fn fields(&self) -> [(&'static str, usize); 6] {
        [
            (COL_YEAR_CLEAN, self.year),
            (COL_RUNTIME_CLEAN, self.runtime),
            (COL_RATING_CLEAN, self.rating),
            (COL_IMDB_RATING_CLEAN, self.imdb_rating),
            (COL_IMDB_VOTES_CLEAN, self.imdb_votes),
            (COL_GENRE_CLEAN, self.genre),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(year: &str, runtime: &str, rating: &str) -> RawMovie {
        let opt = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
        RawMovie {
            title: Some("T".to_string()),
            year: opt(year),
            runtime: opt(runtime),
            rating: opt(rating),
            imdb_rating: Some("7.1".to_string()),
            imdb_votes: Some("1200".to_string()),
            genre: Some("Drama".to_string()),
            director: Some("D".to_string()),
            metacritic: Some("70".to_string()),
        }
    }

    #[test]
    fn test_runtime_extraction() {
        assert_eq!(extract_runtime_minutes(Some("142 min")), Some(142));
        assert_eq!(extract_runtime_minutes(Some("min")), None);
        assert_eq!(extract_runtime_minutes(Some("PT1H42M")), Some(1));
        assert_eq!(extract_runtime_minutes(Some("about 95 or 100 min")), Some(95));
        assert_eq!(extract_runtime_minutes(Some("")), None);
        assert_eq!(extract_runtime_minutes(None), None);
        assert_eq!(extract_runtime_minutes(Some("99999999999 min")), None);
        // Non-ASCII digits are not part of a run
        assert_eq!(extract_runtime_minutes(Some("١٤٢ / 90 min")), Some(90));
        assert_eq!(extract_runtime_minutes(Some("1٤2 min")), Some(1));
    }

    #[test]
    fn test_rating_cleaning() {
        let cleaner = MovieCleaner::new();
        assert_eq!(cleaner.clean_rating(Some("NOT RATED")), None);
        assert_eq!(cleaner.clean_rating(Some("UNRATED")), None);
        assert_eq!(cleaner.clean_rating(Some("APPROVED")), None);
        assert_eq!(cleaner.clean_rating(Some("PASSED")), None);
        assert_eq!(cleaner.clean_rating(Some("PG-13")), Some("PG-13".to_string()));
        // Exact match only
        assert_eq!(cleaner.clean_rating(Some("Not Rated")), Some("Not Rated".to_string()));
        assert_eq!(cleaner.clean_rating(None), None);
    }

    #[test]
    fn test_year_cleaning() {
        assert_eq!(clean_year(Some("1999")), Some(1999));
        assert_eq!(clean_year(Some(" 2004 ")), Some(2004));
        assert_eq!(clean_year(Some("1999.0")), Some(1999));
        assert_eq!(clean_year(Some("1999.5")), None);
        assert_eq!(clean_year(Some("N/A")), None);
        assert_eq!(clean_year(Some("2001–2003")), None);
        assert_eq!(clean_year(None), None);
    }

    #[test]
    fn test_end_to_end_row() {
        let movie = RawMovie {
            title: Some("X".to_string()),
            year: Some("2001".to_string()),
            runtime: Some("120 min".to_string()),
            rating: Some("APPROVED".to_string()),
            imdb_rating: Some("8.5".to_string()),
            imdb_votes: Some("100000".to_string()),
            genre: Some("Drama, War".to_string()),
            director: Some("D".to_string()),
            metacritic: None,
        };
        let cleaned = MovieCleaner::new().clean_movie(&movie);

        assert_eq!(cleaned.year_clean, Some(2001));
        assert_eq!(cleaned.runtime_clean, Some(120));
        assert_eq!(cleaned.rating_clean, None);
        assert_eq!(cleaned.imdb_rating_clean, Some(8.5));
        assert_eq!(cleaned.imdb_votes_clean, Some(100000.0));
        assert_eq!(cleaned.genre_clean.as_deref(), Some("Drama, War"));
        assert_eq!(cleaned.raw, movie);
    }

    #[test]
    fn test_clean_preserves_rows_and_order() {
        let table = RawTable::new(
            vec!["title".to_string()],
            vec![
                raw("1999", "142 min", "R"),
                raw("N/A", "min", "NOT RATED"),
                raw("", "", ""),
                raw("2010", "90 min", "PG"),
            ],
        );
        let before = table.clone();
        let cleaned = MovieCleaner::new().clean(&table);

        assert_eq!(table, before);
        assert_eq!(cleaned.len(), table.len());
        for (raw_row, cleaned_row) in table.movies.iter().zip(&cleaned.rows) {
            assert_eq!(&cleaned_row.raw, raw_row);
        }
        let years: Vec<Option<i32>> = cleaned.rows.iter().map(|r| r.year_clean).collect();
        assert_eq!(years, vec![Some(1999), None, None, Some(2010)]);
    }

    #[test]
    fn test_clean_is_idempotent_over_raw_columns() {
        let table = RawTable::new(
            vec![],
            vec![raw("1999", "142 min", "R"), raw("N/A", "PT1H42M", "PASSED")],
        );
        let cleaner = MovieCleaner::new();
        let first = cleaner.clean(&table);
        let second = cleaner.clean(&first.to_raw());
        assert_eq!(first, second);
    }

    #[test]
    fn test_absent_counts() {
        let table = RawTable::new(
            vec![],
            vec![raw("1999", "142 min", "R"), raw("N/A", "min", "UNRATED")],
        );
        let counts = AbsentCounts::tally(&MovieCleaner::new().clean(&table));
        assert_eq!(counts.year, 1);
        assert_eq!(counts.runtime, 1);
        assert_eq!(counts.rating, 1);
        assert_eq!(counts.imdb_rating, 0);
    }

    #[test]
    fn test_empty_table() {
        let cleaned = MovieCleaner::new().clean(&RawTable::default());
        assert!(cleaned.is_empty());
    }
}
