use serde::{Deserialize, Serialize};

/// One movie exactly as it appears in the source file.
///
/// Every field is kept as text; empty cells deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMovie {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default, rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(default, rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub metacritic: Option<String>,
}

/// The unmodified parsed contents of the source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub movies: Vec<RawMovie>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, movies: Vec<RawMovie>) -> Self {
        Self { columns, movies }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// A raw movie plus its derived, analysis-ready fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedMovie {
    pub raw: RawMovie,
    pub year_clean: Option<i32>,
    pub runtime_clean: Option<u32>,
    pub rating_clean: Option<String>,
    pub imdb_rating_clean: Option<f64>,
    pub imdb_votes_clean: Option<f64>,
    pub genre_clean: Option<String>,
}

impl CleanedMovie {
    pub fn title(&self) -> Option<&str> {
        self.raw.title.as_deref()
    }

    pub fn director(&self) -> Option<&str> {
        self.raw.director.as_deref()
    }

    /// Metacritic score, absent when the raw cell is empty or not numeric
    pub fn metacritic(&self) -> Option<f64> {
        parse_number(self.raw.metacritic.as_deref())
    }

    /// Individual genres, split from `genre_clean` at consumption time.
    ///
    /// Splits on `,` and trims each part, so `"Drama,War"` and `"Drama, War"`
    /// yield the same genres.
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre_clean
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }
}

/// Raw table augmented with derived columns. Built once per run and only
/// ever read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedTable {
    pub columns: Vec<String>,
    pub rows: Vec<CleanedMovie>,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Recover the raw table this one was derived from
    pub fn to_raw(&self) -> RawTable {
        RawTable::new(
            self.columns.clone(),
            self.rows.iter().map(|r| r.raw.clone()).collect(),
        )
    }

    /// Values of one numeric column with absent entries dropped
    pub fn numeric_values(&self, column: NumericColumn) -> Vec<f64> {
        self.rows.iter().filter_map(|r| column.value(r)).collect()
    }
}

/// The numeric columns the analysis stages aggregate over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NumericColumn {
    Metacritic,
    ImdbRating,
    ImdbVotes,
    Runtime,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::Metacritic,
        NumericColumn::ImdbRating,
        NumericColumn::ImdbVotes,
        NumericColumn::Runtime,
    ];

    pub fn name(&self) -> &'static str {
        use crate::constants::*;
        match self {
            NumericColumn::Metacritic => COL_METACRITIC,
            NumericColumn::ImdbRating => COL_IMDB_RATING_CLEAN,
            NumericColumn::ImdbVotes => COL_IMDB_VOTES_CLEAN,
            NumericColumn::Runtime => COL_RUNTIME_CLEAN,
        }
    }

    pub fn value(&self, movie: &CleanedMovie) -> Option<f64> {
        match self {
            NumericColumn::Metacritic => movie.metacritic(),
            NumericColumn::ImdbRating => movie.imdb_rating_clean,
            NumericColumn::ImdbVotes => movie.imdb_votes_clean,
            NumericColumn::Runtime => movie.runtime_clean.map(f64::from),
        }
    }
}

/// Lenient numeric parse: surrounding whitespace and thousands separators
/// are tolerated, anything else non-finite is absent.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim().replace(',', "");
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some("8.5")), Some(8.5));
        assert_eq!(parse_number(Some(" 100,000 ")), Some(100000.0));
        assert_eq!(parse_number(Some("N/A")), None);
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("inf")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_genres_split_and_trim() {
        let movie = CleanedMovie {
            raw: RawMovie::default(),
            year_clean: None,
            runtime_clean: None,
            rating_clean: None,
            imdb_rating_clean: None,
            imdb_votes_clean: None,
            genre_clean: Some("Drama, War,  ,Crime".to_string()),
        };
        let genres: Vec<&str> = movie.genres().collect();
        assert_eq!(genres, vec!["Drama", "War", "Crime"]);

        let compact = CleanedMovie {
            genre_clean: Some("Drama,War".to_string()),
            ..movie.clone()
        };
        assert_eq!(compact.genres().collect::<Vec<_>>(), vec!["Drama", "War"]);
    }
}
