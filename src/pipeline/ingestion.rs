use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::constants::REQUIRED_COLUMNS;
use crate::error::DataUnavailable;
use crate::observability::metrics;
use crate::types::{RawMovie, RawTable};

/// Value type inferred for a column from its non-empty cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Empty,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Empty => "empty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: ColumnType,
    pub missing: usize,
}

/// Diagnostics about a freshly loaded file, for operator visibility
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub head: Vec<RawMovie>,
}

/// Raw table plus the diagnostics gathered while reading it
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: RawTable,
    pub summary: LoadSummary,
}

/// Reads the source CSV into a [`RawTable`]
pub struct Loader {
    head_rows: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self { head_rows: 5 }
    }
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leading rows kept in the summary
    pub fn with_head_rows(mut self, head_rows: usize) -> Self {
        self.head_rows = head_rows;
        self
    }

    /// Load and profile the CSV file at `path`.
    ///
    /// Any failure is reported as a [`DataUnavailable`] kind; the file is
    /// never partially returned.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<LoadOutcome, DataUnavailable> {
        let started = Instant::now();
        let result = self.read(path);
        metrics::loader::duration(started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                info!(
                    rows = outcome.summary.rows,
                    columns = outcome.summary.columns.len(),
                    "Loaded data file"
                );
                metrics::loader::rows_loaded(outcome.summary.rows, outcome.summary.columns.len());
            }
            Err(e) => {
                warn!("Data file unavailable: {}", e);
                metrics::loader::failed(failure_kind(e));
            }
        }
        result
    }

    fn read(&self, path: &Path) -> Result<LoadOutcome, DataUnavailable> {
        if !path.exists() {
            return Err(DataUnavailable::NotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|source| DataUnavailable::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let failed = |source: csv::Error| read_failure(path, source);

        // Short rows are tolerated; their trailing cells count as missing
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader.headers().map_err(failed)?.clone();
        let columns: Vec<String> = headers.iter().map(str::to_string).collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !columns.iter().any(|c| c == *required))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataUnavailable::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            });
        }

        let mut profiler = ColumnProfiler::new(columns.len());
        let mut movies = Vec::new();
        for result in reader.records() {
            let record = result.map_err(failed)?;
            profiler.observe(&record);
            let movie: RawMovie = record.deserialize(Some(&headers)).map_err(failed)?;
            movies.push(movie);
        }
        debug!("Read {} records", movies.len());

        let summary = LoadSummary {
            rows: movies.len(),
            columns: profiler.finish(&columns),
            head: movies.iter().take(self.head_rows).cloned().collect(),
        };

        Ok(LoadOutcome {
            table: RawTable::new(columns, movies),
            summary,
        })
    }
}

/// I/O failures while reading are `Unreadable`; everything else the CSV
/// reader rejects is `Malformed`.
fn read_failure(path: &Path, source: csv::Error) -> DataUnavailable {
    if !source.is_io_error() {
        return DataUnavailable::Malformed {
            path: path.to_path_buf(),
            source,
        };
    }
    let source = match source.into_kind() {
        csv::ErrorKind::Io(err) => err,
        other => io::Error::new(io::ErrorKind::Other, format!("{:?}", other)),
    };
    DataUnavailable::Unreadable {
        path: path.to_path_buf(),
        source,
    }
}

fn failure_kind(err: &DataUnavailable) -> &'static str {
    match err {
        DataUnavailable::NotFound { .. } => "not_found",
        DataUnavailable::Unreadable { .. } => "unreadable",
        DataUnavailable::Malformed { .. } => "malformed",
        DataUnavailable::MissingColumns { .. } => "missing_columns",
    }
}

/// Running per-column counts used to infer types and missing values
struct ColumnProfiler {
    missing: Vec<usize>,
    non_empty: Vec<usize>,
    integers: Vec<usize>,
    floats: Vec<usize>,
}

impl ColumnProfiler {
    fn new(width: usize) -> Self {
        Self {
            missing: vec![0; width],
            non_empty: vec![0; width],
            integers: vec![0; width],
            floats: vec![0; width],
        }
    }

    fn observe(&mut self, record: &StringRecord) {
        for idx in 0..self.missing.len() {
            let cell = record.get(idx).unwrap_or("");
            if cell.is_empty() {
                self.missing[idx] += 1;
                continue;
            }
            self.non_empty[idx] += 1;
            let cell = cell.trim();
            if cell.parse::<i64>().is_ok() {
                self.integers[idx] += 1;
            } else if cell.parse::<f64>().is_ok() {
                self.floats[idx] += 1;
            }
        }
    }

    fn finish(self, columns: &[String]) -> Vec<ColumnProfile> {
        columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let non_empty = self.non_empty[idx];
                let inferred_type = if non_empty == 0 {
                    ColumnType::Empty
                } else if self.integers[idx] == non_empty {
                    ColumnType::Integer
                } else if self.integers[idx] + self.floats[idx] == non_empty {
                    ColumnType::Float
                } else {
                    ColumnType::Text
                };
                ColumnProfile {
                    name: name.clone(),
                    inferred_type,
                    missing: self.missing[idx],
                }
            })
            .collect()
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset shape: ({}, {})", self.rows, self.columns.len())?;

        writeln!(f, "\nFirst {} rows:", self.head.len())?;
        writeln!(
            f,
            "{:<40} {:>6} {:>9} {:>10} {:>6} {:>10}",
            "title", "year", "runtime", "rating", "imdb", "votes"
        )?;
        for movie in &self.head {
            writeln!(
                f,
                "{:<40} {:>6} {:>9} {:>10} {:>6} {:>10}",
                truncate(movie.title.as_deref().unwrap_or("-"), 40),
                movie.year.as_deref().unwrap_or("-"),
                movie.runtime.as_deref().unwrap_or("-"),
                movie.rating.as_deref().unwrap_or("-"),
                movie.imdb_rating.as_deref().unwrap_or("-"),
                movie.imdb_votes.as_deref().unwrap_or("-"),
            )?;
        }

        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "\nColumns: {:?}", names)?;

        writeln!(f, "\nColumn types:")?;
        for column in &self.columns {
            writeln!(f, "  {:<16} {}", column.name, column.inferred_type)?;
        }

        writeln!(f, "\nMissing values:")?;
        for column in &self.columns {
            writeln!(f, "  {:<16} {}", column.name, column.missing)?;
        }
        Ok(())
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "title,year,runtime,rating,imdbRating,imdbVotes,genre,director,metacritic";

    fn write_csv(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = Loader::new().load(Path::new("no/such/movies.csv"));
        assert!(matches!(result, Err(DataUnavailable::NotFound { .. })));
    }

    #[test]
    fn test_missing_columns_reported() {
        let file = write_csv("title,year\nX,2001\n");
        match Loader::new().load(file.path()) {
            Err(DataUnavailable::MissingColumns { columns, .. }) => {
                assert!(columns.contains(&"runtime".to_string()));
                assert!(columns.contains(&"imdbRating".to_string()));
                assert!(!columns.contains(&"title".to_string()));
                assert_eq!(columns.len(), 7);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = Loader::new().load(dir.path());
        assert!(matches!(result, Err(DataUnavailable::Unreadable { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        file.write_all(b"\xff\xfe,1999,1 min,PG,8,10,Drama,D,50\n").unwrap();
        let result = Loader::new().load(file.path());
        assert!(matches!(result, Err(DataUnavailable::Malformed { .. })));
    }

    #[test]
    fn test_load_profiles_columns() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             A,1999,142 min,R,8.5,1000,Drama,D1,80\n\
             B,N/A,,PG-13,7.0,2000,\"Drama, War\",D2,\n\
             C,2005,90 min,,6,3000,Comedy,D1,61\n"
        ));
        let outcome = Loader::new().with_head_rows(2).load(file.path()).unwrap();

        assert_eq!(outcome.table.len(), 3);
        assert_eq!(outcome.table.columns.len(), 9);
        assert_eq!(outcome.summary.rows, 3);
        assert_eq!(outcome.summary.head.len(), 2);

        let profile = |name: &str| {
            outcome
                .summary
                .columns
                .iter()
                .find(|c| c.name == name)
                .cloned()
                .unwrap()
        };
        assert_eq!(profile("year").inferred_type, ColumnType::Text);
        assert_eq!(profile("imdbRating").inferred_type, ColumnType::Float);
        assert_eq!(profile("imdbVotes").inferred_type, ColumnType::Integer);
        assert_eq!(profile("runtime").missing, 1);
        assert_eq!(profile("metacritic").missing, 1);
        assert_eq!(profile("rating").missing, 1);

        let second = &outcome.table.movies[1];
        assert_eq!(second.genre.as_deref(), Some("Drama, War"));
        assert_eq!(second.runtime, None);
        assert_eq!(second.metacritic, None);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let file = write_csv(&format!("{HEADER}\nA,1999,142 min\n"));
        let outcome = Loader::new().load(file.path()).unwrap();
        let movie = &outcome.table.movies[0];
        assert_eq!(movie.runtime.as_deref(), Some("142 min"));
        assert_eq!(movie.director, None);
        assert_eq!(outcome.summary.columns[8].missing, 1);
    }

    #[test]
    fn test_summary_display_mentions_shape() {
        let file = write_csv(&format!("{HEADER}\nA,1999,142 min,R,8.5,1000,Drama,D1,80\n"));
        let outcome = Loader::new().load(file.path()).unwrap();
        let rendered = outcome.summary.to_string();
        assert!(rendered.contains("Dataset shape: (1, 9)"));
        assert!(rendered.contains("Missing values:"));
    }
}
