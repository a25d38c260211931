/// Column names as they appear in the source CSV header (case-sensitive)
pub const COL_TITLE: &str = "title";
pub const COL_YEAR: &str = "year";
pub const COL_RUNTIME: &str = "runtime";
pub const COL_RATING: &str = "rating";
pub const COL_IMDB_RATING: &str = "imdbRating";
pub const COL_IMDB_VOTES: &str = "imdbVotes";
pub const COL_GENRE: &str = "genre";
pub const COL_DIRECTOR: &str = "director";
pub const COL_METACRITIC: &str = "metacritic";

/// Header fields the loader insists on
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_TITLE,
    COL_YEAR,
    COL_RUNTIME,
    COL_RATING,
    COL_IMDB_RATING,
    COL_IMDB_VOTES,
    COL_GENRE,
    COL_DIRECTOR,
    COL_METACRITIC,
];

// Derived column names, used for CSV output and labels
pub const COL_YEAR_CLEAN: &str = "year_clean";
pub const COL_RUNTIME_CLEAN: &str = "runtime_clean";
pub const COL_RATING_CLEAN: &str = "rating_clean";
pub const COL_IMDB_RATING_CLEAN: &str = "imdb_rating_clean";
pub const COL_IMDB_VOTES_CLEAN: &str = "imdb_votes_clean";
pub const COL_GENRE_CLEAN: &str = "genre_clean";

/// Certification placeholders that carry no rating information
pub const EXCLUDED_RATINGS: [&str; 4] = ["NOT RATED", "UNRATED", "APPROVED", "PASSED"];

pub const DEFAULT_DATA_PATH: &str = "imdb_top_1000.csv";
pub const DEFAULT_CONFIG_PATH: &str = "movie_eda.toml";
