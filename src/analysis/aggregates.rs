//! Group-by and ranking queries over the cleaned table.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::types::{CleanedMovie, CleanedTable, NumericColumn};

/// Rows with the `n` largest values of `column`, absent values skipped.
/// Ties keep table order.
pub fn top_n<'a>(table: &'a CleanedTable, column: NumericColumn, n: usize) -> Vec<&'a CleanedMovie> {
    let mut ranked: Vec<(f64, &CleanedMovie)> = table
        .rows
        .iter()
        .filter_map(|row| column.value(row).map(|v| (v, row)))
        .collect();
    // Stable sort, so equal keys stay in input order
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    ranked.into_iter().take(n).map(|(_, row)| row).collect()
}

/// First row holding the maximum of `column`
pub fn idx_max(table: &CleanedTable, column: NumericColumn) -> Option<&CleanedMovie> {
    top_n(table, column, 1).into_iter().next()
}

/// Number of films per cleaned year, ascending by year
pub fn yearly_counts(table: &CleanedTable) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for year in table.rows.iter().filter_map(|r| r.year_clean) {
        *counts.entry(year).or_insert(0) += 1;
    }
    counts
}

/// Mean IMDb rating per cleaned year; years without any rating are left out
pub fn yearly_mean_rating(table: &CleanedTable) -> BTreeMap<i32, f64> {
    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for row in &table.rows {
        if let (Some(year), Some(rating)) = (row.year_clean, row.imdb_rating_clean) {
            let entry = sums.entry(year).or_insert((0.0, 0));
            entry.0 += rating;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(year, (sum, n))| (year, sum / n as f64))
        .collect()
}

/// The last `n` entries of an ordered map
pub fn tail<K: Clone + Ord, V: Clone>(map: &BTreeMap<K, V>, n: usize) -> Vec<(K, V)> {
    let skip = map.len().saturating_sub(n);
    map.iter().skip(skip).map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Occurrence counts ordered by descending count; ties keep first-seen order
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value.to_string());
        }
        *count += 1;
    }
    let mut result: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| {
            let n = counts[v.as_str()];
            (v, n)
        })
        .collect();
    result.sort_by(|a, b| b.1.cmp(&a.1));
    result
}

/// Genre frequencies after splitting `genre_clean`
pub fn genre_counts(table: &CleanedTable) -> Vec<(String, usize)> {
    value_counts(table.rows.iter().flat_map(|r| r.genres()))
}

/// Film counts per director, absent directors skipped
pub fn director_counts(table: &CleanedTable) -> Vec<(String, usize)> {
    value_counts(table.rows.iter().filter_map(|r| r.director()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorStats {
    pub director: String,
    /// Mean rating rounded to two decimals
    pub mean_rating: f64,
    /// Films with a rating
    pub movie_count: usize,
}

/// Directors with at least `min_movies` rated films, best mean rating first.
/// Ties are broken alphabetically.
pub fn top_directors(table: &CleanedTable, min_movies: usize, n: usize) -> Vec<DirectorStats> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in &table.rows {
        if let Some(director) = row.director() {
            let entry = groups.entry(director).or_insert((0.0, 0));
            if let Some(rating) = row.imdb_rating_clean {
                entry.0 += rating;
                entry.1 += 1;
            }
        }
    }

    let mut qualified: Vec<DirectorStats> = groups
        .into_iter()
        .filter(|(_, (_, count))| *count > 0 && *count >= min_movies)
        .map(|(director, (sum, count))| DirectorStats {
            director: director.to_string(),
            mean_rating: round2(sum / count as f64),
            movie_count: count,
        })
        .collect();
    qualified.sort_by(|a, b| b.mean_rating.total_cmp(&a.mean_rating));
    qualified.truncate(n);
    qualified
}

/// Equal-width bins between the minimum and maximum, last bin closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A single distinct value gets a unit-wide range around it
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bins as f64;

    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        result[idx].count += 1;
    }
    result
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawMovie;

    fn movie(title: &str, year: Option<i32>, rating: Option<f64>, director: &str, genre: &str) -> CleanedMovie {
        CleanedMovie {
            raw: RawMovie {
                title: Some(title.to_string()),
                director: if director.is_empty() { None } else { Some(director.to_string()) },
                ..RawMovie::default()
            },
            year_clean: year,
            runtime_clean: None,
            rating_clean: None,
            imdb_rating_clean: rating,
            imdb_votes_clean: None,
            genre_clean: Some(genre.to_string()),
        }
    }

    fn table(rows: Vec<CleanedMovie>) -> CleanedTable {
        CleanedTable { columns: vec![], rows }
    }

    #[test]
    fn test_top_n_skips_absent_and_keeps_tie_order() {
        let t = table(vec![
            movie("a", None, Some(8.0), "", ""),
            movie("b", None, None, "", ""),
            movie("c", None, Some(9.0), "", ""),
            movie("d", None, Some(8.0), "", ""),
        ]);
        let titles: Vec<&str> = top_n(&t, NumericColumn::ImdbRating, 3)
            .iter()
            .filter_map(|m| m.title())
            .collect();
        assert_eq!(titles, vec!["c", "a", "d"]);
        assert_eq!(idx_max(&t, NumericColumn::ImdbRating).and_then(|m| m.title()), Some("c"));
        assert!(idx_max(&t, NumericColumn::ImdbVotes).is_none());
    }

    #[test]
    fn test_yearly_aggregates() {
        let t = table(vec![
            movie("a", Some(2001), Some(8.0), "", ""),
            movie("b", Some(1999), Some(6.0), "", ""),
            movie("c", Some(2001), Some(7.0), "", ""),
            movie("d", None, Some(9.0), "", ""),
            movie("e", Some(1980), None, "", ""),
        ]);
        let counts = yearly_counts(&t);
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![(1980, 1), (1999, 1), (2001, 2)]);

        let means = yearly_mean_rating(&t);
        assert_eq!(means.get(&2001), Some(&7.5));
        assert!(!means.contains_key(&1980));

        assert_eq!(tail(&yearly_counts(&t), 2), vec![(1999, 1), (2001, 2)]);
        assert_eq!(tail(&yearly_counts(&t), 10).len(), 3);
    }

    #[test]
    fn test_genre_and_director_counts() {
        let t = table(vec![
            movie("a", None, None, "Nolan", "Drama, War"),
            movie("b", None, None, "Kubrick", "Comedy, Drama"),
            movie("c", None, None, "Kubrick", "War"),
            movie("d", None, None, "", "Drama"),
        ]);
        let genres = genre_counts(&t);
        assert_eq!(genres[0], ("Drama".to_string(), 3));
        assert_eq!(genres[1], ("War".to_string(), 2));
        assert_eq!(genres[2], ("Comedy".to_string(), 1));

        let directors = director_counts(&t);
        assert_eq!(directors[0], ("Kubrick".to_string(), 2));
        assert_eq!(directors.len(), 2);
    }

    #[test]
    fn test_value_counts_ties_keep_first_seen() {
        let counts = value_counts(vec!["b", "a", "a", "b", "c"]);
        assert_eq!(counts[0].0, "b");
        assert_eq!(counts[1].0, "a");
        assert_eq!(counts[2], ("c".to_string(), 1));
    }

    #[test]
    fn test_top_directors_requires_minimum_rated_films() {
        let mut rows = Vec::new();
        for r in [8.0, 8.2, 8.4] {
            rows.push(movie("x", None, Some(r), "Veteran", ""));
        }
        rows.push(movie("x", None, None, "Veteran", ""));
        rows.push(movie("y", None, Some(9.9), "Newcomer", ""));
        for r in [7.0, 7.0, 7.0] {
            rows.push(movie("z", None, Some(r), "Steady", ""));
        }
        let t = table(rows);

        let top = top_directors(&t, 3, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].director, "Veteran");
        assert_eq!(top[0].mean_rating, 8.2);
        assert_eq!(top[0].movie_count, 3);
        assert_eq!(top[1].director, "Steady");

        assert_eq!(top_directors(&t, 4, 10).len(), 0);
        assert_eq!(top_directors(&t, 1, 1)[0].director, "Newcomer");
    }

    #[test]
    fn test_histogram() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(bins.len(), 4);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 2]);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[3].end, 4.0);

        let single = histogram(&[5.0, 5.0], 3);
        assert_eq!(single.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(histogram(&[], 3).is_empty());
    }
}
