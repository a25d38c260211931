//! Descriptive statistics over columns with absent values already dropped.

use serde::Serialize;

/// Summary of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation, needs at least two values
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub fn describe(values: &[f64]) -> Describe {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Describe {
        count: values.len(),
        mean: mean(values),
        std: sample_std(values),
        min: sorted.first().copied(),
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile with linear interpolation between closest ranks
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Pearson correlation of paired observations.
///
/// Undefined for fewer than two pairs or when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Pairwise-complete Pearson matrix over columns of optional values.
///
/// All columns must have the same length (one entry per row).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn compute(labels: Vec<String>, columns: &[Vec<Option<f64>>]) -> Self {
        let k = columns.len();
        let mut values = vec![vec![None; k]; k];
        for i in 0..k {
            for j in i..k {
                let pairs: Vec<(f64, f64)> = columns[i]
                    .iter()
                    .zip(&columns[j])
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .collect();
                let r = pearson(&pairs);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Self { labels, values }
    }

    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == row)?;
        let j = self.labels.iter().position(|l| l == col)?;
        self.values[i][j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_describe_matches_linear_quantiles() {
        let d = describe(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(d.count, 4);
        assert!(close(d.mean, 2.5));
        assert!(close(d.std, (5.0f64 / 3.0).sqrt()));
        assert!(close(d.min, 1.0));
        assert!(close(d.q25, 1.75));
        assert!(close(d.median, 2.5));
        assert!(close(d.q75, 3.25));
        assert!(close(d.max, 4.0));
    }

    #[test]
    fn test_describe_small_inputs() {
        let empty = describe(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.median, None);

        let single = describe(&[7.0]);
        assert_eq!(single.std, None);
        assert!(close(single.q75, 7.0));
    }

    #[test]
    fn test_pearson() {
        assert!(close(pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]), 1.0));
        assert!(close(pearson(&[(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]), -1.0));
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
        assert_eq!(pearson(&[(1.0, 5.0), (2.0, 5.0)]), None);
    }

    #[test]
    fn test_correlation_matrix_uses_pairwise_complete_rows() {
        let a = vec![Some(1.0), Some(2.0), Some(3.0), None];
        let b = vec![Some(2.0), Some(4.0), Some(6.0), Some(100.0)];
        let c = vec![Some(3.0), None, Some(1.0), Some(0.0)];
        let m = CorrelationMatrix::compute(
            vec!["a".into(), "b".into(), "c".into()],
            &[a, b, c],
        );
        assert!(close(m.get("a", "b"), 1.0));
        assert!(close(m.get("a", "a"), 1.0));
        assert_eq!(m.get("a", "b"), m.get("b", "a"));
        // a and c share only rows 0 and 2
        assert!(close(m.get("a", "c"), -1.0));
        assert_eq!(m.get("a", "missing"), None);
    }
}
