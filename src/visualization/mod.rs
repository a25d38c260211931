//! SVG charts for the cleaned table.
//!
//! Chart layout and styling live here only; nothing upstream depends on it.

pub mod palette;

use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{info, instrument};

use crate::analysis::aggregates::{
    genre_counts, histogram, tail, top_directors, yearly_counts, yearly_mean_rating,
};
use crate::analysis::stats::CorrelationMatrix;
use crate::config::{AnalysisConfig, ChartConfig};
use crate::error::Result;
use crate::observability::metrics;
use crate::types::{CleanedMovie, CleanedTable};

/// Renders the fixed chart set into the configured output directory
pub struct ChartRenderer<'a> {
    charts: &'a ChartConfig,
    analysis: &'a AnalysisConfig,
}

/// Row subset used by the numeric plots: rating, runtime and metacritic all present
struct PlotRow {
    rating: f64,
    runtime: f64,
    metacritic: f64,
}

impl PlotRow {
    fn from_movie(movie: &CleanedMovie) -> Option<Self> {
        Some(Self {
            rating: movie.imdb_rating_clean?,
            runtime: f64::from(movie.runtime_clean?),
            metacritic: movie.metacritic()?,
        })
    }
}

impl<'a> ChartRenderer<'a> {
    pub fn new(charts: &'a ChartConfig, analysis: &'a AnalysisConfig) -> Self {
        Self { charts, analysis }
    }

    /// Write every chart and return the paths written
    #[instrument(skip_all, fields(output_dir = %self.charts.output_dir.display()))]
    pub fn render_all(&self, table: &CleanedTable, correlation: &CorrelationMatrix) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.charts.output_dir)?;

        let paths = vec![
            self.render_dashboard(table)?,
            self.render_heatmap(correlation)?,
            self.render_yearly_rating(table)?,
        ];
        info!("Wrote {} charts", paths.len());
        Ok(paths)
    }

    fn size(&self) -> (u32, u32) {
        (self.charts.width, self.charts.height)
    }

    /// Six-panel overview
    pub fn render_dashboard(&self, table: &CleanedTable) -> Result<PathBuf> {
        let path = self.charts.output_dir.join("dashboard.svg");
        let plot_rows: Vec<PlotRow> = table.rows.iter().filter_map(PlotRow::from_movie).collect();

        {
            let root = SVGBackend::new(&path, self.size()).into_drawing_area();
            root.fill(&WHITE)?;
            let panels = root.split_evenly((2, 3));

            let ratings: Vec<f64> = plot_rows.iter().map(|r| r.rating).collect();
            draw_histogram(&panels[0], &ratings, self.analysis.histogram_bins)?;

            let per_year: Vec<(f64, f64)> = tail(&yearly_counts(table), self.analysis.recent_years)
                .into_iter()
                .map(|(year, n)| (f64::from(year), n as f64))
                .collect();
            draw_line(
                &panels[1],
                &format!("Films per year (last {} years)", self.analysis.recent_years),
                "Year",
                "Films",
                &per_year,
            )?;

            let meta_vs_rating: Vec<(f64, f64)> =
                plot_rows.iter().map(|r| (r.metacritic, r.rating)).collect();
            draw_scatter(&panels[2], "Metacritic vs IMDb rating", "Metacritic", "IMDb rating", &meta_vs_rating)?;

            let genres: Vec<(String, f64)> = genre_counts(table)
                .into_iter()
                .take(10)
                .map(|(g, n)| (g, n as f64))
                .collect();
            draw_bars(&panels[3], "Top 10 genres", "Films", &genres)?;

            let directors: Vec<(String, f64)> =
                top_directors(table, self.analysis.min_director_movies, 10)
                    .into_iter()
                    .map(|d| (d.director, d.mean_rating))
                    .collect();
            draw_bars(
                &panels[4],
                &format!("Top directors (min {} films)", self.analysis.min_director_movies),
                "Mean IMDb rating",
                &directors,
            )?;

            let runtime_vs_rating: Vec<(f64, f64)> =
                plot_rows.iter().map(|r| (r.runtime, r.rating)).collect();
            draw_scatter(&panels[5], "Runtime vs IMDb rating", "Runtime (minutes)", "IMDb rating", &runtime_vs_rating)?;

            root.present()?;
        }
        metrics::stages::chart_written("dashboard");
        Ok(path)
    }

    /// Annotated correlation matrix
    pub fn render_heatmap(&self, correlation: &CorrelationMatrix) -> Result<PathBuf> {
        let path = self.charts.output_dir.join("correlation_heatmap.svg");
        {
            let side = self.charts.width.min(self.charts.height);
            let root = SVGBackend::new(&path, (side, side)).into_drawing_area();
            root.fill(&WHITE)?;
            draw_heatmap(&root, correlation)?;
            root.present()?;
        }
        metrics::stages::chart_written("correlation_heatmap");
        Ok(path)
    }

    /// Mean rating per year over the trailing window
    pub fn render_yearly_rating(&self, table: &CleanedTable) -> Result<PathBuf> {
        let path = self.charts.output_dir.join("yearly_rating.svg");
        {
            let root = SVGBackend::new(&path, (self.charts.width, self.charts.height / 2))
                .into_drawing_area();
            root.fill(&WHITE)?;
            let points: Vec<(f64, f64)> = tail(&yearly_mean_rating(table), self.analysis.recent_years)
                .into_iter()
                .map(|(year, mean)| (f64::from(year), mean))
                .collect();
            draw_line(
                &root,
                &format!("Mean IMDb rating (last {} years)", self.analysis.recent_years),
                "Year",
                "Mean IMDb rating",
                &points,
            )?;
            root.present()?;
        }
        metrics::stages::chart_written("yearly_rating");
        Ok(path)
    }
}

/// Axis range covering `values` with a little headroom
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
    bins: usize,
) -> Result<()> {
    let bins = histogram(values, bins);
    let x_range = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => first.start..last.end,
        _ => 0.0..1.0,
    };
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64 * 1.1 + 1.0;

    let mut chart = ChartBuilder::on(area)
        .caption("IMDb rating distribution", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_range, 0f64..y_max)?;
    chart
        .configure_mesh()
        .x_desc("IMDb rating")
        .y_desc("Films")
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLUE.mix(0.7).filled())
    }))?;
    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))
    }))?;
    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
    chart.draw_series(points.iter().map(|p| Circle::new(*p, 3, BLUE.filled())))?;
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_range, y_range)?;
    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    chart.draw_series(points.iter().map(|p| Circle::new(*p, 3, BLUE.mix(0.6).filled())))?;
    Ok(())
}

/// Vertical bars, one per labelled value, in the given order
fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    y_desc: &str,
    bars: &[(String, f64)],
) -> Result<()> {
    let n = bars.len().max(1);
    let y_max = bars.iter().map(|b| b.1).fold(0.0, f64::max) * 1.1 + 0.1;
    let labels: Vec<String> = bars.iter().map(|(label, _)| short_label(label, 12)).collect();
    let label_for = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() < 1e-6 && idx >= 0.0 {
            labels.get(idx as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_for)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *value)], BLUE.mix(0.8).filled())
    }))?;
    Ok(())
}

fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    matrix: &CorrelationMatrix,
) -> Result<()> {
    let k = matrix.labels.len().max(1);
    let top = k as f64 - 1.0;
    let labels: Vec<String> = matrix.labels.iter().map(|l| short_label(l, 18)).collect();
    let x_label = |x: &f64| axis_label(&labels, *x);
    let y_label = |y: &f64| axis_label(&labels, top - *y);

    let mut chart = ChartBuilder::on(area)
        .caption("Correlation heatmap", ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(140)
        .build_cartesian_2d(-0.5f64..(k as f64 - 0.5), -0.5f64..(k as f64 - 0.5))?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(k)
        .y_labels(k)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .draw()?;

    let cells: Vec<(f64, f64, Option<f64>)> = matrix
        .values
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .map(move |(j, v)| (j as f64, top - i as f64, *v))
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, v)| {
        let color = v.map(palette::diverging).unwrap_or(palette::MISSING);
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
    }))?;

    let centered = ("sans-serif", 16)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().map(|&(x, y, v)| {
        let text = v.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "NaN".to_string());
        Text::new(text, (x, y), centered.clone())
    }))?;
    Ok(())
}

fn axis_label(labels: &[String], at: f64) -> String {
    let idx = at.round();
    if (at - idx).abs() < 1e-6 && idx >= 0.0 {
        labels.get(idx as usize).cloned().unwrap_or_default()
    } else {
        String::new()
    }
}

fn short_label(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let mut out: String = label.chars().take(width - 1).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::{Cleaner, MovieCleaner};
    use crate::types::{RawMovie, RawTable};

    fn sample_table() -> CleanedTable {
        let rows = (0..12)
            .map(|i| RawMovie {
                title: Some(format!("Film {i}")),
                year: Some((1990 + i).to_string()),
                runtime: Some(format!("{} min", 90 + i * 5)),
                rating: Some("R".to_string()),
                imdb_rating: Some(format!("{:.1}", 7.0 + i as f64 * 0.1)),
                imdb_votes: Some((10_000 * (i + 1)).to_string()),
                genre: Some(if i % 2 == 0 { "Drama, War" } else { "Comedy" }.to_string()),
                director: Some(if i % 3 == 0 { "Ford" } else { "Hawks" }.to_string()),
                metacritic: if i == 5 { None } else { Some((60 + i).to_string()) },
            })
            .collect();
        MovieCleaner::new().clean(&RawTable::new(vec![], rows))
    }

    #[test]
    fn test_render_all_writes_svgs() {
        let dir = tempfile::tempdir().unwrap();
        let charts = ChartConfig {
            output_dir: dir.path().join("charts"),
            width: 900,
            height: 600,
            ..ChartConfig::default()
        };
        let analysis = AnalysisConfig::default();
        let table = sample_table();
        let summary = crate::analysis::explore(&table, &analysis);

        let paths = ChartRenderer::new(&charts, &analysis)
            .render_all(&table, &summary.correlation)
            .unwrap();

        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("svg"));
            let content = fs::read_to_string(path).unwrap();
            assert!(content.contains("<svg"));
        }
        let heatmap = fs::read_to_string(dir.path().join("charts/correlation_heatmap.svg")).unwrap();
        assert!(heatmap.contains("1.000"));
    }

    #[test]
    fn test_render_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let charts = ChartConfig {
            output_dir: dir.path().to_path_buf(),
            ..ChartConfig::default()
        };
        let analysis = AnalysisConfig::default();
        let table = CleanedTable::default();
        let summary = crate::analysis::explore(&table, &analysis);
        let paths = ChartRenderer::new(&charts, &analysis)
            .render_all(&table, &summary.correlation)
            .unwrap();
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        assert_eq!(padded_range([5.0].into_iter()), 4.0..6.0);
        let r = padded_range([0.0, 10.0].into_iter());
        assert!(r.start < 0.0 && r.end > 10.0);
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("Drama", 12), "Drama");
        assert_eq!(short_label("Christopher Nolan", 10).chars().count(), 10);
    }
}
