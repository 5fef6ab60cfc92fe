//! SVG rendering of traversal and variant tables.

use super::{FrequencyTable, HistogramBins, Metric, TraversalResult};
use crate::core::error::{Result, XyError};
use crate::core::fs::make_parent_dirs;
use crate::engine::window::WindowSummaryRow;
use crate::variants::VariantBalance;
use log::{debug, info};
use plotters::prelude::*;
use std::fmt::Display;
use std::path::{Path, PathBuf};

const PLOT_SIZE: (u32, u32) = (1000, 600);
const VARIANT_HIST_BINS: usize = 50;

fn plot_err<E: Display>(err: E) -> XyError {
    XyError::Plot(err.to_string())
}

/// Marker colour for a chromosome: green for X, blue for Y, red otherwise.
pub fn chromosome_color(chromosome: &str) -> RGBColor {
    if chromosome.contains('X') {
        GREEN
    } else if chromosome.contains('Y') {
        BLUE
    } else {
        RED
    }
}

/// Upper axis bound that keeps degenerate ranges drawable.
fn axis_max(max: f64) -> f64 {
    if max.is_finite() && max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

/// Destination for rendered charts; every method returns the written file.
pub trait PlotSink {
    fn windows(&self, chromosome: &str, metric: Metric, rows: &[WindowSummaryRow]) -> Result<PathBuf>;

    fn histogram(&self, chromosome: &str, metric: Metric, table: &FrequencyTable) -> Result<PathBuf>;

    fn variant_scatter(&self, chromosome: &str, balances: &[VariantBalance]) -> Result<PathBuf>;

    fn variant_histogram(&self, chromosome: &str, balances: &[VariantBalance]) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct SvgPlotter {
    root: PathBuf,
}

impl SvgPlotter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn target(&self, chromosome: &str, file_name: &str) -> Result<PathBuf> {
        let path = self.root.join(chromosome).join(file_name);
        make_parent_dirs(&path)?;
        Ok(path)
    }

    fn scatter(
        &self,
        path: &Path,
        caption: &str,
        x_desc: &str,
        y_desc: &str,
        color: RGBColor,
        points: &[(f64, f64)],
        y_max: Option<f64>,
    ) -> Result<()> {
        let x_max = axis_max(points.iter().map(|p| p.0).fold(0.0, f64::max));
        let y_max = y_max.unwrap_or_else(|| axis_max(points.iter().map(|p| p.1).fold(0.0, f64::max)));

        let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
            .map_err(plot_err)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()
            .map_err(plot_err)?;
        chart
            .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 2, color.filled())))
            .map_err(plot_err)?;
        root.present().map_err(plot_err)?;
        Ok(())
    }

    /// Bars spanning `[value, value + width)` with height `count`.
    fn bars(
        &self,
        path: &Path,
        caption: &str,
        x_desc: &str,
        color: RGBColor,
        bars: &[(f64, u64)],
        width: f64,
    ) -> Result<()> {
        let x_min = bars.iter().map(|b| b.0).fold(0.0, f64::min);
        let x_max = axis_max(bars.iter().map(|b| b.0 + width).fold(0.0, f64::max));
        let y_max = axis_max(bars.iter().map(|b| b.1 as f64).fold(0.0, f64::max));

        let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0f64..y_max)
            .map_err(plot_err)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(x_desc)
            .y_desc("Frequency")
            .draw()
            .map_err(plot_err)?;
        chart
            .draw_series(bars.iter().map(|&(value, count)| {
                Rectangle::new([(value, 0.0), (value + width, count as f64)], color.mix(0.7).filled())
            }))
            .map_err(plot_err)?;
        root.present().map_err(plot_err)?;
        Ok(())
    }
}

impl PlotSink for SvgPlotter {
    fn windows(&self, chromosome: &str, metric: Metric, rows: &[WindowSummaryRow]) -> Result<PathBuf> {
        let path = self.target(chromosome, &format!("{}_windows.svg", metric.plot_stem()))?;
        let points: Vec<(f64, f64)> = rows
            .iter()
            .map(|row| (row.window_index as f64, metric.window_value(row)))
            .collect();
        self.scatter(
            &path,
            &format!("{} {} per window", chromosome, metric.label()),
            "Window",
            metric.label(),
            chromosome_color(chromosome),
            &points,
            None,
        )?;
        Ok(path)
    }

    fn histogram(&self, chromosome: &str, metric: Metric, table: &FrequencyTable) -> Result<PathBuf> {
        let path = self.target(chromosome, &format!("{}_hist.svg", metric.plot_stem()))?;
        let bars: Vec<(f64, u64)> = table.entries().iter().map(|e| (e.value, e.count)).collect();
        let width = bar_width(&bars);
        self.bars(
            &path,
            &format!("{} {}", chromosome, metric.label()),
            metric.label(),
            chromosome_color(chromosome),
            &bars,
            width,
        )?;
        Ok(path)
    }

    fn variant_scatter(&self, chromosome: &str, balances: &[VariantBalance]) -> Result<PathBuf> {
        let path = self.target(chromosome, "readbalance_scatter.svg")?;
        let points: Vec<(f64, f64)> = balances
            .iter()
            .map(|b| (b.position as f64, b.read_balance))
            .collect();
        self.scatter(
            &path,
            &format!("{} variant read balance", chromosome),
            "Position",
            "Read Balance",
            chromosome_color(chromosome),
            &points,
            Some(1.0),
        )?;
        Ok(path)
    }

    fn variant_histogram(&self, chromosome: &str, balances: &[VariantBalance]) -> Result<PathBuf> {
        let path = self.target(chromosome, "readbalance_variants_hist.svg")?;
        let bars = variant_bins(balances);
        self.bars(
            &path,
            &format!("{} variant read balance", chromosome),
            "Read Balance",
            chromosome_color(chromosome),
            &bars,
            1.0 / VARIANT_HIST_BINS as f64,
        )?;
        Ok(path)
    }
}

/// Smallest gap between neighbouring bins, or 1 for fewer than two bins.
fn bar_width(bars: &[(f64, u64)]) -> f64 {
    bars.windows(2)
        .map(|pair| pair[1].0 - pair[0].0)
        .filter(|gap| *gap > 0.0)
        .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
        .unwrap_or(1.0)
}

/// Count read balances into equal bins over `[0, 1]`; a balance of exactly 1 lands in the last bin.
fn variant_bins(balances: &[VariantBalance]) -> Vec<(f64, u64)> {
    let width = 1.0 / VARIANT_HIST_BINS as f64;
    let mut counts = vec![0u64; VARIANT_HIST_BINS];
    for balance in balances {
        let bin = (balance.read_balance.clamp(0.0, 1.0) / width + 1e-9) as usize;
        counts[bin.min(VARIANT_HIST_BINS - 1)] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .map(|(bin, count)| (bin as f64 * width, count))
        .collect()
}

/// Draw the window scatter and binned histogram of every metric.
pub fn render_traversal<S: PlotSink>(
    sink: &S,
    result: &TraversalResult,
    bins: &HistogramBins,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(2 * Metric::ALL.len());
    for metric in Metric::ALL {
        written.push(sink.windows(&result.chromosome, metric, &result.windows)?);
        let binned = result.frequency(metric).binned(bins.for_metric(metric));
        written.push(sink.histogram(&result.chromosome, metric, &binned)?);
        debug!("{}: plotted {}", result.chromosome, metric);
    }
    info!("{}: wrote {} plots", result.chromosome, written.len());
    Ok(written)
}
