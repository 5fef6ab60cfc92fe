//! Fixed-size window accumulation of site statistics.
//!
//! The aggregator owns three buffers of `window_size` slots (depth, read balance, mapping
//! quality). Every pushed column occupies the slot under the cursor, whether or not it passes
//! the thresholds, so failing slots keep the neutral `0.0` and pull the window mean down.
//!
//! A window is flushed once the cursor reaches `window_size - 1`. The last slot of each buffer
//! therefore always holds `0.0`, and a trailing window that never reaches the cursor limit is
//! never flushed. On flush the full buffers (all `window_size` slots) are averaged into a
//! [`WindowSummaryRow`] and folded, value by value, into the traversal-wide
//! [`FrequencyCounter`]s.

use super::site::SiteStats;
use crate::core::error::{Result, XyError};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Thresholds deciding which sites are recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum `total_depth` for depth and mapping quality to be recorded.
    pub min_depth: u32,
    /// Minimum minor-allele read count for read balance to be recorded.
    pub min_minor_depth: u32,
    /// Minimum minor-allele fraction for read balance to be recorded.
    pub min_minor_fraction: f64,
}

/// Replace non-finite values by the neutral `0.0` and fold `-0.0` into `0.0`.
#[inline]
fn neutral(value: f64) -> f64 {
    if value.is_finite() {
        value + 0.0
    } else {
        0.0
    }
}

#[inline]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    neutral(values.iter().sum::<f64>() / values.len() as f64)
}

/// Occurrence counts of observed metric values.
///
/// Values are keyed by their bit pattern after neutralisation, so `NaN` and `-0.0` both count
/// as `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyCounter {
    counts: FxHashMap<u64, u64>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, value: f64) {
        *self.counts.entry(neutral(value).to_bits()).or_insert(0) += 1;
    }

    pub fn extend(&mut self, values: &[f64]) {
        for &value in values {
            self.record(value);
        }
    }

    pub fn get(&self, value: f64) -> u64 {
        self.counts
            .get(&neutral(value).to_bits())
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// `(value, count)` pairs in ascending value order.
    pub fn sorted(&self) -> Vec<(f64, u64)> {
        let mut entries: Vec<(f64, u64)> = self
            .counts
            .iter()
            .map(|(&bits, &count)| (f64::from_bits(bits), count))
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        entries
    }
}

/// The three traversal-wide counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricCounters {
    pub depth: FrequencyCounter,
    pub readbal: FrequencyCounter,
    pub mapq: FrequencyCounter,
}

/// Mean of each metric over one flushed window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowSummaryRow {
    #[serde(rename = "WINDOW")]
    pub window_index: usize,
    #[serde(rename = "DEPTH")]
    pub mean_depth: f64,
    #[serde(rename = "READBAL")]
    pub mean_readbal: f64,
    #[serde(rename = "MAPQ")]
    pub mean_mapq: f64,
}

/// What happened in a window that was just flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFlush {
    pub window_index: usize,
    /// Columns whose depth reached `min_depth`.
    pub passed_depth: usize,
    /// Columns that also passed both minor-allele thresholds.
    pub passed_minor: usize,
}

#[derive(Debug)]
pub struct WindowAggregator {
    window_size: usize,
    thresholds: Thresholds,
    depths: Vec<f64>,
    readbals: Vec<f64>,
    mapqs: Vec<f64>,
    cursor: usize,
    window_index: usize,
    passed_depth: usize,
    passed_minor: usize,
    rows: Vec<WindowSummaryRow>,
    counters: MetricCounters,
}

impl WindowAggregator {
    /// Create an aggregator; `window_size` must be at least 2 for any window to flush.
    pub fn new(window_size: usize, thresholds: Thresholds) -> Result<Self> {
        if window_size < 2 {
            return Err(XyError::InvalidInput(format!(
                "window_size must be at least 2, got {}",
                window_size
            )));
        }
        Ok(Self {
            window_size,
            thresholds,
            depths: vec![0.0; window_size],
            readbals: vec![0.0; window_size],
            mapqs: vec![0.0; window_size],
            cursor: 0,
            window_index: 0,
            passed_depth: 0,
            passed_minor: 0,
            rows: Vec::new(),
            counters: MetricCounters::default(),
        })
    }

    /// Record one site at the current slot and advance the cursor, flushing when the window
    /// limit is reached.
    pub fn push(&mut self, site: &SiteStats) -> Option<WindowFlush> {
        if site.total_depth >= self.thresholds.min_depth {
            self.depths[self.cursor] = f64::from(site.total_depth);
            self.mapqs[self.cursor] = neutral(site.mean_mapq.unwrap_or(0.0));
            self.passed_depth += 1;

            if let Some(fraction) = site.allele_fraction() {
                if site.num_minor >= self.thresholds.min_minor_depth
                    && fraction >= self.thresholds.min_minor_fraction
                {
                    self.readbals[self.cursor] = fraction;
                    self.passed_minor += 1;
                }
            }
        }

        self.cursor += 1;
        if self.cursor == self.window_size - 1 {
            Some(self.flush())
        } else {
            None
        }
    }

    fn flush(&mut self) -> WindowFlush {
        self.rows.push(WindowSummaryRow {
            window_index: self.window_index,
            mean_depth: mean(&self.depths),
            mean_readbal: mean(&self.readbals),
            mean_mapq: mean(&self.mapqs),
        });

        self.counters.depth.extend(&self.depths);
        self.counters.readbal.extend(&self.readbals);
        self.counters.mapq.extend(&self.mapqs);

        let flushed = WindowFlush {
            window_index: self.window_index,
            passed_depth: self.passed_depth,
            passed_minor: self.passed_minor,
        };

        self.depths.fill(0.0);
        self.readbals.fill(0.0);
        self.mapqs.fill(0.0);
        self.cursor = 0;
        self.passed_depth = 0;
        self.passed_minor = 0;
        self.window_index += 1;

        flushed
    }

    /// Columns pushed into the current, not yet flushed window.
    pub fn pending(&self) -> usize {
        self.cursor
    }

    pub fn windows_flushed(&self) -> usize {
        self.window_index
    }

    /// Consume the aggregator; a partially filled window is discarded.
    pub fn finish(self) -> (Vec<WindowSummaryRow>, MetricCounters) {
        (self.rows, self.counters)
    }
}
