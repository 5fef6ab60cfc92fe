//! Tabular traversal results.
//!
//! [`assemble`] turns the rows and counters left behind by a traversal into a
//! [`TraversalResult`]: one window table with `depth`, `readbal` and `mapq` columns, and one
//! value → frequency table per [`Metric`]. The [`writer`] and [`plot`] modules render those
//! tables to TSV and SVG.

pub mod plot;
pub mod writer;

use crate::engine::window::{FrequencyCounter, MetricCounters, WindowSummaryRow};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A per-site metric tracked by the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Depth,
    ReadBalance,
    MappingQuality,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Depth, Metric::ReadBalance, Metric::MappingQuality];

    /// Column and table name.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Depth => "depth",
            Metric::ReadBalance => "readbal",
            Metric::MappingQuality => "mapq",
        }
    }

    /// Stem used for plot file names.
    pub fn plot_stem(&self) -> &'static str {
        match self {
            Metric::Depth => "depth",
            Metric::ReadBalance => "readbalance",
            Metric::MappingQuality => "mapq",
        }
    }

    /// Axis label.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Depth => "Depth",
            Metric::ReadBalance => "Read Balance",
            Metric::MappingQuality => "Mapping Quality",
        }
    }

    /// The column of a window row that holds this metric.
    pub fn window_value(&self, row: &WindowSummaryRow) -> f64 {
        match self {
            Metric::Depth => row.mean_depth,
            Metric::ReadBalance => row.mean_readbal,
            Metric::MappingQuality => row.mean_mapq,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FrequencyEntry {
    pub value: f64,
    pub count: u64,
}

/// Value → frequency table in ascending value order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    pub fn from_counter(counter: &FrequencyCounter) -> Self {
        Self {
            entries: counter
                .sorted()
                .into_iter()
                .map(|(value, count)| FrequencyEntry { value, count })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn count_of(&self, value: f64) -> u64 {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map_or(0, |e| e.count)
    }

    /// Fold values into bins of `bin_size`; each bin is labelled by its lower edge.
    ///
    /// A non-positive or non-finite `bin_size` returns the table unchanged.
    pub fn binned(&self, bin_size: f64) -> FrequencyTable {
        if !(bin_size.is_finite() && bin_size > 0.0) {
            return self.clone();
        }
        let mut bins: BTreeMap<i64, u64> = BTreeMap::new();
        for entry in &self.entries {
            // nudge exact multiples such as 0.15 / 0.05 past representation error
            let bin = (entry.value / bin_size + 1e-9).floor() as i64;
            *bins.entry(bin).or_insert(0) += entry.count;
        }
        FrequencyTable {
            entries: bins
                .into_iter()
                .map(|(bin, count)| FrequencyEntry {
                    value: bin as f64 * bin_size,
                    count,
                })
                .collect(),
        }
    }
}

/// Histogram bin widths used when plotting frequency tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBins {
    pub depth: f64,
    pub readbal: f64,
    pub mapq: f64,
}

impl Default for HistogramBins {
    fn default() -> Self {
        Self {
            depth: 10.0,
            readbal: 0.05,
            mapq: 1.0,
        }
    }
}

impl HistogramBins {
    pub fn for_metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Depth => self.depth,
            Metric::ReadBalance => self.readbal,
            Metric::MappingQuality => self.mapq,
        }
    }
}

/// Everything one chromosome traversal produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalResult {
    pub chromosome: String,
    /// One row per flushed window, in genomic order.
    pub windows: Vec<WindowSummaryRow>,
    pub depth_freq: FrequencyTable,
    pub readbal_freq: FrequencyTable,
    pub mapq_freq: FrequencyTable,
}

impl TraversalResult {
    pub fn frequency(&self, metric: Metric) -> &FrequencyTable {
        match metric {
            Metric::Depth => &self.depth_freq,
            Metric::ReadBalance => &self.readbal_freq,
            Metric::MappingQuality => &self.mapq_freq,
        }
    }

    /// The per-window means of one metric.
    pub fn window_column(&self, metric: Metric) -> Vec<f64> {
        self.windows.iter().map(|row| metric.window_value(row)).collect()
    }
}

/// Build the tabular result of a traversal. Empty inputs give empty tables.
pub fn assemble(
    chromosome: &str,
    rows: Vec<WindowSummaryRow>,
    counters: MetricCounters,
) -> TraversalResult {
    TraversalResult {
        chromosome: chromosome.to_string(),
        windows: rows,
        depth_freq: FrequencyTable::from_counter(&counters.depth),
        readbal_freq: FrequencyTable::from_counter(&counters.readbal),
        mapq_freq: FrequencyTable::from_counter(&counters.mapq),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_assemble_to_empty_tables() {
        let result = assemble("chrX", Vec::new(), MetricCounters::default());
        assert_eq!(result.chromosome, "chrX");
        assert!(result.windows.is_empty());
        for metric in Metric::ALL {
            assert!(result.frequency(metric).is_empty());
            assert!(result.window_column(metric).is_empty());
        }
    }

    #[test]
    fn tables_are_sorted_by_value() {
        let mut counters = MetricCounters::default();
        counters.mapq.extend(&[60.0, 0.0, 37.5, 60.0]);
        let rows = vec![WindowSummaryRow {
            window_index: 0,
            mean_depth: 12.0,
            mean_readbal: 0.25,
            mean_mapq: 39.375,
        }];
        let result = assemble("chrY", rows, counters);

        let values: Vec<(f64, u64)> = result
            .frequency(Metric::MappingQuality)
            .entries()
            .iter()
            .map(|e| (e.value, e.count))
            .collect();
        assert_eq!(values, vec![(0.0, 1), (37.5, 1), (60.0, 2)]);
        assert_eq!(result.window_column(Metric::ReadBalance), vec![0.25]);
    }

    #[test]
    fn binning_merges_by_lower_edge() {
        let mut counter = FrequencyCounter::new();
        counter.extend(&[0.0, 3.0, 9.0, 10.0, 14.0, 27.0]);
        let binned = FrequencyTable::from_counter(&counter).binned(10.0);
        let values: Vec<(f64, u64)> = binned.entries().iter().map(|e| (e.value, e.count)).collect();
        assert_eq!(values, vec![(0.0, 3), (10.0, 2), (20.0, 1)]);
        assert_eq!(binned.total(), 6);

        let mut balances = FrequencyCounter::new();
        balances.extend(&[0.15, 0.16, 0.5]);
        let binned = FrequencyTable::from_counter(&balances).binned(0.05);
        let counts: Vec<u64> = binned.entries().iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert!((binned.entries()[0].value - 0.15).abs() < 1e-12);
    }

    #[test]
    fn degenerate_bin_size_is_identity() {
        let mut counter = FrequencyCounter::new();
        counter.extend(&[0.1, 0.2]);
        let table = FrequencyTable::from_counter(&counter);
        assert_eq!(table.binned(0.0), table);
        assert_eq!(table.binned(f64::NAN), table);
    }

    #[test]
    fn metric_names_follow_file_conventions() {
        assert_eq!(Metric::ReadBalance.name(), "readbal");
        assert_eq!(Metric::ReadBalance.plot_stem(), "readbalance");
        assert_eq!(Metric::MappingQuality.to_string(), "mapq");
    }
}
