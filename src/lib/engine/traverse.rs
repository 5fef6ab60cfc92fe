//! Single-pass, per-chromosome traversal driver.
//!
//! [`traverse`] streams the pileup of one chromosome in position order, derives
//! [`SiteStats`] for every column and feeds them into a [`WindowAggregator`] that it owns for
//! the duration of the call. Nothing is shared between traversals, which is what lets
//! [`traverse_all`] fan chromosomes out across a Rayon pool.

use super::pileup::{lookup_chromosome, AlignmentSource};
use super::site::SiteStats;
use super::window::{Thresholds, WindowAggregator};
use crate::core::concurrency::build_pool;
use crate::core::error::{Result, XyError};
use crate::report::{self, TraversalResult};
use log::*;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use std::convert::TryFrom;

pub const DEFAULT_WINDOW_SIZE: usize = 50_000;
pub const DEFAULT_MIN_DEPTH: u32 = 2;
pub const DEFAULT_MIN_MINOR_DEPTH: u32 = 1;
pub const DEFAULT_MIN_MINOR_FRACTION: f64 = 0.1;

/// String forms of the defaults, for CLI `default_value`s.
pub static WINDOW_SIZE_STR: Lazy<String> = Lazy::new(|| DEFAULT_WINDOW_SIZE.to_string());
pub static MIN_DEPTH_STR: Lazy<String> = Lazy::new(|| DEFAULT_MIN_DEPTH.to_string());
pub static MIN_MINOR_DEPTH_STR: Lazy<String> = Lazy::new(|| DEFAULT_MIN_MINOR_DEPTH.to_string());
pub static MIN_MINOR_FRACTION_STR: Lazy<String> =
    Lazy::new(|| DEFAULT_MIN_MINOR_FRACTION.to_string());

/// Window size and site thresholds of one traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalParams {
    pub window_size: usize,
    pub min_depth: u32,
    pub min_minor_depth: u32,
    pub min_minor_fraction: f64,
}

impl Default for TraversalParams {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_depth: DEFAULT_MIN_DEPTH,
            min_minor_depth: DEFAULT_MIN_MINOR_DEPTH,
            min_minor_fraction: DEFAULT_MIN_MINOR_FRACTION,
        }
    }
}

impl TraversalParams {
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 2 {
            return Err(XyError::InvalidInput(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        if !self.min_minor_fraction.is_finite() {
            return Err(XyError::InvalidInput(
                "min_minor_fraction must be a finite number".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_minor_fraction) {
            return Err(XyError::ThresholdValidation {
                field: "min_minor_fraction".to_string(),
                min: 0.0,
                max: 1.0,
                value: self.min_minor_fraction,
            });
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_depth: self.min_depth,
            min_minor_depth: self.min_minor_depth,
            min_minor_fraction: self.min_minor_fraction,
        }
    }
}

/// Progress observation emitted after every window flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowProgress<'a> {
    pub chromosome: &'a str,
    pub passed_depth: usize,
    pub passed_minor: usize,
    pub window_size: usize,
    pub windows_done: usize,
    pub num_windows: usize,
}

/// Receives progress observations; purely a side channel.
pub trait ProgressObserver {
    fn window_flushed(&mut self, progress: &WindowProgress<'_>);
}

/// Discards all observations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn window_flushed(&mut self, _progress: &WindowProgress<'_>) {}
}

/// Logs every window at `debug` and roughly every tenth of the chromosome at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn window_flushed(&mut self, p: &WindowProgress<'_>) {
        debug!(
            "{}: {} out of {} positions passed depth threshold.",
            p.chromosome, p.passed_depth, p.window_size
        );
        debug!(
            "{}: {} out of {} positions passed minor allele thresholds.",
            p.chromosome, p.passed_minor, p.window_size
        );

        let log_step = std::cmp::max(1, p.num_windows / 10);
        if p.windows_done % log_step == 0 || p.windows_done == p.num_windows {
            let percent = (p.windows_done as f64 / p.num_windows as f64) * 100.0;
            info!(
                "{}: {} out of {} windows processed ({:.1}%)",
                p.chromosome, p.windows_done, p.num_windows, percent
            );
        }
    }
}

/// Traverse one chromosome and summarise it into windows and frequency tables.
///
/// An unknown chromosome fails before any column is read. The pileup is consumed exactly once;
/// columns past the last full window are dropped.
pub fn traverse<S, O>(
    source: &mut S,
    chromosome: &str,
    params: &TraversalParams,
    observer: &mut O,
) -> Result<TraversalResult>
where
    S: AlignmentSource + ?Sized,
    O: ProgressObserver + ?Sized,
{
    params.validate()?;
    let chrom = lookup_chromosome(&*source, chromosome)?;
    let length = u32::try_from(chrom.length).map_err(|_| {
        XyError::InvalidInput(format!(
            "Chromosome {} is too long ({} bp)",
            chrom.name, chrom.length
        ))
    })?;
    let num_windows = length as usize / params.window_size + 1;
    info!(
        "Traversing {} ({} bp) in windows of {} columns",
        chrom.name, length, params.window_size
    );

    let mut aggregator = WindowAggregator::new(params.window_size, params.thresholds())?;
    for column in source.pileup(&chrom.name, 0, length)? {
        let column = column?;
        let site = SiteStats::from_column(&column);
        if let Some(flush) = aggregator.push(&site) {
            observer.window_flushed(&WindowProgress {
                chromosome: &chrom.name,
                passed_depth: flush.passed_depth,
                passed_minor: flush.passed_minor,
                window_size: params.window_size,
                windows_done: flush.window_index + 1,
                num_windows,
            });
        }
    }

    if aggregator.pending() > 0 {
        debug!(
            "{}: dropping {} columns of the unfinished final window",
            chrom.name,
            aggregator.pending()
        );
    }

    let (rows, counters) = aggregator.finish();
    info!("{}: {} windows summarised", chrom.name, rows.len());
    Ok(report::assemble(&chrom.name, rows, counters))
}

/// Traverse several chromosomes independently on a pool of `threads` workers.
///
/// `open_source` is called once up front to check every name against the header, then once
/// per chromosome so each traversal owns its reader. Results keep the input order.
pub fn traverse_all<S, F>(
    open_source: F,
    chromosomes: &[String],
    params: &TraversalParams,
    threads: usize,
) -> Result<Vec<TraversalResult>>
where
    S: AlignmentSource,
    F: Fn() -> Result<S> + Sync,
{
    params.validate()?;
    {
        let probe = open_source()?;
        for name in chromosomes {
            lookup_chromosome(&probe, name)?;
        }
    }

    let pool = build_pool(threads)?;
    pool.install(|| {
        chromosomes
            .par_iter()
            .map(|name| {
                let mut source = open_source()?;
                traverse(&mut source, name, params, &mut LogProgress)
            })
            .collect::<Result<Vec<_>>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pileup::{InMemorySource, PileupColumn};
    use crate::report::Metric;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(usize, usize, usize, usize)>,
    }

    impl ProgressObserver for Recorder {
        fn window_flushed(&mut self, p: &WindowProgress<'_>) {
            self.seen
                .push((p.windows_done, p.num_windows, p.passed_depth, p.passed_minor));
        }
    }

    fn column_with_depth(pos: u32, major: usize, minor: usize) -> PileupColumn {
        let mut reads = vec![(b'A', 60u8); major];
        reads.extend(std::iter::repeat((b'G', 20u8)).take(minor));
        PileupColumn::from_bases(pos, &reads)
    }

    fn params(window_size: usize, min_depth: u32) -> TraversalParams {
        TraversalParams {
            window_size,
            min_depth,
            min_minor_depth: 1,
            min_minor_fraction: 0.1,
        }
    }

    #[test]
    fn early_flush_boundary() {
        let mut source = InMemorySource::new().with_chromosome(
            "chrX",
            3,
            vec![
                column_with_depth(0, 5, 0),
                PileupColumn::new(1),
                column_with_depth(2, 3, 0),
            ],
        );
        let mut recorder = Recorder::default();
        let result = traverse(&mut source, "chrX", &params(3, 1), &mut recorder).unwrap();

        assert_eq!(result.windows.len(), 1);
        assert_eq!(result.windows[0].window_index, 0);
        assert!((result.windows[0].mean_depth - 5.0 / 3.0).abs() < 1e-12);
        // 3 / 3 + 1 windows expected by the header length
        assert_eq!(recorder.seen, vec![(1, 2, 1, 0)]);
        assert_eq!(result.frequency(Metric::Depth).count_of(3.0), 0);
    }

    #[test]
    fn windows_are_contiguous_and_ordered() {
        let columns: Vec<PileupColumn> = (0..25).map(|pos| column_with_depth(pos, 8, 2)).collect();
        let mut source = InMemorySource::new().with_chromosome("chrY", 25, columns);
        let mut recorder = Recorder::default();
        let result = traverse(&mut source, "chrY", &params(5, 2), &mut recorder).unwrap();

        let indices: Vec<usize> = result.windows.iter().map(|r| r.window_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(recorder.seen.iter().all(|s| s.2 == 4 && s.3 == 4));
        for row in &result.windows {
            assert!((row.mean_depth - 40.0 / 5.0).abs() < 1e-12);
            assert!((row.mean_readbal - 0.8 / 5.0).abs() < 1e-12);
            assert!((row.mean_mapq - 4.0 * 52.0 / 5.0).abs() < 1e-9);
        }
        assert_eq!(result.frequency(Metric::Depth).count_of(10.0), 24);
        assert_eq!(result.frequency(Metric::Depth).count_of(0.0), 6);
    }

    #[test]
    fn unknown_chromosome_fails_before_traversal() {
        let mut source = InMemorySource::new().with_chromosome("chrX", 10, Vec::new());
        let err = traverse(&mut source, "chr7", &params(3, 1), &mut NoProgress).unwrap_err();
        assert!(matches!(err, XyError::UnknownChromosome(name) if name == "chr7"));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut source = InMemorySource::new().with_chromosome("chrX", 10, Vec::new());
        assert!(traverse(&mut source, "chrX", &params(1, 1), &mut NoProgress).is_err());

        let bad_fraction = TraversalParams {
            min_minor_fraction: 1.5,
            ..TraversalParams::default()
        };
        assert!(matches!(
            bad_fraction.validate(),
            Err(XyError::ThresholdValidation { .. })
        ));
    }

    #[test]
    fn empty_pileup_yields_empty_tables() {
        let mut source = InMemorySource::new().with_chromosome("chr19", 1000, Vec::new());
        let result = traverse(&mut source, "chr19", &params(10, 2), &mut NoProgress).unwrap();
        assert!(result.windows.is_empty());
        for metric in Metric::ALL {
            assert!(result.frequency(metric).is_empty());
        }
    }

    #[test]
    fn traverse_all_keeps_input_order() {
        let build = || {
            Ok(InMemorySource::new()
                .with_chromosome(
                    "chrX",
                    6,
                    (0..6).map(|pos| column_with_depth(pos, 2, 0)).collect(),
                )
                .with_chromosome(
                    "chrY",
                    6,
                    (0..6).map(|pos| column_with_depth(pos, 6, 0)).collect(),
                ))
        };
        let names = vec!["chrY".to_string(), "chrX".to_string()];
        let results = traverse_all(build, &names, &params(3, 1), 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chromosome, "chrY");
        assert_eq!(results[1].chromosome, "chrX");
        // two columns of depth 6 over a three slot buffer
        assert!((results[0].windows[0].mean_depth - 4.0).abs() < 1e-12);
        assert_eq!(results[1].windows.len(), 3);
    }

    #[test]
    fn traverse_all_checks_names_first() {
        let build = || Ok(InMemorySource::new().with_chromosome("chrX", 6, Vec::new()));
        let names = vec!["chrX".to_string(), "chrQ".to_string()];
        assert!(matches!(
            traverse_all(build, &names, &params(3, 1), 1),
            Err(XyError::UnknownChromosome(_))
        ));
    }
}
