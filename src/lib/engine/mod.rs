//! Pileup traversal and windowed aggregation.
//!
//! Data flows leaves first: a [`pileup::AlignmentSource`] yields columns, [`site::SiteStats`]
//! summarises each column, the [`window::WindowAggregator`] folds sites into windows and
//! frequency counters, and [`traverse::traverse`] drives the whole pass.

pub mod pileup;
pub mod site;
pub mod traverse;
pub mod window;

pub use pileup::{AlignmentSource, Chromosome, HtslibSource, InMemorySource, PileupColumn};
pub use site::SiteStats;
pub use traverse::{
    traverse, traverse_all, LogProgress, NoProgress, ProgressObserver, TraversalParams,
    WindowProgress,
};
pub use window::{FrequencyCounter, MetricCounters, Thresholds, WindowAggregator, WindowSummaryRow};
