//! XYSCAN: windowed pileup scans of sex chromosomes
//!
//! The library walks the pileup of selected chromosomes in an indexed BAM, summarises every
//! column as depth, read balance and mapping quality, and folds those values into fixed-size
//! windows and whole-chromosome frequency tables. Differences between chrX, chrY and an
//! autosome in these tables are what sex-chromosome checks are built on.
//!
//! # Modules
//!
//! - [`engine`]: alignment sources, per-site statistics, window aggregation and traversal
//! - [`report`]: result tables, TSV writers and SVG plots
//! - [`variants`]: external variant calling and the read balance of its calls
//! - [`core`]: errors, file helpers, writers and thread pools
//! - [`utils`]: re-exports of the most used helpers

pub mod core;
pub mod engine;
pub mod report;
pub mod utils;
pub mod variants;
