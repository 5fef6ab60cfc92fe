pub mod common;
pub mod variants;
pub mod windows;

/// Chromosomes scanned when `--chromosomes` is not given: both sex chromosomes plus an autosome
/// of similar size to chrX as a diploid baseline.
pub const DEFAULT_CHROMOSOMES: &str = "chrX,chrY,chr19";

pub use variants::{run_variants, VariantsArgs};
pub use windows::{run_windows, WindowsArgs};
