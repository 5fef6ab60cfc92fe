use crate::commands::{common, DEFAULT_CHROMOSOMES};
use std::path::PathBuf;
use structopt::StructOpt;
use xyscan_lib::core::error::XyError;
use xyscan_lib::engine::traverse::{
    TraversalParams, MIN_DEPTH_STR, MIN_MINOR_DEPTH_STR, MIN_MINOR_FRACTION_STR, WINDOW_SIZE_STR,
};
use xyscan_lib::report::HistogramBins;

/// CLI arguments for the `windows` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "windows")]
pub struct WindowsArgs {
    /// Input indexed BAM/CRAM to scan.
    #[structopt(long)]
    pub bam: PathBuf,

    /// Comma-separated chromosomes to scan, as named in the BAM header.
    #[structopt(long, short = "c", use_delimiter = true, default_value = DEFAULT_CHROMOSOMES)]
    pub chromosomes: Vec<String>,

    /// Pileup columns per window (at least 2).
    #[structopt(long, short = "w", default_value = WINDOW_SIZE_STR.as_str())]
    pub window_size: usize,

    /// Minimum depth for a site to contribute depth and mapping quality.
    #[structopt(long, short = "d", default_value = MIN_DEPTH_STR.as_str())]
    pub min_depth: u32,

    /// Minimum minor-allele read count for a site to contribute read balance.
    #[structopt(long, default_value = MIN_MINOR_DEPTH_STR.as_str())]
    pub min_minor_depth: u32,

    /// Minimum minor-allele fraction for a site to contribute read balance.
    #[structopt(long, default_value = MIN_MINOR_FRACTION_STR.as_str())]
    pub min_minor_fraction: f64,

    /// Maximum pileup depth inspected per site.
    #[structopt(long, short = "D", default_value = "8000")]
    pub max_depth: u32,

    /// Number of chromosomes scanned in parallel.
    #[structopt(long, short = "t", default_value = "1")]
    pub threads: usize,

    /// Output directory; one subdirectory is written per chromosome.
    #[structopt(long, short = "o")]
    pub output: PathBuf,

    /// Write tables only.
    #[structopt(long)]
    pub no_plots: bool,

    /// BGZF-compress the tables.
    #[structopt(long)]
    pub gzip: bool,

    /// Depth histogram bin width.
    #[structopt(long, default_value = "10")]
    pub depth_bin_size: f64,

    /// Read balance histogram bin width.
    #[structopt(long, default_value = "0.05")]
    pub readbal_bin_size: f64,
}

/// Normalised configuration derived from [`WindowsArgs`].
#[derive(Debug, Clone)]
pub struct WindowsConfig {
    pub bam: PathBuf,
    pub chromosomes: Vec<String>,
    pub params: TraversalParams,
    pub max_depth: u32,
    pub threads: usize,
    pub output: PathBuf,
    pub plots: bool,
    pub gzip: bool,
    pub bins: HistogramBins,
}

impl From<WindowsArgs> for WindowsConfig {
    fn from(args: WindowsArgs) -> WindowsConfig {
        WindowsConfig {
            bam: args.bam,
            chromosomes: args
                .chromosomes
                .into_iter()
                .map(|c| c.trim().to_string())
                .collect(),
            params: TraversalParams {
                window_size: args.window_size,
                min_depth: args.min_depth,
                min_minor_depth: args.min_minor_depth,
                min_minor_fraction: args.min_minor_fraction,
            },
            max_depth: args.max_depth,
            threads: args.threads,
            output: args.output,
            plots: !args.no_plots,
            gzip: args.gzip,
            bins: HistogramBins {
                depth: args.depth_bin_size,
                readbal: args.readbal_bin_size,
                ..HistogramBins::default()
            },
        }
    }
}

impl WindowsConfig {
    /// Reject configurations that would fail or mislead once traversal starts.
    pub fn validate(&self) -> Result<(), XyError> {
        common::require_file(&self.bam, "alignment file")?;
        common::require_chromosomes(&self.chromosomes)?;
        self.params.validate()?;
        if self.max_depth == 0 {
            return Err(XyError::InvalidInput(
                "max_depth must be greater than 0".to_string(),
            ));
        }
        for (field, value) in [
            ("depth_bin_size", self.bins.depth),
            ("readbal_bin_size", self.bins.readbal),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(XyError::InvalidInput(format!(
                    "{} must be a positive number, got {}",
                    field, value
                )));
            }
        }
        Ok(())
    }
}
