use crate::commands::{common, DEFAULT_CHROMOSOMES};
use std::path::PathBuf;
use structopt::StructOpt;
use xyscan_lib::core::error::XyError;
use xyscan_lib::variants::DEFAULT_CALLER;

/// CLI arguments for the `variants` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "variants")]
pub struct VariantsArgs {
    /// Input indexed BAM to call variants on. Required unless `--vcf` is given.
    #[structopt(long)]
    pub bam: Option<PathBuf>,

    /// Reference FASTA the BAM was aligned to. Required unless `--vcf` is given.
    #[structopt(long = "ref")]
    pub reference: Option<PathBuf>,

    /// Comma-separated chromosomes to call and summarise.
    #[structopt(long, short = "c", use_delimiter = true, default_value = DEFAULT_CHROMOSOMES)]
    pub chromosomes: Vec<String>,

    /// Threads handed to the variant caller.
    #[structopt(long, short = "t", default_value = "1")]
    pub threads: usize,

    /// Output directory; one subdirectory is written per chromosome.
    #[structopt(long, short = "o")]
    pub output: PathBuf,

    /// Variant caller executable.
    #[structopt(long, default_value = DEFAULT_CALLER)]
    pub caller: String,

    /// Existing caller output to summarise instead of calling variants.
    #[structopt(long)]
    pub vcf: Option<PathBuf>,

    /// Minimum QUAL for a call to be summarised.
    #[structopt(long, default_value = "30")]
    pub qual_cutoff: f64,

    /// Write tables only.
    #[structopt(long)]
    pub no_plots: bool,
}

/// Normalised configuration derived from [`VariantsArgs`].
#[derive(Debug, Clone)]
pub struct VariantsConfig {
    pub bam: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub chromosomes: Vec<String>,
    pub threads: usize,
    pub output: PathBuf,
    pub caller: String,
    pub vcf: Option<PathBuf>,
    pub qual_cutoff: f64,
    pub plots: bool,
}

impl From<VariantsArgs> for VariantsConfig {
    fn from(args: VariantsArgs) -> VariantsConfig {
        VariantsConfig {
            bam: args.bam,
            reference: args.reference,
            chromosomes: args
                .chromosomes
                .into_iter()
                .map(|c| c.trim().to_string())
                .collect(),
            threads: args.threads,
            output: args.output,
            caller: args.caller,
            vcf: args.vcf,
            qual_cutoff: args.qual_cutoff,
            plots: !args.no_plots,
        }
    }
}

impl VariantsConfig {
    /// Path the caller writes to when variants are called rather than reused.
    pub fn caller_output(&self) -> PathBuf {
        self.output.join("variants.vcf")
    }

    #[inline]
    pub fn calls_variants(&self) -> bool {
        self.vcf.is_none()
    }

    pub fn validate(&self) -> Result<(), XyError> {
        common::require_chromosomes(&self.chromosomes)?;
        if !self.qual_cutoff.is_finite() {
            return Err(XyError::InvalidInput(
                "qual_cutoff must be a finite number".to_string(),
            ));
        }
        match &self.vcf {
            Some(vcf) => common::require_file(vcf, "caller output"),
            None => {
                let bam = self.bam.as_ref().ok_or_else(|| {
                    XyError::InvalidInput("--bam is required unless --vcf is given".to_string())
                })?;
                let reference = self.reference.as_ref().ok_or_else(|| {
                    XyError::InvalidInput("--ref is required unless --vcf is given".to_string())
                })?;
                common::require_file(bam, "alignment file")?;
                common::require_file(reference, "reference")
            }
        }
    }
}
