mod args;

use anyhow::{bail, Result};
use log::{info, warn};
use xyscan_lib::engine::pileup::htslib::DEFAULT_MAX_DEPTH;
use xyscan_lib::report::plot::{PlotSink, SvgPlotter};
use xyscan_lib::report::writer::ReportWriter;
use xyscan_lib::utils;
use xyscan_lib::variants::{parse_caller_output, PlatypusCaller, VariantBalance};

use crate::commands::common;

pub use args::{VariantsArgs, VariantsConfig};

/// Execute the `variants` command end-to-end.
pub fn run_variants(args: VariantsArgs) -> Result<()> {
    let config: VariantsConfig = args.into();
    config.validate()?;
    common::prepare_output_dir(&config.output)?;

    let calls = match (&config.vcf, &config.bam, &config.reference) {
        (Some(vcf), _, _) => {
            info!("Reusing variant calls from {:?}", vcf);
            vcf.clone()
        }
        (None, Some(bam), Some(reference)) => {
            common::check_chromosomes(bam, &config.chromosomes, DEFAULT_MAX_DEPTH)?;
            let threads = utils::determine_allowed_cpus(config.threads)?;
            let caller = PlatypusCaller::new(
                bam,
                reference,
                &config.chromosomes,
                threads,
                config.caller_output(),
            )
            .with_program(&config.caller);
            if !caller.call() {
                bail!("Variant caller '{}' did not complete successfully", config.caller);
            }
            caller.output().to_path_buf()
        }
        // validate() guarantees bam and reference whenever no calls are supplied
        _ => bail!("--bam and --ref are required unless --vcf is given"),
    };

    let balances = parse_caller_output(&calls, config.qual_cutoff)?;
    info!("{} calls pass QUAL >= {}", balances.len(), config.qual_cutoff);

    let writer = ReportWriter::new(&config.output, false);
    let plotter = SvgPlotter::new(&config.output);
    for chromosome in &config.chromosomes {
        let subset: Vec<VariantBalance> = balances
            .iter()
            .filter(|b| b.chromosome.as_str() == chromosome.as_str())
            .cloned()
            .collect();
        if subset.is_empty() {
            warn!("{}: no variant calls passed the filters", chromosome);
        }
        writer.write_variants(chromosome, &subset)?;
        if config.plots {
            plotter.variant_scatter(chromosome, &subset)?;
            plotter.variant_histogram(chromosome, &subset)?;
        }
        info!("{}: {} calls summarised", chromosome, subset.len());
    }

    info!("Variants complete -> {:?}", config.output);
    Ok(())
}
