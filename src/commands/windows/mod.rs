mod args;

use anyhow::{Context, Result};
use log::info;
use xyscan_lib::engine::{traverse_all, HtslibSource};
use xyscan_lib::report::plot::{render_traversal, SvgPlotter};
use xyscan_lib::report::writer::ReportWriter;
use xyscan_lib::utils;

use crate::commands::common;

pub use args::{WindowsArgs, WindowsConfig};

/// Execute the `windows` command end-to-end.
pub fn run_windows(args: WindowsArgs) -> Result<()> {
    let config: WindowsConfig = args.into();
    config.validate()?;

    info!(
        "Running xyscan windows on {:?} ({})",
        config.bam,
        config.chromosomes.join(",")
    );
    let threads = utils::determine_allowed_cpus(config.threads)?;
    common::prepare_output_dir(&config.output)?;

    let bam = config.bam.clone();
    let max_depth = config.max_depth;
    let results = traverse_all(
        || HtslibSource::from_path(&bam, max_depth),
        &config.chromosomes,
        &config.params,
        threads,
    )
    .with_context(|| format!("Failed to scan {}", config.bam.display()))?;

    let writer = ReportWriter::new(&config.output, config.gzip);
    let plotter = SvgPlotter::new(&config.output);
    for result in &results {
        writer.write(result)?;
        if config.plots {
            render_traversal(&plotter, result, &config.bins)?;
        }
    }

    info!("Windows complete -> {:?}", config.output);
    Ok(())
}
