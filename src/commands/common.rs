use anyhow::{bail, Context, Result};
use log::info;
use std::fs;
use std::path::Path;
use xyscan_lib::core::error::XyError;
use xyscan_lib::engine::pileup::lookup_chromosome;
use xyscan_lib::engine::HtslibSource;

/// Fail early when a required input file is missing.
pub fn require_file(path: &Path, what: &str) -> std::result::Result<(), XyError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(XyError::FileNotFound(format!("{} {}", what, path.display())))
    }
}

/// Reject an empty chromosome selection.
pub fn require_chromosomes(chromosomes: &[String]) -> std::result::Result<(), XyError> {
    if chromosomes.is_empty() || chromosomes.iter().any(|c| c.trim().is_empty()) {
        return Err(XyError::InvalidInput(
            "at least one non-empty chromosome name is required".to_string(),
        ));
    }
    Ok(())
}

/// Check every requested chromosome against the alignment header.
pub fn check_chromosomes(bam: &Path, chromosomes: &[String], max_depth: u32) -> Result<()> {
    let source = HtslibSource::from_path(bam, max_depth)
        .with_context(|| format!("Failed to open {}", bam.display()))?;
    for name in chromosomes {
        let chromosome = lookup_chromosome(&source, name)?;
        info!("{}: {} bp", chromosome.name, chromosome.length);
    }
    Ok(())
}

/// Create the output directory, refusing to write into an existing regular file.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.is_file() {
        bail!("Output {} exists and is not a directory", dir.display());
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(())
}
