use crate::core::error::{Result, XyError};
use log::{error, warn};

/// Validate and normalize a requested CPU count.
pub fn determine_allowed_cpus(desired: usize) -> Result<usize> {
    if desired == 0 {
        error!("Must select > 0 threads");
        Err(XyError::InvalidInput(
            "threads must be greater than 0".to_string(),
        ))
    } else if desired > num_cpus::get() {
        warn!(
            "Specified more threads than are available, using {}",
            desired
        );
        Ok(desired)
    } else {
        Ok(desired)
    }
}

/// Build a dedicated Rayon pool with a validated worker count.
pub fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    let cpus = determine_allowed_cpus(threads)?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(cpus)
        .build()
        .map_err(|e| XyError::InvalidInput(format!("Failed to build thread pool: {}", e)))
}
