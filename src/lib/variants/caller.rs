use itertools::Itertools;
use log::{info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Program name used when no explicit caller path is configured.
pub const DEFAULT_CALLER: &str = "platypus";

/// Invocation of the Platypus variant caller as an external process.
#[derive(Debug, Clone)]
pub struct PlatypusCaller {
    program: OsString,
    bam: PathBuf,
    reference: PathBuf,
    chromosomes: Vec<String>,
    threads: usize,
    output: PathBuf,
}

impl PlatypusCaller {
    pub fn new<B, R, O>(bam: B, reference: R, chromosomes: &[String], threads: usize, output: O) -> Self
    where
        B: AsRef<Path>,
        R: AsRef<Path>,
        O: AsRef<Path>,
    {
        Self {
            program: OsString::from(DEFAULT_CALLER),
            bam: bam.as_ref().to_path_buf(),
            reference: reference.as_ref().to_path_buf(),
            chromosomes: chromosomes.to_vec(),
            threads: threads.max(1),
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Use a different executable, e.g. an absolute path or a wrapper script.
    pub fn with_program<S: Into<OsString>>(mut self, program: S) -> Self {
        self.program = program.into();
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn args(&self) -> Vec<OsString> {
        vec![
            OsString::from("callVariants"),
            OsString::from("--bamFiles"),
            self.bam.clone().into_os_string(),
            OsString::from("-o"),
            self.output.clone().into_os_string(),
            OsString::from("--refFile"),
            self.reference.clone().into_os_string(),
            OsString::from("--nCPU"),
            OsString::from(self.threads.to_string()),
            OsString::from("--regions"),
            OsString::from(self.chromosomes.iter().join(",")),
            OsString::from("--assemble"),
            OsString::from("1"),
        ]
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args());
        command
    }

    /// Run the caller to completion; `true` only when it exits with status 0.
    ///
    /// Launch failures and non-zero exits are logged and reported as `false`.
    pub fn call(&self) -> bool {
        info!(
            "Calling variants on {} ({}) with {:?}",
            self.bam.display(),
            self.chromosomes.join(","),
            self.program
        );
        match self.command().status() {
            Ok(status) if status.success() => {
                info!("Variant calls written to {}", self.output.display());
                true
            }
            Ok(status) => {
                warn!("Variant caller {:?} exited with {}", self.program, status);
                false
            }
            Err(err) => {
                warn!("Failed to launch variant caller {:?}: {}", self.program, err);
                false
            }
        }
    }
}
