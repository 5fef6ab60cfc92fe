//! XYSCAN - windowed depth, read balance and mapping quality of sex chromosomes
//!
//! # Tools
//!
//! - `windows`: traverse the pileup of each chromosome and write per-window means,
//!   frequency tables and plots
//! - `variants`: call variants with Platypus and summarise the read balance of the calls
//!
//! # Usage
//!
//! ```bash
//! # Scan chrX, chrY and chr19 in 50 kb windows
//! xyscan windows --bam sample.bam -o scan/
//!
//! # Scan only chrX in 10 kb windows on 4 threads
//! xyscan windows --bam sample.bam -c chrX -w 10000 -t 4 -o scan/
//!
//! # Call variants and plot their read balance
//! xyscan variants --bam sample.bam --ref hg38.fa -o calls/
//! ```

extern crate xyscan_lib;
pub mod commands;
use anyhow::Result;
use env_logger::Env;
use log::*;
use structopt::StructOpt;
use xyscan_lib::utils;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Sex chromosome scans of BAM pileups
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Per-window depth, read balance and mapping quality
    Windows(commands::WindowsArgs),
    /// Variant calling and read balance of the calls
    Variants(commands::VariantsArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Windows(args) => commands::run_windows(args)?,
            Subcommand::Variants(args) => commands::run_variants(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if utils::is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}
