//! Read balance of variant-caller records.
//!
//! The caller writes VCF-like, tab-separated lines. For every record passing the quality
//! cutoff, the INFO column is split into `key=value` pairs and the read balance is taken as
//! `TR / TC`: reads supporting the variant over total coverage at the locus. Records that
//! cannot yield a ratio (multi-allelic values, missing or zero counts, unparsable fields) are
//! dropped without error.

use crate::core::error::Result;
use log::debug;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smartstring::alias::String;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// INFO key carrying the number of reads supporting the variant.
pub const VARIANT_READS_KEY: &str = "TR";
/// INFO key carrying the total coverage at the locus.
pub const TOTAL_COVERAGE_KEY: &str = "TC";

const CHROM_COL: usize = 0;
const POS_COL: usize = 1;
const QUAL_COL: usize = 5;
const INFO_COL: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VariantBalance {
    #[serde(rename = "CHR")]
    pub chromosome: String,
    pub position: u64,
    pub quality: f64,
    pub read_balance: f64,
}

/// Split an INFO field into a key → value map; flags without a value are ignored.
pub fn parse_info(info: &str) -> FxHashMap<&str, &str> {
    info.split(';')
        .filter_map(|field| field.split_once('='))
        .collect()
}

/// Read a single-valued, non-zero count from the INFO map.
fn single_count(info: &FxHashMap<&str, &str>, key: &str) -> Option<f64> {
    let raw = info.get(key)?;
    if raw.contains(',') {
        return None;
    }
    let value: f64 = raw.parse().ok()?;
    (value != 0.0).then_some(value)
}

/// Parse one record line, returning `None` for headers and for skipped records.
pub fn parse_record(line: &str, qual_cutoff: f64) -> Option<VariantBalance> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() <= INFO_COL {
        debug!("Skipping record with {} columns", cols.len());
        return None;
    }

    let position: u64 = cols[POS_COL].parse().ok()?;
    let quality: f64 = cols[QUAL_COL].parse().ok()?;
    if quality < qual_cutoff {
        return None;
    }

    let info = parse_info(cols[INFO_COL]);
    let (Some(variant_reads), Some(coverage)) = (
        single_count(&info, VARIANT_READS_KEY),
        single_count(&info, TOTAL_COVERAGE_KEY),
    ) else {
        debug!(
            "Skipping {}:{} without usable {}/{}",
            cols[CHROM_COL], position, VARIANT_READS_KEY, TOTAL_COVERAGE_KEY
        );
        return None;
    };

    Some(VariantBalance {
        chromosome: String::from(cols[CHROM_COL]),
        position,
        quality,
        read_balance: variant_reads / coverage,
    })
}

/// Parse caller output from any buffered reader.
pub fn parse_caller_reader<R: BufRead>(reader: R, qual_cutoff: f64) -> Result<Vec<VariantBalance>> {
    let mut balances = Vec::new();
    for line in reader.lines() {
        if let Some(balance) = parse_record(&line?, qual_cutoff) {
            balances.push(balance);
        }
    }
    Ok(balances)
}

/// Parse a caller output file; only I/O failures are errors.
pub fn parse_caller_output<P: AsRef<Path>>(path: P, qual_cutoff: f64) -> Result<Vec<VariantBalance>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    parse_caller_reader(reader, qual_cutoff)
}
