use super::{Metric, TraversalResult};
use crate::core::error::Result;
use crate::core::fs::{make_parent_dirs, with_gz_extension};
use crate::core::io::get_writer;
use crate::variants::VariantBalance;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

const WINDOW_HEADER: [&str; 4] = ["WINDOW", "DEPTH", "READBAL", "MAPQ"];
const FREQUENCY_HEADER: [&str; 2] = ["VALUE", "COUNT"];
const VARIANT_HEADER: [&str; 4] = ["CHR", "POSITION", "QUALITY", "READ_BALANCE"];

/// Writes traversal tables as TSV, one directory per chromosome.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    root: PathBuf,
    bgzip: bool,
}

impl ReportWriter {
    pub fn new<P: AsRef<Path>>(root: P, bgzip: bool) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            bgzip,
        }
    }

    pub fn chromosome_dir(&self, chromosome: &str) -> PathBuf {
        self.root.join(chromosome)
    }

    fn table_path(&self, chromosome: &str, stem: &str) -> PathBuf {
        let path = self.chromosome_dir(chromosome).join(format!("{}.tsv", stem));
        if self.bgzip {
            with_gz_extension(&path)
        } else {
            path
        }
    }

    /// Serialize `rows`; an empty table still gets its header line.
    fn write_table<T, I>(&self, path: &Path, header: &[&str], rows: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        make_parent_dirs(path)?;
        let mut writer = get_writer(&Some(path), self.bgzip, true, 1, 6)?;
        let mut rows = rows.into_iter().peekable();
        if rows.peek().is_none() {
            writer.write_record(header)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write `windows.tsv` and one `{metric}_freq.tsv` per metric; returns the written paths.
    pub fn write(&self, result: &TraversalResult) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(1 + Metric::ALL.len());

        let windows_path = self.table_path(&result.chromosome, "windows");
        self.write_table(&windows_path, &WINDOW_HEADER, result.windows.iter())?;
        written.push(windows_path);

        for metric in Metric::ALL {
            let path = self.table_path(&result.chromosome, &format!("{}_freq", metric.name()));
            self.write_table(&path, &FREQUENCY_HEADER, result.frequency(metric).entries().iter())?;
            written.push(path);
        }

        info!(
            "{}: wrote {} windows to {}",
            result.chromosome,
            result.windows.len(),
            self.chromosome_dir(&result.chromosome).display()
        );
        Ok(written)
    }

    /// Write the read balance of variant calls on one chromosome to `variants.tsv`.
    pub fn write_variants(&self, chromosome: &str, balances: &[VariantBalance]) -> Result<PathBuf> {
        let path = self.table_path(chromosome, "variants");
        self.write_table(&path, &VARIANT_HEADER, balances.iter())?;
        Ok(path)
    }
}
