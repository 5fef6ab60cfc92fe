//! An [`AlignmentSource`] over indexed BAM/CRAM files.
//!
//! Columns come straight from the htslib pileup engine. Records that are unmapped, secondary,
//! QC-failed or duplicates are dropped; a position covered only by such records yields no
//! column at all. Within a kept column, deletions and reference skips contribute no base.
//!
//! htslib applies `max_depth` while building the column, before the flag filter runs, so
//! dropped records still count towards the cap.

use super::{AlignmentSource, Chromosome, PileupColumn, PileupColumns};
use crate::core::error::{Result, XyError};
use rust_htslib::bam::{self, pileup::Pileup, record::Record, Read};
use std::path::Path;

/// Default cap handed to the htslib pileup engine.
pub const DEFAULT_MAX_DEPTH: u32 = 8000;

pub struct HtslibSource {
    reader: bam::IndexedReader,
    max_depth: u32,
}

impl HtslibSource {
    /// Open an indexed alignment file. The index must sit next to it.
    pub fn from_path<P: AsRef<Path>>(path: P, max_depth: u32) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(XyError::FileNotFound(path.display().to_string()));
        }
        let reader = bam::IndexedReader::from_path(path)?;
        Ok(Self { reader, max_depth })
    }
}

#[inline(always)]
fn passes_flag_filter(record: &Record) -> bool {
    !(record.is_unmapped()
        || record.is_secondary()
        || record.is_quality_check_failed()
        || record.is_duplicate())
}

/// Collapse an htslib pileup into a [`PileupColumn`], or `None` when no record passes the
/// flag filter.
fn column_from_pileup(pileup: &Pileup) -> Option<PileupColumn> {
    let mut column = PileupColumn::new(pileup.pos());
    let mut covered = false;
    for alignment in pileup.alignments() {
        let record = alignment.record();
        if !passes_flag_filter(&record) {
            continue;
        }
        covered = true;
        // a refskip is also reported as a deletion; both keep the column but add no base
        if alignment.is_del() || alignment.is_refskip() {
            continue;
        }
        let Some(qpos) = alignment.qpos() else {
            continue;
        };
        column.push(record.seq()[qpos], record.mapq());
    }
    covered.then_some(column)
}

impl AlignmentSource for HtslibSource {
    fn reference_names_and_lengths(&self) -> Vec<Chromosome> {
        let header = self.reader.header();
        (0..header.target_count())
            .map(|tid| {
                Chromosome::new(
                    String::from_utf8_lossy(header.tid2name(tid)).into_owned(),
                    header.target_len(tid).unwrap_or(0),
                )
            })
            .collect()
    }

    fn pileup(&mut self, chromosome: &str, start: u32, end: u32) -> Result<PileupColumns<'_>> {
        let tid = self
            .reader
            .header()
            .tid(chromosome.as_bytes())
            .ok_or_else(|| XyError::UnknownChromosome(chromosome.to_string()))?;
        self.reader.fetch((tid, start, end))?;

        let mut pileups = self.reader.pileup();
        pileups.set_max_depth(self.max_depth);

        Ok(Box::new(pileups.filter_map(move |result| match result {
            // reads overlapping the region boundary produce columns outside of it
            Ok(pileup) if pileup.pos() >= start && pileup.pos() < end => {
                column_from_pileup(&pileup).map(Ok)
            }
            Ok(_) => None,
            Err(err) => Some(Err(err.into())),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::traverse::{traverse, NoProgress, TraversalParams};
    use rust_htslib::bam::record::{Cigar, CigarString};
    use std::path::PathBuf;
    use tempfile::tempdir;

    const DUPLICATE: u16 = 0x400;
    const SECONDARY: u16 = 0x100;
    const QC_FAIL: u16 = 0x200;

    struct TestRead<'a> {
        name: &'a [u8],
        pos: i64,
        cigar: Vec<Cigar>,
        seq: &'a [u8],
        mapq: u8,
        flags: u16,
    }

    // Reads must be given in coordinate order.
    fn write_bam(dir: &Path, reads: &[TestRead]) -> PathBuf {
        let bam_path = dir.join("test.bam");
        let mut header = bam::header::Header::new();
        let mut hd_rec = bam::header::HeaderRecord::new(b"HD");
        hd_rec.push_tag(b"VN", &"1.6".to_string());
        hd_rec.push_tag(b"SO", &"coordinate".to_string());
        header.push_record(&hd_rec);
        let mut chr_rec = bam::header::HeaderRecord::new(b"SQ");
        chr_rec.push_tag(b"SN", &"chrX".to_string());
        chr_rec.push_tag(b"LN", &100.to_string());
        header.push_record(&chr_rec);

        let mut writer = bam::Writer::from_path(&bam_path, &header, bam::Format::Bam)
            .expect("Opened test.bam for writing");
        for read in reads {
            let mut record = bam::Record::new();
            let qual = vec![30u8; read.seq.len()];
            record.set(read.name, Some(&CigarString(read.cigar.clone())), read.seq, &qual);
            record.set_tid(0);
            record.set_pos(read.pos);
            record.set_mapq(read.mapq);
            record.set_flags(read.flags);
            record.set_mtid(-1);
            record.set_mpos(-1);
            writer.write(&record).expect("Wrote to test.bam");
        }
        drop(writer); // force flush before indexing
        bam::index::build(&bam_path, None, bam::index::Type::Bai, 1).unwrap();
        bam_path
    }

    fn fixture_reads() -> Vec<TestRead<'static>> {
        vec![
            // 5..15 match, 15..17 deletion, 17..22 match
            TestRead {
                name: b"deletion",
                pos: 5,
                cigar: vec![Cigar::Match(10), Cigar::Del(2), Cigar::Match(5)],
                seq: b"AAAAAAAAAACCCCC",
                mapq: 60,
                flags: 0,
            },
            // starts before the region and is clipped to it
            TestRead {
                name: b"left_edge",
                pos: 8,
                cigar: vec![Cigar::Match(5)],
                seq: b"TTTTT",
                mapq: 50,
                flags: 0,
            },
            // 12..15 match, 15..19 skipped, 19..22 match
            TestRead {
                name: b"spliced",
                pos: 12,
                cigar: vec![Cigar::Match(3), Cigar::RefSkip(4), Cigar::Match(3)],
                seq: b"GGGTTT",
                mapq: 30,
                flags: 0,
            },
            TestRead {
                name: b"duplicate",
                pos: 25,
                cigar: vec![Cigar::Match(2)],
                seq: b"AA",
                mapq: 60,
                flags: DUPLICATE,
            },
            TestRead {
                name: b"secondary",
                pos: 27,
                cigar: vec![Cigar::Match(1)],
                seq: b"A",
                mapq: 60,
                flags: SECONDARY,
            },
            TestRead {
                name: b"qc_fail",
                pos: 28,
                cigar: vec![Cigar::Match(1)],
                seq: b"A",
                mapq: 60,
                flags: QC_FAIL,
            },
            // runs past the region end
            TestRead {
                name: b"right_edge",
                pos: 29,
                cigar: vec![Cigar::Match(4)],
                seq: b"GGGG",
                mapq: 40,
                flags: 0,
            },
        ]
    }

    fn base_calls(column: &PileupColumn) -> Vec<(u8, u8)> {
        let mut calls: Vec<(u8, u8)> = column.bases().iter().map(|b| (b.base, b.mapq)).collect();
        calls.sort_unstable();
        calls
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let result = HtslibSource::from_path("does/not/exist.bam", DEFAULT_MAX_DEPTH);
        assert!(matches!(result, Err(XyError::FileNotFound(_))));
    }

    #[test]
    fn header_lists_chromosomes() {
        let tempdir = tempdir().unwrap();
        let bam_path = write_bam(tempdir.path(), &fixture_reads());
        let source = HtslibSource::from_path(&bam_path, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(
            source.reference_names_and_lengths(),
            vec![Chromosome::new("chrX", 100)]
        );
    }

    #[test]
    fn pileup_columns_from_bam() {
        let tempdir = tempdir().unwrap();
        let bam_path = write_bam(tempdir.path(), &fixture_reads());
        let mut source = HtslibSource::from_path(&bam_path, DEFAULT_MAX_DEPTH).unwrap();

        let columns: Vec<PileupColumn> = source
            .pileup("chrX", 10, 30)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        // filtered-only positions 25..29 and uncovered 22..25 yield nothing; 8, 9 and 30.. are
        // outside the region
        let positions: Vec<u32> = columns.iter().map(|c| c.pos).collect();
        let mut expected: Vec<u32> = (10..22).collect();
        expected.push(29);
        assert_eq!(positions, expected);

        let at = |pos: u32| columns.iter().find(|c| c.pos == pos).unwrap();
        assert_eq!(base_calls(at(10)), vec![(b'A', 60), (b'T', 50)]);
        assert_eq!(base_calls(at(12)), vec![(b'A', 60), (b'G', 30), (b'T', 50)]);
        // deletion in one read, reference skip in the other
        assert!(at(15).is_empty());
        assert!(at(16).is_empty());
        assert_eq!(base_calls(at(17)), vec![(b'C', 60)]);
        assert_eq!(base_calls(at(19)), vec![(b'C', 60), (b'T', 30)]);
        assert_eq!(base_calls(at(29)), vec![(b'G', 40)]);
    }

    #[test]
    fn filtered_positions_do_not_advance_windows() {
        let tempdir = tempdir().unwrap();
        let bam_path = write_bam(tempdir.path(), &fixture_reads());
        let mut source = HtslibSource::from_path(&bam_path, DEFAULT_MAX_DEPTH).unwrap();
        let params = TraversalParams {
            window_size: 3,
            min_depth: 1,
            ..TraversalParams::default()
        };
        let result = traverse(&mut source, "chrX", &params, &mut NoProgress).unwrap();

        // 17 columns over 5..22 plus 4 over 29..33; two columns per window
        assert_eq!(result.windows.len(), 10);
        // first window holds columns 5 and 6, one read each
        assert!((result.windows[0].mean_depth - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_chromosome_is_rejected() {
        let tempdir = tempdir().unwrap();
        let bam_path = write_bam(tempdir.path(), &fixture_reads());
        let mut source = HtslibSource::from_path(&bam_path, DEFAULT_MAX_DEPTH).unwrap();
        assert!(matches!(
            source.pileup("chr7", 0, 10).map(|_| ()),
            Err(XyError::UnknownChromosome(name)) if name == "chr7"
        ));
    }
}
