//! Per-column allele and mapping-quality statistics.

use super::pileup::PileupColumn;
use rustc_hash::FxHashMap;

/// Statistics derived from a single pileup column.
///
/// Only the two most frequent bases contribute to `total_depth`; reads carrying a third or
/// fourth allele are ignored by depth and allele fraction, though their mapping qualities still
/// enter `mean_mapq`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SiteStats {
    pub total_depth: u32,
    pub num_major: u32,
    pub num_minor: u32,
    /// Mean mapping quality of every contributing read, `None` for an empty column.
    pub mean_mapq: Option<f64>,
}

impl SiteStats {
    pub fn from_column(column: &PileupColumn) -> Self {
        let mut base_counts: FxHashMap<u8, u32> = FxHashMap::default();
        let mut mapq_sum = 0u64;
        for aligned in column.bases() {
            *base_counts.entry(aligned.base).or_insert(0) += 1;
            mapq_sum += u64::from(aligned.mapq);
        }

        let mut counts: Vec<u32> = base_counts.into_values().collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        let num_major = counts.first().copied().unwrap_or(0);
        let num_minor = counts.get(1).copied().unwrap_or(0);

        let mean_mapq = (!column.is_empty()).then(|| mapq_sum as f64 / column.len() as f64);

        Self {
            total_depth: num_major + num_minor,
            num_major,
            num_minor,
            mean_mapq,
        }
    }

    /// Minor allele reads over total depth; `None` when the site has no depth.
    #[inline]
    pub fn allele_fraction(&self) -> Option<f64> {
        (self.total_depth > 0).then(|| f64::from(self.num_minor) / f64::from(self.total_depth))
    }
}
