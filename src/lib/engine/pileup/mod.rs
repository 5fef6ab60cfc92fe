//! Pileup column sources.
//!
//! An [`AlignmentSource`] resolves chromosome names and lengths and hands out a lazy,
//! forward-only stream of [`PileupColumn`]s for a region. Consumers cancel a traversal by
//! simply dropping the stream.
//!
//! # Implementations
//!
//! - [`htslib::HtslibSource`]: indexed BAM/CRAM files read through rust-htslib
//! - [`memory::InMemorySource`]: pre-built columns, for tests and embedding

pub mod htslib;
pub mod memory;

use crate::core::error::{Result, XyError};

pub use htslib::HtslibSource;
pub use memory::InMemorySource;

/// A reference sequence as described by the alignment header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    pub name: String,
    /// Length in bases.
    pub length: u64,
}

impl Chromosome {
    pub fn new<S: Into<String>>(name: S, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// One read's contribution to a pileup column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedBase {
    /// Upper-cased base call.
    pub base: u8,
    pub mapq: u8,
}

/// All aligned bases at one reference position, excluding deletions and reference skips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PileupColumn {
    /// 0-based reference position.
    pub pos: u32,
    bases: Vec<AlignedBase>,
}

impl PileupColumn {
    pub fn new(pos: u32) -> Self {
        Self {
            pos,
            bases: Vec::new(),
        }
    }

    /// Build a column from `(base, mapq)` pairs.
    pub fn from_bases(pos: u32, bases: &[(u8, u8)]) -> Self {
        let mut column = Self::new(pos);
        for &(base, mapq) in bases {
            column.push(base, mapq);
        }
        column
    }

    #[inline]
    pub fn push(&mut self, base: u8, mapq: u8) {
        self.bases.push(AlignedBase {
            base: base.to_ascii_uppercase(),
            mapq,
        });
    }

    #[inline]
    pub fn bases(&self) -> &[AlignedBase] {
        &self.bases
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// Lazy stream of columns in ascending position order.
pub type PileupColumns<'a> = Box<dyn Iterator<Item = Result<PileupColumn>> + 'a>;

/// Contract between the traversal engine and whatever supplies pileups.
pub trait AlignmentSource {
    /// Every reference sequence in header order.
    fn reference_names_and_lengths(&self) -> Vec<Chromosome>;

    /// Stream the columns of `chromosome` whose 0-based position lies in `[start, end)`.
    fn pileup(&mut self, chromosome: &str, start: u32, end: u32) -> Result<PileupColumns<'_>>;
}

/// Look up a chromosome by name in the source header.
pub fn lookup_chromosome<S: AlignmentSource + ?Sized>(source: &S, name: &str) -> Result<Chromosome> {
    source
        .reference_names_and_lengths()
        .into_iter()
        .find(|chrom| chrom.name == name)
        .ok_or_else(|| XyError::UnknownChromosome(name.to_string()))
}
