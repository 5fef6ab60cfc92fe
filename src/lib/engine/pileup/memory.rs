use super::{AlignmentSource, Chromosome, PileupColumn, PileupColumns};
use crate::core::error::{Result, XyError};
use rustc_hash::FxHashMap;

/// An [`AlignmentSource`] backed by columns held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    chromosomes: Vec<Chromosome>,
    columns: FxHashMap<String, Vec<PileupColumn>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chromosome with its columns; columns are sorted by position.
    pub fn with_chromosome<S: Into<String>>(
        mut self,
        name: S,
        length: u64,
        mut columns: Vec<PileupColumn>,
    ) -> Self {
        let name = name.into();
        columns.sort_by_key(|c| c.pos);
        self.chromosomes.push(Chromosome::new(name.clone(), length));
        self.columns.insert(name, columns);
        self
    }
}

impl AlignmentSource for InMemorySource {
    fn reference_names_and_lengths(&self) -> Vec<Chromosome> {
        self.chromosomes.clone()
    }

    fn pileup(&mut self, chromosome: &str, start: u32, end: u32) -> Result<PileupColumns<'_>> {
        let columns = self
            .columns
            .get(chromosome)
            .ok_or_else(|| XyError::UnknownChromosome(chromosome.to_string()))?;
        Ok(Box::new(
            columns
                .iter()
                .filter(move |c| c.pos >= start && c.pos < end)
                .cloned()
                .map(Ok),
        ))
    }
}
