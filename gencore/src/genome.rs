use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::dna::MaybeDnaSequence;

/// One input sequence with its FASTA header text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct Chromosome {
    description: String,
    sequence: MaybeDnaSequence,
}

impl Chromosome {
    pub fn new(description: impl Into<String>, sequence: MaybeDnaSequence) -> Self {
        Self {
            description: description.into(),
            sequence,
        }
    }

    /// The full header text, as read from the FASTA definition line.
    pub fn description(&self) -> &str {
        &self.description
    }
    /// The first word of the header, the conventional sequence id.
    pub fn name(&self) -> &str {
        self.description.split_whitespace().next().unwrap_or("")
    }

    pub fn sequence(&self) -> &MaybeDnaSequence {
        &self.sequence
    }
    pub fn len(&self) -> usize {
        self.sequence.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// The full input: chromosomes addressed by dense index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genome {
    chromosomes: Vec<Chromosome>,
}

impl Genome {
    pub fn new(chromosomes: impl IntoIterator<Item = Chromosome>) -> Self {
        Self {
            chromosomes: chromosomes.into_iter().collect(),
        }
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
    pub fn total_bases(&self) -> usize {
        self.chromosomes.iter().map(Chromosome::len).sum()
    }

    pub fn push(&mut self, chromosome: Chromosome) {
        self.chromosomes.push(chromosome);
    }
}
impl Index<usize> for Genome {
    type Output = Chromosome;
    #[track_caller]
    fn index(&self, index: usize) -> &Self::Output {
        &self.chromosomes[index]
    }
}
impl IntoIterator for Genome {
    type Item = Chromosome;
    type IntoIter = std::vec::IntoIter<Chromosome>;
    fn into_iter(self) -> Self::IntoIter {
        self.chromosomes.into_iter()
    }
}
impl<'a> IntoIterator for &'a Genome {
    type Item = &'a Chromosome;
    type IntoIter = std::slice::Iter<'a, Chromosome>;
    fn into_iter(self) -> Self::IntoIter {
        self.chromosomes.iter()
    }
}
impl FromIterator<Chromosome> for Genome {
    fn from_iter<I: IntoIterator<Item = Chromosome>>(iter: I) -> Self {
        Self::new(iter)
    }
}
