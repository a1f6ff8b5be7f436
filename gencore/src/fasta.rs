use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use noodles::fasta::{io::Reader, record::Definition};

use crate::{
    dna::{DnaDecodeError, MaybeDnaBase},
    genome::{Chromosome, Genome},
    sequence::AsciiChar,
};

impl Genome {
    /// Reads every record from a FASTA stream, in file order.
    pub fn from_fasta(reader: impl BufRead) -> Result<Self, FastaError> {
        let mut reader = Reader::new(reader);

        let mut definition = String::new();
        let mut genome = Genome::default();

        while reader.read_definition(&mut definition)? > 0 {
            let def: Definition = definition.parse()?;

            let name: &str = def
                .name()
                .try_into()
                .map_err(|_| FastaError::NonUtf8Name)?;
            let description = match def.description() {
                Some(d) => {
                    let d: &str = d.try_into().map_err(|_| FastaError::NonUtf8Name)?;
                    format!("{name} {d}")
                }
                None => name.to_owned(),
            };

            let mut sequence = Vec::new();
            reader.read_sequence(&mut sequence)?;
            let sequence = MaybeDnaBase::decode(sequence)?;

            genome.push(Chromosome::new(description, sequence));

            definition.clear();
        }

        Ok(genome)
    }

    /// Concatenates the records of several FASTA files into one genome.
    pub fn from_fasta_files(paths: &[impl AsRef<Path>]) -> Result<Self, FastaError> {
        let mut genome = Genome::default();
        for path in paths {
            let path = path.as_ref();
            let file = File::open(path).map_err(|e| {
                io::Error::new(e.kind(), format!("{}: {e}", path.display()))
            })?;
            let read = Self::from_fasta(BufReader::new(file))?;
            log::info!(
                "Read {} sequence(s) from {}",
                read.len(),
                path.display()
            );
            for chromosome in read {
                genome.push(chromosome);
            }
        }
        Ok(genome)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FastaError {
    #[error(transparent)]
    InvalidDefinition(#[from] noodles::fasta::record::definition::ParseError),
    #[error("FASTA record name is not valid UTF-8")]
    NonUtf8Name,
    #[error("Invalid sequence: {0}")]
    InvalidSequence(#[from] DnaDecodeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
