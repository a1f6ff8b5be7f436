//! Writers for the trimmed block set: the GFF coordinate table and the
//! per-block FASTA files.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use junctions::JunctionStorage;

use crate::block::BlockInstance;

const FASTA_LINE: usize = 80;

/// Writes one GFF record per block instance (1-based inclusive
/// coordinates, strand from the sign, `id=<trimmed id>` attribute).
pub fn write_gff(
    storage: &JunctionStorage,
    blocks: &[BlockInstance],
    path: impl AsRef<Path>,
) -> io::Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(create(path)?);

    let mut sorted = blocks.to_vec();
    sorted.sort_by_key(|b| (b.chr_id(), b.start(), b.block_id()));

    writeln!(out, "##gff-version 2")?;
    for b in &sorted {
        let seqid = storage
            .chr_description(b.chr_id())
            .split_whitespace()
            .next()
            .unwrap_or(".");
        let strand = if b.is_forward() { '+' } else { '-' };
        writeln!(
            out,
            "{seqid}\tblockfind\tblock\t{}\t{}\t.\t{strand}\t.\tid={}",
            b.start() + 1,
            b.end(),
            b.block_id(),
        )?;
    }
    out.flush()
}

/// Writes `<id>.fa` per block under `directory`: every occurrence,
/// 80-column wrapped, reverse-complemented on the negative strand. The
/// header carries the occurrence's origin:
/// `<id>_<n> <chr description>;<start>;<length>;<+|->;<chr size>`,
/// where `start` is on the occurrence's own strand.
pub fn write_block_sequences(
    storage: &JunctionStorage,
    blocks: &[BlockInstance],
    directory: impl AsRef<Path>,
) -> io::Result<()> {
    let directory = directory.as_ref();

    let mut sorted = blocks.to_vec();
    sorted.sort_by_key(|b| (b.block_id(), b.chr_id(), b.start()));

    let mut group_start = 0;
    while group_start < sorted.len() {
        let id = sorted[group_start].block_id();
        let group_end = group_start
            + sorted[group_start..]
                .iter()
                .take_while(|b| b.block_id() == id)
                .count();

        let path = directory.join(format!("{id}.fa"));
        let mut out = BufWriter::new(create(&path)?);
        for (occurrence, b) in sorted[group_start..group_end].iter().enumerate() {
            let chr = b.chr_id();
            let chr_size = storage.chr_size(chr);
            let slice = &storage.chr_sequence(chr)[b.start()..b.end()];
            let (start, encoded) = if b.is_forward() {
                (b.start(), slice.encode())
            } else {
                (chr_size - b.end(), slice.reverse_complement().encode())
            };
            writeln!(
                out,
                ">{id}_{occurrence} {};{start};{};{};{chr_size}",
                storage.chr_description(chr),
                b.length(),
                if b.is_forward() { '+' } else { '-' },
            )?;
            for line in encoded.as_bytes().chunks(FASTA_LINE) {
                out.write_all(line)?;
                out.write_all(b"\n")?;
            }
        }
        out.flush()?;

        group_start = group_end;
    }
    Ok(())
}

fn create(path: &Path) -> io::Result<File> {
    File::create(path).map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use gencore::genome::{Chromosome, Genome};

    use super::*;

    fn storage(seqs: &[&str]) -> JunctionStorage {
        let genome: Genome = seqs
            .iter()
            .enumerate()
            .map(|(i, s)| Chromosome::new(format!("chr{i} test"), s.parse().unwrap()))
            .collect();
        JunctionStorage::build(genome, 5)
    }

    #[test]
    fn gff_records_are_one_based_inclusive() {
        let s = storage(&["ACGTAGGCTTACCGGATCCA", "ACGTAGGCTTACCGGATCCA"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks_coords.gff");

        let blocks = vec![
            BlockInstance::new(1, 0, 0, 20),
            BlockInstance::new(-1, 1, 5, 20),
        ];
        write_gff(&s, &blocks, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "##gff-version 2");
        assert_eq!(lines[1], "chr0\tblockfind\tblock\t1\t20\t.\t+\t.\tid=1");
        assert_eq!(lines[2], "chr1\tblockfind\tblock\t6\t20\t.\t-\t.\tid=1");
    }

    #[test]
    fn fasta_reverse_complements_negative_instances() {
        let s = storage(&["ACGTAGGCTTACCGGATCCA", "ACGTAGGCTTACCGGATCCA"]);
        let dir = tempfile::tempdir().unwrap();

        let blocks = vec![
            BlockInstance::new(1, 0, 0, 10),
            BlockInstance::new(-1, 1, 10, 20),
        ];
        write_block_sequences(&s, &blocks, dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join("1.fa")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">1_0 chr0 test;0;10;+;20");
        assert_eq!(lines[1], "ACGTAGGCTT");
        // Start is reported on the occurrence's own strand.
        assert_eq!(lines[2], ">1_1 chr1 test;0;10;-;20");
        assert_eq!(lines[3], "TGGATCCGGT");
    }

    #[test]
    fn long_sequences_wrap_at_eighty_columns() {
        let seq = "ACGTAGGCTTACCGGATCCA".repeat(5); // 100 bases
        let s = storage(&[&seq, &seq]);
        let dir = tempfile::tempdir().unwrap();

        let blocks = vec![
            BlockInstance::new(1, 0, 0, 100),
            BlockInstance::new(1, 1, 0, 100),
        ];
        write_block_sequences(&s, &blocks, dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join("1.fa")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 20);
    }
}
