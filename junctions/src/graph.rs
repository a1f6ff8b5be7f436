//! Canonical k-mer vertex assignment and junction detection.
//!
//! A vertex is the canonical form of a k-mer (the lexicographically smaller
//! 2-bit code of the k-mer and its reverse complement); an occurrence whose
//! forward reading equals the canonical form carries the positive id. A
//! vertex is a *junction* when, in either reading orientation, its
//! occurrences are followed by more than one distinct base, or any
//! occurrence runs into a chromosome end or an ambiguous-base gap.

use std::collections::HashMap;

use gencore::{
    dna::{Complement, DnaBase},
    genome::Genome,
};

/// One junction occurrence on the forward strand of a chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Junction {
    /// Signed vertex id as read in forward chromosome direction.
    pub vertex: i64,
    /// Forward coordinate of the k-mer start.
    pub pos: u32,
}

pub struct JunctionMap {
    /// Ids are `1..vertices`, so signed ids lie in `[-(vertices-1), vertices-1]`.
    pub vertices: i64,
    /// Per chromosome, junction occurrences in ascending position order.
    pub chrs: Vec<Vec<Junction>>,
}

/// Following-base sets per reading orientation, four label bits plus a
/// dead-end bit (chromosome boundary or `N` gap).
#[derive(Debug, Clone, Copy, Default)]
struct LabelSet(u8);

const DEAD_END: u8 = 1 << 4;

impl LabelSet {
    fn add(&mut self, label: Option<DnaBase>) {
        match label {
            Some(b) => self.0 |= 1 << b.code(),
            None => self.0 |= DEAD_END,
        }
    }
    fn branches(self) -> bool {
        (self.0 & DEAD_END) != 0 || (self.0 & !DEAD_END).count_ones() > 1
    }
}

pub fn build(genome: &Genome, k: usize) -> JunctionMap {
    assert!(k >= 1 && k <= 31 && k % 2 == 1, "k must be odd and at most 31");

    let mut ids: HashMap<u64, i64> = HashMap::new();
    let mut out_fwd: Vec<LabelSet> = vec![LabelSet::default()]; // slot 0 unused
    let mut out_rev: Vec<LabelSet> = vec![LabelSet::default()];

    // All k-mer occurrences, before junction filtering.
    let mut occurrences: Vec<Vec<Junction>> = Vec::with_capacity(genome.len());

    for chromosome in genome {
        let mut chr_occ = Vec::new();
        for (pos, window) in KmerWindows::new(chromosome, k) {
            let canonical = window.code.min(window.rc_code);
            let next_id = ids.len() as i64 + 1;
            let id = *ids.entry(canonical).or_insert(next_id);
            if id == next_id {
                out_fwd.push(LabelSet::default());
                out_rev.push(LabelSet::default());
            }

            // Odd k rules out `code == rc_code`, so the sign is unambiguous.
            let vertex = if window.code == canonical { id } else { -id };

            let slot = id as usize;
            if vertex > 0 {
                out_fwd[slot].add(window.next);
                out_rev[slot].add(window.prev.map(DnaBase::complement));
            } else {
                out_fwd[slot].add(window.prev.map(DnaBase::complement));
                out_rev[slot].add(window.next);
            }

            chr_occ.push(Junction {
                vertex,
                pos: u32::try_from(pos).expect("chromosome longer than u32"),
            });
        }
        occurrences.push(chr_occ);
    }

    let is_junction: Vec<bool> = out_fwd
        .iter()
        .zip(&out_rev)
        .map(|(f, r)| f.branches() || r.branches())
        .collect();

    // Junction vertices get fresh dense ids in first-appearance order, so
    // the finder's id-indexed scratch stays proportional to the junction
    // count rather than the raw k-mer count.
    let mut remap: HashMap<i64, i64> = HashMap::new();
    let mut chrs = Vec::with_capacity(occurrences.len());
    for chr_occ in occurrences {
        let mut kept = Vec::new();
        for occ in chr_occ {
            if !is_junction[occ.vertex.unsigned_abs() as usize] {
                continue;
            }
            let next_id = remap.len() as i64 + 1;
            let id = *remap.entry(occ.vertex.abs()).or_insert(next_id);
            kept.push(Junction {
                vertex: id * occ.vertex.signum(),
                pos: occ.pos,
            });
        }
        chrs.push(kept);
    }

    let vertices = remap.len() as i64 + 1;
    log::debug!(
        "{} distinct k-mers, {} junction vertices",
        ids.len(),
        remap.len()
    );

    JunctionMap { vertices, chrs }
}

/// Iterator over the pure-ACGT k-mer windows of one chromosome, yielding
/// the window's 2-bit codes and the bases flanking it (`None` at a
/// chromosome end or across an `N`).
struct KmerWindows<'a> {
    chromosome: &'a gencore::genome::Chromosome,
    k: usize,
    mask: u64,
    next_start: usize,
    /// Bases of the current window still valid, counted from its end.
    run: usize,
    code: u64,
    rc_code: u64,
}

struct Window {
    code: u64,
    rc_code: u64,
    prev: Option<DnaBase>,
    next: Option<DnaBase>,
}

impl<'a> KmerWindows<'a> {
    fn new(chromosome: &'a gencore::genome::Chromosome, k: usize) -> Self {
        Self {
            chromosome,
            k,
            mask: (1 << (2 * k)) - 1,
            next_start: 0,
            run: 0,
            code: 0,
            rc_code: 0,
        }
    }

    fn base_at(&self, pos: usize) -> Option<DnaBase> {
        self.chromosome.sequence().get(pos).and_then(|b| b.to_dna())
    }
}

impl<'a> Iterator for KmerWindows<'a> {
    type Item = (usize, Window);

    fn next(&mut self) -> Option<Self::Item> {
        let seq = self.chromosome.sequence();
        loop {
            // The window ending at `end` starts at `next_start`.
            let end = self.next_start + self.run;
            if end >= seq.len() && self.run < self.k {
                return None;
            }
            if self.run == self.k {
                let pos = self.next_start;
                self.next_start += 1;
                self.run -= 1;
                let window = Window {
                    code: self.code & self.mask,
                    rc_code: self.rc_code >> (64 - 2 * self.k),
                    prev: pos.checked_sub(1).and_then(|p| self.base_at(p)),
                    next: self.base_at(pos + self.k),
                };
                return Some((pos, window));
            }
            match self.base_at(end) {
                Some(b) => {
                    self.code = (self.code << 2) | b.code();
                    self.rc_code = (self.rc_code >> 2) | ((3 - b.code()) << 62);
                    self.run += 1;
                }
                None => {
                    // Restart past the ambiguous base.
                    self.next_start = end + 1;
                    self.run = 0;
                    self.code = 0;
                    self.rc_code = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gencore::genome::Chromosome;

    fn genome(seqs: &[&str]) -> Genome {
        seqs.iter()
            .enumerate()
            .map(|(i, s)| Chromosome::new(format!("chr{i}"), s.parse().unwrap()))
            .collect()
    }

    fn vertex_at(map: &JunctionMap, chr: usize, pos: u32) -> Option<i64> {
        map.chrs[chr]
            .iter()
            .find(|j| j.pos == pos)
            .map(|j| j.vertex)
    }

    #[test]
    fn boundaries_are_junctions() {
        let g = genome(&["ACGTACGTACGTAAA"]);
        let map = build(&g, 5);
        let first = map.chrs[0].first().unwrap();
        let last = map.chrs[0].last().unwrap();
        assert_eq!(first.pos, 0);
        assert_eq!(last.pos, (g[0].len() - 5) as u32);
    }

    #[test]
    fn reverse_complement_occurrence_is_negated() {
        // chr1 is the reverse complement of chr0, so the first k-mer of
        // chr0 appears in chr1 with the opposite sign.
        let fwd = "ACGGTAACCGGTTAACC";
        let rev: String = fwd
            .chars()
            .rev()
            .map(|c| match c {
                'A' => 'T',
                'C' => 'G',
                'G' => 'C',
                _ => 'A',
            })
            .collect();
        let g = genome(&[fwd, &rev]);
        let map = build(&g, 5);

        let v0 = vertex_at(&map, 0, 0).unwrap();
        let mirrored = (fwd.len() - 5) as u32;
        assert_eq!(vertex_at(&map, 1, mirrored).unwrap(), -v0);
    }

    #[test]
    fn substitution_creates_interior_junctions() {
        let a = "AAACCCGGGTTTACGTACGTAAACCC";
        // Same text with one substitution in the middle.
        let b = a.replace("TTTACGTACG", "TTTACCTACG");
        let g = genome(&[a, &b]);
        let map = build(&g, 5);

        // Interior junctions appear where the two texts diverge and
        // re-converge, in addition to the two boundary junctions.
        assert!(map.chrs[0].len() > 2);
        let interior = map.chrs[0]
            .iter()
            .any(|j| j.pos != 0 && j.pos != (a.len() - 5) as u32);
        assert!(interior);
    }

    #[test]
    fn skips_ambiguous_windows() {
        let g = genome(&["ACGTANNNNNACGTA"]);
        let map = build(&g, 5);
        for j in &map.chrs[0] {
            // Only the two clean 5-mer windows exist.
            assert!(j.pos == 0 || j.pos == 10);
        }
        assert_eq!(map.chrs[0].len(), 2);
    }
}
