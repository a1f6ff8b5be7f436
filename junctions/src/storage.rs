//! Junction storage: the vertex/occurrence index over the input genome,
//! plus the shared `used` flags and range locks the finder's workers
//! coordinate through.

use std::{
    fmt,
    sync::{
        MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use gencore::{
    dna::{Complement, MaybeDnaBase, MaybeDnaSequence},
    genome::Genome,
};

use crate::{
    graph::{self, Junction},
    locks::{LockHint, RangeLocks},
};

pub struct JunctionStorage {
    k: usize,
    vertices: i64,
    genome: Genome,
    chrs: Vec<ChrJunctions>,
    /// Occurrence refs per unsigned vertex id; slot 0 is unused.
    by_vertex: Vec<Vec<OccRef>>,
    locks: RangeLocks,
}

struct ChrJunctions {
    junctions: Vec<Junction>,
    used: Vec<AtomicBool>,
}

#[derive(Debug, Clone, Copy)]
struct OccRef {
    chr: u32,
    idx: u32,
}

impl JunctionStorage {
    /// Builds the junction index over `genome` with k-mer size `k` (odd,
    /// at most 31) and takes ownership of the sequences for output.
    pub fn build(genome: Genome, k: usize) -> Self {
        let map = graph::build(&genome, k);

        let mut by_vertex: Vec<Vec<OccRef>> = vec![Vec::new(); map.vertices as usize];
        for (chr, junctions) in map.chrs.iter().enumerate() {
            for (idx, junction) in junctions.iter().enumerate() {
                by_vertex[junction.vertex.unsigned_abs() as usize].push(OccRef {
                    chr: chr as u32,
                    idx: idx as u32,
                });
            }
        }

        let chrs = map
            .chrs
            .into_iter()
            .map(|junctions| ChrJunctions {
                used: junctions.iter().map(|_| AtomicBool::new(false)).collect(),
                junctions,
            })
            .collect();

        let locks = RangeLocks::new(genome.chromosomes().iter().map(|c| c.len()));

        Self {
            k,
            vertices: map.vertices,
            genome,
            chrs,
            by_vertex,
            locks,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }
    /// Unsigned vertex ids are `1..vertices_number()`.
    pub fn vertices_number(&self) -> i64 {
        self.vertices
    }
    pub fn instances_count(&self, vertex: i64) -> usize {
        self.by_vertex[vertex.unsigned_abs() as usize].len()
    }

    pub fn chr_number(&self) -> usize {
        self.chrs.len()
    }
    pub fn chr_sequence(&self, chr: usize) -> &MaybeDnaSequence {
        self.genome[chr].sequence()
    }
    pub fn chr_description(&self, chr: usize) -> &str {
        self.genome[chr].description()
    }
    pub fn chr_size(&self, chr: usize) -> usize {
        self.genome[chr].len()
    }
    pub fn junction_count(&self, chr: usize) -> usize {
        self.chrs[chr].junctions.len()
    }

    /// All occurrences of the signed vertex `v`, as sequential cursors on
    /// the strand where that occurrence reads as `v`.
    pub fn occurrences(&self, v: i64) -> impl Iterator<Item = SeqIter<'_>> + '_ {
        self.by_vertex[v.unsigned_abs() as usize]
            .iter()
            .map(move |occ| {
                let stored = self.chrs[occ.chr as usize].junctions[occ.idx as usize].vertex;
                SeqIter {
                    storage: self,
                    chr: occ.chr,
                    idx: i64::from(occ.idx),
                    positive: stored == v,
                }
            })
    }

    /// Locks the forward-coordinate span covered by the junction range
    /// `[begin, end]` (both positive strand), appending guards to `held`.
    /// See [`RangeLocks`] for the ordering contract.
    pub fn lock_range<'a>(
        &'a self,
        begin: SeqIter<'_>,
        end: SeqIter<'_>,
        hint: &mut LockHint,
        held: &mut Vec<MutexGuard<'a, ()>>,
    ) {
        debug_assert!(begin.positive && end.positive);
        debug_assert_eq!(begin.chr, end.chr);
        self.locks.lock_range(
            begin.chr_id(),
            begin.kmer_start(),
            end.kmer_start() + self.k,
            hint,
            held,
        );
    }

    fn junction(&self, chr: u32, idx: i64) -> &Junction {
        &self.chrs[chr as usize].junctions[idx as usize]
    }
}

/// An oriented step between two adjacent junctions on one strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    start: i64,
    end: i64,
    label: MaybeDnaBase,
    length: i64,
}

impl Edge {
    pub fn start_vertex(&self) -> i64 {
        self.start
    }
    pub fn end_vertex(&self) -> i64 {
        self.end
    }
    pub fn label(&self) -> MaybeDnaBase {
        self.label
    }
    pub fn length(&self) -> i64 {
        self.length
    }
}

/// A cursor over one chromosome's junction list, on one strand.
///
/// Stepping forward moves toward higher indices on the positive strand and
/// lower indices on the negative strand; `position` strictly increases
/// along traversal on both strands. A cursor may step off either end and
/// become invalid; accessors other than `valid` assume a valid cursor.
#[derive(Clone, Copy)]
pub struct SeqIter<'a> {
    storage: &'a JunctionStorage,
    chr: u32,
    idx: i64,
    positive: bool,
}

impl PartialEq for SeqIter<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.chr == other.chr && self.idx == other.idx && self.positive == other.positive
    }
}
impl Eq for SeqIter<'_> {}

impl fmt::Debug for SeqIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqIter")
            .field("chr", &self.chr)
            .field("idx", &self.idx)
            .field("strand", &if self.positive { '+' } else { '-' })
            .finish()
    }
}

impl<'a> SeqIter<'a> {
    pub fn valid(&self) -> bool {
        self.idx >= 0 && (self.idx as usize) < self.storage.junction_count(self.chr as usize)
    }

    pub fn next(mut self) -> Self {
        self.idx += if self.positive { 1 } else { -1 };
        self
    }
    pub fn prev(mut self) -> Self {
        self.idx += if self.positive { -1 } else { 1 };
        self
    }

    /// The same junction occurrence read on the opposite strand.
    pub fn reverse(mut self) -> Self {
        self.positive = !self.positive;
        self
    }

    pub fn chr_id(&self) -> usize {
        self.chr as usize
    }
    pub fn index(&self) -> usize {
        self.idx as usize
    }
    pub fn is_positive_strand(&self) -> bool {
        self.positive
    }

    pub fn vertex_id(&self) -> i64 {
        let stored = self.storage.junction(self.chr, self.idx).vertex;
        if self.positive { stored } else { -stored }
    }

    /// Forward coordinate of the junction k-mer's first base.
    pub fn kmer_start(&self) -> usize {
        self.storage.junction(self.chr, self.idx).pos as usize
    }

    /// Strand-relative position: the forward coordinate on the positive
    /// strand, `-(pos + k)` on the negative strand. Strictly increasing
    /// along traversal either way.
    pub fn position(&self) -> i64 {
        let pos = self.kmer_start() as i64;
        if self.positive {
            pos
        } else {
            -(pos + self.storage.k as i64)
        }
    }

    /// Strand-free forward coordinate used for branch-distance checks.
    pub fn absolute_position(&self) -> i64 {
        let pos = self.kmer_start() as i64;
        if self.positive {
            pos
        } else {
            pos + self.storage.k as i64
        }
    }

    /// The base labeling the outgoing step in traversal orientation, or
    /// `None` at the chromosome end.
    pub fn edge_char(&self) -> Option<MaybeDnaBase> {
        let seq: &MaybeDnaSequence = self.storage.chr_sequence(self.chr as usize);
        if self.positive {
            seq.get(self.kmer_start() + self.storage.k).copied()
        } else {
            let p = self.kmer_start().checked_sub(1)?;
            Some(seq[p].complement())
        }
    }

    pub fn is_used(&self) -> bool {
        self.storage.chrs[self.chr as usize].used[self.idx as usize].load(Ordering::Acquire)
    }
    pub fn mark_used(&self) {
        self.storage.chrs[self.chr as usize].used[self.idx as usize].store(true, Ordering::Release);
    }

    pub fn outgoing_edge(&self) -> Option<Edge> {
        let next = self.next();
        if !next.valid() {
            return None;
        }
        Some(Edge {
            start: self.vertex_id(),
            end: next.vertex_id(),
            label: self.edge_char()?,
            length: next.position() - self.position(),
        })
    }
    pub fn ingoing_edge(&self) -> Option<Edge> {
        let prev = self.prev();
        if !prev.valid() {
            return None;
        }
        prev.outgoing_edge()
    }
}
