//! The shared per-junction assignment table.
//!
//! Every (chromosome, junction index) cell is an atomic word: `0` means
//! unclaimed, a negative value is a transient soft-lock tagged with the
//! claiming path, and a positive value is the id of the block the junction
//! was committed to. Commits are absorbing.
//!
//! Claims are tagged with (worker, path role) rather than being anonymous.
//! A worker runs two paths, the growth path and the finalizer that
//! re-grows the best path over the same junctions, so the sibling path's
//! claims must read as passable while a path's *own* claims still act as
//! walls (two instances of one path may never take the same junction).
//! Claims of other workers are always walls. All transitions are
//! compare-exchange, so two workers racing for a cell resolve without
//! locks: the loser behaves exactly as if the cell had already been taken
//! when it looked.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::storage::{JunctionStorage, SeqIter};

pub const UNKNOWN_BLOCK: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerId(pub u32);

/// Identity of one path object: the worker it belongs to and whether it is
/// the worker's finalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTag {
    worker: WorkerId,
    finalizer: bool,
}

impl PathTag {
    pub fn growth(worker: WorkerId) -> Self {
        Self {
            worker,
            finalizer: false,
        }
    }
    pub fn finalizer(worker: WorkerId) -> Self {
        Self {
            worker,
            finalizer: true,
        }
    }
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    fn encode(self) -> i64 {
        -(i64::from(self.worker.0) * 2 + i64::from(self.finalizer) + 1)
    }
    fn decode(value: i64) -> Self {
        debug_assert!(value < 0);
        let raw = -value - 1;
        Self {
            worker: WorkerId((raw / 2) as u32),
            finalizer: raw % 2 == 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Unknown,
    InUse(PathTag),
    Committed(i64),
}

pub struct AssignmentTable {
    cells: Vec<Vec<AtomicI64>>,
}

impl AssignmentTable {
    pub fn new(storage: &JunctionStorage) -> Self {
        let cells = (0..storage.chr_number())
            .map(|chr| {
                (0..storage.junction_count(chr))
                    .map(|_| AtomicI64::new(UNKNOWN_BLOCK))
                    .collect()
            })
            .collect();
        Self { cells }
    }

    fn cell(&self, it: &SeqIter<'_>) -> &AtomicI64 {
        &self.cells[it.chr_id()][it.index()]
    }

    pub fn state(&self, it: &SeqIter<'_>) -> CellState {
        match self.cell(it).load(Ordering::Acquire) {
            UNKNOWN_BLOCK => CellState::Unknown,
            v if v > 0 => CellState::Committed(v),
            v => CellState::InUse(PathTag::decode(v)),
        }
    }

    /// Whether `tag` may seed on, extend onto, or look across this
    /// junction: it is unclaimed, or held by the same worker's sibling
    /// path.
    pub fn is_free_for(&self, it: &SeqIter<'_>, tag: PathTag) -> bool {
        match self.cell(it).load(Ordering::Acquire) {
            UNKNOWN_BLOCK => true,
            v if v > 0 => false,
            v => v != tag.encode() && PathTag::decode(v).worker == tag.worker,
        }
    }

    /// Claims the junction for `tag`. Fails on the path's own claims, on
    /// other workers' claims, and on committed cells.
    pub fn try_claim(&self, it: &SeqIter<'_>, tag: PathTag) -> bool {
        let mine = tag.encode();
        let cell = self.cell(it);
        match cell.compare_exchange(UNKNOWN_BLOCK, mine, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => true,
            Err(current) => {
                if current < 0
                    && current != mine
                    && PathTag::decode(current).worker == tag.worker
                {
                    // Take over the sibling path's claim; re-checked so a
                    // concurrent commit cannot be overwritten.
                    cell.compare_exchange(current, mine, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                } else {
                    false
                }
            }
        }
    }

    /// Reverts the path's own claim. A cell meanwhile committed, taken
    /// over by the sibling, or re-claimed by another worker is left alone.
    pub fn release(&self, it: &SeqIter<'_>, tag: PathTag) {
        let _ = self.cell(it).compare_exchange(
            tag.encode(),
            UNKNOWN_BLOCK,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Permanently assigns the junction to a committed block.
    pub fn commit(&self, it: &SeqIter<'_>, block_id: i64) {
        debug_assert!(block_id > 0);
        self.cell(it).store(block_id, Ordering::Release);
    }
}
