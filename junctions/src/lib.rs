//! The junction layer of the de Bruijn graph: canonical k-mer vertices,
//! per-chromosome junction occurrence lists, sequential cursors over them,
//! and the shared claim/lock machinery the block finder coordinates through.

pub mod assign;
pub mod graph;
pub mod locks;
pub mod storage;

pub use assign::{AssignmentTable, CellState, PathTag, WorkerId};
pub use locks::{LockHint, RangeLocks};
pub use storage::{Edge, JunctionStorage, SeqIter};
