//! Turns a grown path into a committed block: lock the claimed spans,
//! rebuild the best-scoring path under the locks, and if it still holds up
//! emit the block and retire its junctions.

use std::sync::atomic::Ordering;

use junctions::LockHint;

use crate::{
    block::BlockInstance,
    finder::Shared,
    path::{Instance, Path},
};

/// Returns whether a block was committed. Either way the finalizer path
/// is left cleared and every range lock released.
pub(crate) fn try_finalize_block<'a>(
    current: &Path<'a>,
    finalizer: &mut Path<'a>,
    best_right_size: usize,
    best_left_size: usize,
    shared: &Shared<'a>,
) -> bool {
    let k = shared.storage.k();

    // Lock acquisition must follow one global order; normalize every
    // instance to its forward-strand span and sort.
    let mut lock_instances: Vec<Instance<'a>> = current.good_instances().copied().collect();
    lock_instances.sort_by_key(|inst| {
        let (front, back) = (inst.front(), inst.back());
        let (start, end) = if front.is_positive_strand() {
            (front.kmer_start(), back.kmer_start())
        } else {
            (back.kmer_start(), front.kmer_start())
        };
        (front.chr_id(), start, end)
    });

    let mut hint = LockHint::new();
    let mut held = Vec::new();
    for inst in &lock_instances {
        if inst.front().is_positive_strand() {
            shared
                .storage
                .lock_range(inst.front(), inst.back(), &mut hint, &mut held);
        } else {
            shared.storage.lock_range(
                inst.back().reverse(),
                inst.front().reverse(),
                &mut hint,
                &mut held,
            );
        }
    }

    finalizer.init(current.origin());
    for i in 0..best_right_size.saturating_sub(1) {
        if !finalizer.push_back(current.right_point(i).edge()) {
            break;
        }
    }
    for i in 0..best_left_size.saturating_sub(1) {
        if !finalizer.push_front(current.left_point(i).edge()) {
            break;
        }
    }

    let final_score = finalizer.score(true);
    let final_good = finalizer.good_instances_count();
    let mut committed = false;
    if final_score > 0 && final_good > 1 {
        committed = true;
        let block_id = shared.blocks_found.fetch_add(1, Ordering::SeqCst) + 1;
        let mut records = Vec::new();
        for inst in finalizer.instances() {
            if !finalizer.is_good_instance(inst) {
                continue;
            }
            let (front, back) = (inst.front(), inst.back());
            let record = if front.is_positive_strand() {
                BlockInstance::new(
                    block_id,
                    front.chr_id(),
                    front.kmer_start(),
                    back.kmer_start() + k,
                )
            } else {
                BlockInstance::new(
                    -block_id,
                    front.chr_id(),
                    back.kmer_start(),
                    front.kmer_start() + k,
                )
            };
            records.push(record);

            let mut it = front;
            while it != back {
                it.mark_used();
                shared.assignment.commit(&it, block_id);
                it = it.next();
            }
        }
        log::debug!(
            "committed block {block_id} with {} instance(s)",
            records.len()
        );
        shared
            .blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .append(&mut records);
    }

    finalizer.clear();
    drop(held);
    committed
}
