//! Greedy path growth for one seed vertex: grow right while the score
//! keeps improving within the run budget, clip to the best prefix, grow
//! left the same way, then hand the best path to the finalizer.

use junctions::Edge;

use crate::{
    chooser::Chooser,
    config::FinderConfig,
    finalize,
    finder::Shared,
    path::Path,
};

/// Growth is always scored over qualifying instances only.
const SCORE_FULL_CHAINS: bool = true;

/// One chooser round: walk from the winning instance endpoint toward the
/// chosen vertex, pushing each traversed edge. Returns the outcome of the
/// last push, `false` when there is no vertex to grow toward.
fn extend_path_forward(
    path: &mut Path<'_>,
    chooser: &mut Chooser,
    best_right_size: &mut usize,
    best_score: &mut i64,
    now_score: &mut i64,
) -> bool {
    let Some(choice) = chooser.most_popular_vertex(path, true) else {
        return false;
    };
    let mut success = false;
    let mut it = choice.origin;
    while it.vertex_id() != choice.vertex {
        let Some(edge) = it.outgoing_edge() else {
            break;
        };
        success = path.push_back(edge);
        if success {
            *now_score = path.score(SCORE_FULL_CHAINS);
            if *now_score > *best_score {
                *best_score = *now_score;
                *best_right_size = path.right_size();
            }
        }
        it = it.next();
    }
    success
}

fn extend_path_backward(
    path: &mut Path<'_>,
    chooser: &mut Chooser,
    best_left_size: &mut usize,
    best_score: &mut i64,
    now_score: &mut i64,
) -> bool {
    let Some(choice) = chooser.most_popular_vertex(path, false) else {
        return false;
    };
    let mut success = false;
    let mut it = choice.origin;
    while it.vertex_id() != choice.vertex {
        let Some(edge) = it.ingoing_edge() else {
            break;
        };
        success = path.push_front(edge);
        if success {
            *now_score = path.score(SCORE_FULL_CHAINS);
            if *now_score > *best_score {
                *best_score = *now_score;
                *best_left_size = path.left_size();
            }
        }
        it = it.prev();
    }
    success
}

/// Runs the full per-seed cycle, re-exploring after every committed block
/// until the seed is exhausted. `path` and `finalizer` must be cleared.
pub(crate) fn explore_seed<'a>(
    vid: i64,
    path: &mut Path<'a>,
    finalizer: &mut Path<'a>,
    chooser: &mut Chooser,
    config: &FinderConfig,
    shared: &Shared<'a>,
) {
    let min_run = 2 * config.min_block_size.max(config.max_branch_size);
    loop {
        path.init(vid);
        if path.instances().len() < 2 {
            path.clear();
            return;
        }

        let mut best_score = 0;
        let mut now_score = 0;
        let mut best_right_size = path.right_size();
        let mut best_left_size = path.left_size();

        loop {
            let prev_length = path.middle_path_length();
            let mut positive = false;
            let ok = loop {
                if !extend_path_forward(
                    path,
                    chooser,
                    &mut best_right_size,
                    &mut best_score,
                    &mut now_score,
                ) {
                    break false;
                }
                if path.middle_path_length() - prev_length > min_run {
                    break true;
                }
                positive = positive || now_score > 0;
            };
            if !ok || !positive {
                break;
            }
        }

        if best_right_size == 1 {
            path.clear();
            return;
        }

        // Clip back to the best-scoring right prefix before growing left.
        let best_edges: Vec<Edge> = (0..best_right_size - 1)
            .map(|i| path.right_point(i).edge())
            .collect();
        path.clear();
        path.init(vid);
        for e in &best_edges {
            if !path.push_back(*e) {
                break;
            }
        }

        loop {
            let prev_length = path.middle_path_length();
            let mut positive = false;
            let ok = loop {
                if !extend_path_backward(
                    path,
                    chooser,
                    &mut best_left_size,
                    &mut best_score,
                    &mut now_score,
                ) {
                    break false;
                }
                if path.middle_path_length() - prev_length > min_run {
                    break true;
                }
                positive = positive || now_score > 0;
            };
            if !ok || !positive {
                break;
            }
        }

        let committed = best_score > 0
            && finalize::try_finalize_block(path, finalizer, best_right_size, best_left_size, shared);
        path.clear();
        if !committed {
            return;
        }
    }
}
