//! Picks the vertex a path should grow toward next: the adjacent vertex
//! most supported by the path's instances, weighted by instance length.

use junctions::SeqIter;

use crate::{config::FinderConfig, path::Path};

/// The winning vertex and the instance endpoint the walk toward it starts
/// from.
#[derive(Debug, Clone, Copy)]
pub struct Choice<'a> {
    pub vertex: i64,
    pub origin: SeqIter<'a>,
}

pub struct Chooser {
    looking_depth: i64,
    max_branch_size: i64,
    /// Offset turning a signed vertex id into a scratch slot.
    shift: i64,
    count: Vec<u32>,
    touched: Vec<usize>,
}

impl Chooser {
    pub fn new(config: &FinderConfig, vertices: i64) -> Self {
        Self {
            looking_depth: config.looking_depth,
            max_branch_size: config.max_branch_size,
            shift: vertices,
            count: vec![0; (2 * vertices + 1) as usize],
            touched: Vec::new(),
        }
    }

    /// Scans outward from every instance endpoint currently sitting at the
    /// path's end vertex, within the step budget or the branch-size window,
    /// and accumulates length-weighted votes per candidate vertex. Ties
    /// break toward the smaller genomic distance from the endpoint.
    pub fn most_popular_vertex<'a>(
        &mut self,
        path: &Path<'a>,
        forward: bool,
    ) -> Option<Choice<'a>> {
        let start_vid = if forward {
            path.right_vertex()
        } else {
            path.left_vertex()
        };
        let use_good = path.good_instances_count() >= 2;

        let mut best: Option<(u32, i64, Choice<'a>)> = None;
        for inst in path.instances() {
            if use_good && !path.is_good_instance(inst) {
                continue;
            }
            let origin = if forward { inst.back() } else { inst.front() };
            if origin.vertex_id() != start_vid {
                continue;
            }
            let weight = (inst.front().position() - inst.back().position()).unsigned_abs() as u32 + 1;

            let mut it = if forward { origin.next() } else { origin.prev() };
            let mut step = 1;
            while it.valid()
                && (step < self.looking_depth
                    || (it.position() - origin.position()).abs() <= self.max_branch_size)
            {
                let vid = it.vertex_id();
                if path.is_in_path(vid) || it.is_used() {
                    break;
                }

                let slot = (vid + self.shift) as usize;
                if self.count[slot] == 0 {
                    self.touched.push(slot);
                }
                self.count[slot] += weight;

                let diff = (it.absolute_position() - origin.absolute_position()).abs();
                let better = match best {
                    None => true,
                    Some((count, best_diff, _)) => {
                        self.count[slot] > count || (self.count[slot] == count && diff < best_diff)
                    }
                };
                if better {
                    best = Some((self.count[slot], diff, Choice { vertex: vid, origin }));
                }

                it = if forward { it.next() } else { it.prev() };
                step += 1;
            }
        }

        for slot in self.touched.drain(..) {
            self.count[slot] = 0;
        }
        best.map(|(_, _, choice)| choice)
    }
}

#[cfg(test)]
mod tests {
    use gencore::genome::{Chromosome, Genome};
    use junctions::{AssignmentTable, JunctionStorage, PathTag, WorkerId};

    use super::*;

    fn storage(seqs: &[&str], k: usize) -> JunctionStorage {
        let genome: Genome = seqs
            .iter()
            .enumerate()
            .map(|(i, s)| Chromosome::new(format!("chr{i}"), s.parse().unwrap()))
            .collect();
        JunctionStorage::build(genome, k)
    }

    fn config() -> FinderConfig {
        FinderConfig {
            k: 5,
            min_block_size: 20,
            max_branch_size: 2,
            max_flanking_size: 2,
            looking_depth: 4,
            ..Default::default()
        }
    }

    const CHR: &str = "ACGTAGGCTTACCGGATCCATTGGCAATCGTTCAGGACTA";

    #[test]
    fn picks_the_shared_next_vertex() {
        let s = storage(&[CHR, CHR], 5);
        let assignment = AssignmentTable::new(&s);
        let mut path = Path::new(&s, &assignment, PathTag::growth(WorkerId(0)), &config());
        let mut chooser = Chooser::new(&config(), s.vertices_number());

        let origin = s
            .occurrences(1)
            .find(|it| it.is_positive_strand())
            .unwrap();
        path.init(origin.vertex_id());

        let choice = chooser.most_popular_vertex(&path, true).unwrap();
        assert_eq!(choice.vertex, origin.next().vertex_id());
        assert_eq!(choice.origin.vertex_id(), origin.vertex_id());

        // Scratch is cleared between calls: the same query answers the
        // same way.
        let again = chooser.most_popular_vertex(&path, true).unwrap();
        assert_eq!(again.vertex, choice.vertex);
    }

    #[test]
    fn no_candidate_at_a_dead_end() {
        let s = storage(&[CHR, CHR], 5);
        let assignment = AssignmentTable::new(&s);
        let mut path = Path::new(&s, &assignment, PathTag::growth(WorkerId(0)), &config());
        let mut chooser = Chooser::new(&config(), s.vertices_number());

        // The last junction has nothing to the right.
        let mut last = s
            .occurrences(1)
            .find(|it| it.is_positive_strand())
            .unwrap();
        while last.next().valid() {
            last = last.next();
        }
        path.init(last.vertex_id());
        assert!(chooser.most_popular_vertex(&path, true).is_none());
    }

    #[test]
    fn used_junctions_stop_the_scan() {
        let s = storage(&[CHR, CHR], 5);
        let assignment = AssignmentTable::new(&s);
        let mut path = Path::new(&s, &assignment, PathTag::growth(WorkerId(0)), &config());
        let mut chooser = Chooser::new(&config(), s.vertices_number());

        let origin = s
            .occurrences(1)
            .find(|it| it.is_positive_strand())
            .unwrap();
        path.init(origin.vertex_id());

        for it in s.occurrences(origin.next().vertex_id()) {
            it.mark_used();
        }
        assert!(chooser.most_popular_vertex(&path, true).is_none());
    }
}
