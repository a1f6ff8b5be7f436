//! A path through the junction graph together with all its genomic
//! realizations (instances), grown edge by edge at both ends.

use junctions::{AssignmentTable, Edge, JunctionStorage, PathTag, SeqIter};

use crate::{config::FinderConfig, distance::DistanceKeeper};

/// One genomic realization of the path: the junction range it currently
/// claims on one chromosome strand. `front` precedes `back` in traversal
/// order (`front.position() <= back.position()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instance<'a> {
    front: SeqIter<'a>,
    back: SeqIter<'a>,
}

impl<'a> Instance<'a> {
    fn seeded_at(it: SeqIter<'a>) -> Self {
        Self {
            front: it,
            back: it,
        }
    }

    pub fn front(&self) -> SeqIter<'a> {
        self.front
    }
    pub fn back(&self) -> SeqIter<'a> {
        self.back
    }
    pub fn single_point(&self) -> bool {
        self.front == self.back
    }
}

/// One edge of the path body, with the distance of its start vertex from
/// the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    edge: Edge,
    start_distance: i64,
}

impl Point {
    fn new(edge: Edge, start_distance: i64) -> Self {
        Self {
            edge,
            start_distance,
        }
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }
    pub fn start_distance(&self) -> i64 {
        self.start_distance
    }
    pub fn end_distance(&self) -> i64 {
        self.start_distance + self.edge.length()
    }
}

pub struct Path<'a> {
    storage: &'a JunctionStorage,
    assignment: &'a AssignmentTable,
    tag: PathTag,

    origin: i64,
    /// Edges grown leftward, nearest-to-origin first.
    left_body: Vec<Point>,
    /// Edges grown rightward, nearest-to-origin first.
    right_body: Vec<Point>,
    instances: Vec<Instance<'a>>,
    distance: DistanceKeeper,

    min_chain_size: i64,
    max_branch_size: i64,
    max_flanking_size: i64,
}

impl<'a> Path<'a> {
    pub fn new(
        storage: &'a JunctionStorage,
        assignment: &'a AssignmentTable,
        tag: PathTag,
        config: &FinderConfig,
    ) -> Self {
        Self {
            storage,
            assignment,
            tag,
            origin: 0,
            left_body: Vec::new(),
            right_body: Vec::new(),
            instances: Vec::new(),
            distance: DistanceKeeper::new(storage.vertices_number()),
            min_chain_size: config.min_chain_size(),
            max_branch_size: config.max_branch_size,
            max_flanking_size: config.max_flanking_size,
        }
    }

    /// Anchors the path at `origin` and seeds one instance per occurrence
    /// this worker may still claim. The path must be cleared.
    pub fn init(&mut self, origin: i64) {
        debug_assert!(self.instances.is_empty());
        self.origin = origin;
        self.distance.set(origin, 0);
        for it in self.storage.occurrences(origin) {
            if self.assignment.is_free_for(&it, self.tag) {
                self.instances.push(Instance::seeded_at(it));
            }
        }
    }

    /// Reverts every soft-lock this path still holds and empties it.
    pub fn clear(&mut self) {
        self.distance.unset(self.origin);
        for inst in &self.instances {
            let mut it = inst.front;
            loop {
                self.assignment.release(&it, self.tag);
                if it == inst.back {
                    break;
                }
                it = it.next();
            }
        }
        for p in self.left_body.iter().chain(&self.right_body) {
            self.distance.unset(p.edge.start_vertex());
            self.distance.unset(p.edge.end_vertex());
        }
        self.left_body.clear();
        self.right_body.clear();
        self.instances.clear();
    }

    pub fn origin(&self) -> i64 {
        self.origin
    }
    pub fn instances(&self) -> &[Instance<'a>] {
        &self.instances
    }
    pub fn good_instances(&self) -> impl Iterator<Item = &Instance<'a>> + '_ {
        self.instances.iter().filter(|i| self.is_good_instance(i))
    }
    pub fn good_instances_count(&self) -> i64 {
        self.good_instances().count() as i64
    }

    pub fn left_size(&self) -> usize {
        self.left_body.len() + 1
    }
    pub fn right_size(&self) -> usize {
        self.right_body.len() + 1
    }
    pub fn left_point(&self, i: usize) -> Point {
        self.left_body[i]
    }
    pub fn right_point(&self, i: usize) -> Point {
        self.right_body[i]
    }

    pub fn left_vertex(&self) -> i64 {
        self.left_body
            .last()
            .map_or(self.origin, |p| p.edge.start_vertex())
    }
    pub fn right_vertex(&self) -> i64 {
        self.right_body
            .last()
            .map_or(self.origin, |p| p.edge.end_vertex())
    }

    pub fn middle_path_length(&self) -> i64 {
        let right = self.right_body.last().map_or(0, Point::end_distance);
        let left = self.left_body.last().map_or(0, Point::start_distance);
        right - left
    }

    /// Whether a vertex is already part of the path body.
    pub fn is_in_path(&self, vertex: i64) -> bool {
        self.distance.is_set(vertex)
    }

    fn left_end_distance(&self) -> i64 {
        self.left_body.last().map_or(0, Point::start_distance)
    }
    fn right_end_distance(&self) -> i64 {
        self.right_body.last().map_or(0, Point::end_distance)
    }

    fn left_flank_distance(&self, inst: &Instance<'a>) -> i64 {
        self.distance.get(inst.front.vertex_id())
    }
    fn right_flank_distance(&self, inst: &Instance<'a>) -> i64 {
        self.distance.get(inst.back.vertex_id())
    }

    /// `(matched_length, score)` of one instance: the matched span minus
    /// both unmatched flanks.
    pub fn instance_score(&self, inst: &Instance<'a>) -> (i64, i64) {
        let left_flank = (self.left_flank_distance(inst) - self.left_end_distance()).abs();
        let right_flank = (self.right_flank_distance(inst) - self.right_end_distance()).abs();
        let length = (inst.front.position() - inst.back.position()).abs();
        (length, length - left_flank - right_flank)
    }

    pub fn is_good_instance(&self, inst: &Instance<'a>) -> bool {
        let (length, _) = self.instance_score(inst);
        length >= self.min_chain_size
    }

    /// Total path score; with `final_only` only good instances count.
    pub fn score(&self, final_only: bool) -> i64 {
        self.instances
            .iter()
            .map(|inst| {
                let (length, score) = self.instance_score(inst);
                if !final_only || length >= self.min_chain_size {
                    score
                } else {
                    0
                }
            })
            .sum()
    }

    /// Appends `e` on the right. Fails on a cycle. May advance, seed, or
    /// (via the flank guard) refuse and fully undo; on `false` the path is
    /// unchanged.
    pub fn push_back(&mut self, e: Edge) -> bool {
        let vertex = e.end_vertex();
        if self.distance.is_set(vertex) {
            return false;
        }
        let start_distance = self.right_end_distance();
        let end_distance = start_distance + e.length();
        self.distance.set(vertex, end_distance);

        for i in 0..self.instances.len() {
            let inst = self.instances[i];
            let start_it = inst.back;
            let first = start_it.next();
            if !first.valid() || !self.assignment.is_free_for(&first, self.tag) {
                continue;
            }

            let mut reached = None;
            if start_it.vertex_id() == e.start_vertex()
                && first.vertex_id() == vertex
                && start_it.edge_char() == Some(e.label())
            {
                reached = Some(first);
            } else if (end_distance - self.right_flank_distance(&inst)).abs()
                <= self.max_branch_size
            {
                let mut now = first;
                while now.valid()
                    && self.assignment.is_free_for(&now, self.tag)
                    && (now.position() - start_it.position()).abs() <= self.max_branch_size
                {
                    if now.vertex_id() == vertex {
                        reached = Some(now);
                        break;
                    }
                    now = now.next();
                }
            }

            let Some(now) = reached else { continue };

            let next_length = (now.position() - inst.front.position()).abs();
            let left_flank = (self.left_flank_distance(&inst) - self.left_end_distance()).abs();
            if next_length >= self.min_chain_size && left_flank > self.max_flanking_size {
                // This instance already qualifies and its far flank would
                // outgrow the limit: refuse the whole push and undo the
                // instances advanced so far.
                self.right_body.push(Point::new(e, start_distance));
                self.pop_back();
                return false;
            }

            if self.assignment.try_claim(&now, self.tag) {
                self.instances[i].back = now;
            }
        }

        for it in self.storage.occurrences(vertex) {
            if self.assignment.try_claim(&it, self.tag) {
                self.instances.push(Instance::seeded_at(it));
            }
        }

        self.right_body.push(Point::new(e, start_distance));
        true
    }

    /// Removes the rightmost edge, retracting or deleting the instances
    /// that ended on it.
    pub fn pop_back(&mut self) {
        let last = self
            .right_body
            .pop()
            .expect("pop_back on an empty right body");
        let last_vertex = last.edge.end_vertex();
        self.distance.unset(last_vertex);

        let mut i = self.instances.len();
        while i > 0 {
            i -= 1;
            let inst = self.instances[i];
            if inst.back.vertex_id() != last_vertex {
                continue;
            }
            self.assignment.release(&inst.back, self.tag);
            if inst.single_point() {
                debug_assert_eq!(i, self.instances.len() - 1);
                self.instances.remove(i);
            } else {
                let mut jt = inst.back.prev();
                while !self.distance.is_set(jt.vertex_id()) {
                    jt = jt.prev();
                }
                self.instances[i].back = jt;
            }
        }
    }

    /// Mirror of [`Path::push_back`] on the left end.
    pub fn push_front(&mut self, e: Edge) -> bool {
        let vertex = e.start_vertex();
        if self.distance.is_set(vertex) {
            return false;
        }
        let end_distance = self.left_end_distance();
        let start_distance = end_distance - e.length();
        self.distance.set(vertex, start_distance);

        for i in 0..self.instances.len() {
            let inst = self.instances[i];
            let start_it = inst.front;
            let first = start_it.prev();
            if !first.valid() || !self.assignment.is_free_for(&first, self.tag) {
                continue;
            }

            let mut reached = None;
            if first.vertex_id() == vertex
                && start_it.vertex_id() == e.end_vertex()
                && first.edge_char() == Some(e.label())
            {
                reached = Some(first);
            } else if (end_distance - self.left_flank_distance(&inst)).abs()
                <= self.max_branch_size
            {
                let mut now = first;
                while now.valid()
                    && self.assignment.is_free_for(&now, self.tag)
                    && (now.position() - start_it.position()).abs() <= self.max_branch_size
                {
                    if now.vertex_id() == vertex {
                        reached = Some(now);
                        break;
                    }
                    now = now.prev();
                }
            }

            let Some(now) = reached else { continue };

            let next_length = (now.position() - inst.back.position()).abs();
            let right_flank = (self.right_flank_distance(&inst) - self.right_end_distance()).abs();
            if next_length >= self.min_chain_size && right_flank > self.max_flanking_size {
                self.left_body.push(Point::new(e, start_distance));
                self.pop_front();
                return false;
            }

            if self.assignment.try_claim(&now, self.tag) {
                self.instances[i].front = now;
            }
        }

        for it in self.storage.occurrences(vertex) {
            if self.assignment.try_claim(&it, self.tag) {
                self.instances.push(Instance::seeded_at(it));
            }
        }

        self.left_body.push(Point::new(e, start_distance));
        true
    }

    /// Mirror of [`Path::pop_back`] on the left end.
    pub fn pop_front(&mut self) {
        let last = self
            .left_body
            .pop()
            .expect("pop_front on an empty left body");
        let last_vertex = last.edge.start_vertex();
        self.distance.unset(last_vertex);

        let mut i = self.instances.len();
        while i > 0 {
            i -= 1;
            let inst = self.instances[i];
            if inst.front.vertex_id() != last_vertex {
                continue;
            }
            self.assignment.release(&inst.front, self.tag);
            if inst.single_point() {
                debug_assert_eq!(i, self.instances.len() - 1);
                self.instances.remove(i);
            } else {
                let mut jt = inst.front.next();
                while !self.distance.is_set(jt.vertex_id()) {
                    jt = jt.next();
                }
                self.instances[i].front = jt;
            }
        }
    }
}
