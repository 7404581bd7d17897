// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree storage with a Guttman insert path and an `R*`-style overflow
//! split.
//!
//! Nodes live in a flat arena (`Vec<Node<V>>`) addressed by index, the same
//! shape the box-tree scene graph in the wider workspace uses for its node
//! storage — a generation-free version of it, since entries here are
//! invalidated by tombstoning rather than freed and reused.
//!
//! Removal never restructures the tree: overwritten entries are marked
//! inactive in place and skipped by every traversal. This keeps a single
//! `insert` to a bounded number of node visits instead of a possible
//! underflow cascade back up to the root.

use alloc::vec;
use alloc::vec::Vec;

use crate::backend::Backend;
use crate::geometry::{extent_of, subtract, Extent};
use crate::rect::{Measure, Rect};

/// Minimum fan-out a non-root node is allowed to fall to before the
/// overflow split routine would be asked to keep that many per side. Chosen,
/// along with [`MAX`], to match the textbook Guttman/`R*` parameterization.
const MIN: usize = 4;
/// Maximum fan-out before a node is split.
const MAX: usize = 10;

struct Leaf<V> {
    rect: Rect,
    value: V,
    active: bool,
}

enum Kind<V> {
    Leaf(Vec<Leaf<V>>),
    Internal(Vec<usize>),
}

struct Node<V> {
    mbr: Rect,
    kind: Kind<V>,
}

/// Rectangle storage backed by an R-tree: minimum-area-enlargement insertion
/// with an `R*` perimeter/overlap split on overflow.
#[derive(Debug)]
pub struct RTreeIndex<V> {
    nodes: Vec<Node<V>>,
    root: Option<usize>,
}

impl<V> core::fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.kind {
            Kind::Leaf(entries) => f.debug_struct("Leaf").field("mbr", &self.mbr).field("entries", &entries.len()).finish(),
            Kind::Internal(children) => {
                f.debug_struct("Internal").field("mbr", &self.mbr).field("children", &children.len()).finish()
            }
        }
    }
}

/// Diagnostic counters exposed for callers tuning fan-out or investigating
/// fragmentation; not used by `insert`/`query` themselves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct RTreeStats {
    /// Number of arena nodes reachable from the root.
    pub node_count: usize,
    /// Longest root-to-leaf path, in edges.
    pub depth: usize,
    /// Total lattice-point area double-counted by overlapping sibling MBRs.
    pub sibling_overlap_area: i128,
    /// Total lattice-point area inside a node's MBR not covered by any child
    /// MBR.
    pub dead_space_area: i128,
}

impl<V> Default for RTreeIndex<V> {
    fn default() -> Self {
        Self { nodes: Vec::new(), root: None }
    }
}

impl<V> RTreeIndex<V> {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push_node(&mut self, node: Node<V>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Diagnostic snapshot of the tree's shape.
    #[must_use]
    pub fn metrics(&self) -> RTreeStats {
        let Some(root) = self.root else { return RTreeStats::default() };
        let mut stats = RTreeStats { node_count: self.nodes.len(), ..RTreeStats::default() };
        self.walk_metrics(root, 0, &mut stats);
        stats
    }

    fn walk_metrics(&self, idx: usize, depth: usize, stats: &mut RTreeStats) {
        stats.depth = stats.depth.max(depth);
        if let Kind::Internal(children) = &self.nodes[idx].kind {
            let mbrs: Vec<Rect> = children.iter().map(|&c| self.nodes[c].mbr).collect();
            for i in 0..mbrs.len() {
                for j in (i + 1)..mbrs.len() {
                    if let Some(overlap) = mbrs[i].intersection(&mbrs[j]) {
                        if let Measure::Finite(area) = area_measure(&overlap) {
                            stats.sibling_overlap_area += area;
                        }
                    }
                }
            }
            let children_area: i128 =
                mbrs.iter().filter_map(|r| if let Measure::Finite(a) = area_measure(r) { Some(a) } else { None }).sum();
            if let Measure::Finite(own) = area_measure(&self.nodes[idx].mbr) {
                stats.dead_space_area += (own - children_area).max(0);
            }
            for &c in children {
                self.walk_metrics(c, depth + 1, stats);
            }
        }
    }
}

fn area_measure(rect: &Rect) -> Measure {
    rect.area()
}

trait Bounded {
    fn bounds(&self) -> Rect;
}

impl<V> Bounded for Leaf<V> {
    fn bounds(&self) -> Rect {
        self.rect
    }
}

struct ChildRef {
    idx: usize,
    mbr: Rect,
}

impl Bounded for ChildRef {
    fn bounds(&self) -> Rect {
        self.mbr
    }
}

fn union_all<T: Bounded>(items: &[T]) -> Rect {
    let mut iter = items.iter();
    let first = iter.next().expect("rtree invariant violated: split group must be non-empty").bounds();
    iter.fold(first, |acc, item| acc.union(&item.bounds()))
}

fn lower_bound(item: &impl Bounded, axis: usize) -> crate::rect::Coord {
    let r = item.bounds();
    if axis == 0 { r.x1() } else { r.y1() }
}

/// Sorts `items` by `axis`'s lower bound and, scanning every valid
/// distribution `k`, returns `(total perimeter margin summed over every k,
/// the k with least overlap area, that overlap area)`.
fn best_distribution<T: Bounded>(items: &mut [T], axis: usize) -> (Measure, usize, Measure) {
    items.sort_by(|a, b| lower_bound(a, axis).cmp(&lower_bound(b, axis)));
    let n = items.len();
    let mut margin_total = Measure::ZERO;
    let mut best_k = MIN;
    let mut best_overlap = Measure::Infinite;
    for k in MIN..=(n - MIN) {
        let r1 = union_all(&items[..k]);
        let r2 = union_all(&items[k..]);
        margin_total = margin_total.add(r1.margin()).add(r2.margin());
        let overlap = match r1.intersection(&r2) {
            Some(o) => o.area(),
            None => Measure::ZERO,
        };
        if overlap < best_overlap {
            best_overlap = overlap;
            best_k = k;
        }
    }
    (margin_total, best_k, best_overlap)
}

/// Chooses the split axis by minimum total perimeter margin across all
/// candidate distributions, then the split index along that axis by minimum
/// overlap area between the two resulting groups.
fn split_entries<T: Bounded>(mut items: Vec<T>) -> (Vec<T>, Vec<T>) {
    let (margin_x, k_x, _) = best_distribution(&mut items, 0);
    let (margin_y, k_y, _) = best_distribution(&mut items, 1);
    let (axis, k) = if margin_x <= margin_y { (0, k_x) } else { (1, k_y) };
    // `best_distribution` leaves `items` sorted by whichever axis it last
    // evaluated (y); re-sort by the winning axis before splitting.
    items.sort_by(|a, b| lower_bound(a, axis).cmp(&lower_bound(b, axis)));
    let tail = items.split_off(k);
    (items, tail)
}

impl<V> RTreeIndex<V> {
    fn choose_subtree(&self, children: &[usize], rect: Rect) -> usize {
        *children
            .iter()
            .min_by_key(|&&c| {
                let mbr = self.nodes[c].mbr;
                let enlarged = mbr.union(&rect);
                (enlarged.area().sub(mbr.area()), mbr.area())
            })
            .expect("rtree invariant violated: internal node must have at least one child")
    }

    /// Inserts `rect`/`value` at or below `node_idx`, expanding MBRs along
    /// the path. Returns the index of a freshly split sibling node when the
    /// visited node overflowed.
    fn insert_into(&mut self, node_idx: usize, rect: Rect, value: V) -> Option<usize> {
        self.nodes[node_idx].mbr = self.nodes[node_idx].mbr.union(&rect);
        let is_leaf = matches!(self.nodes[node_idx].kind, Kind::Leaf(_));
        if is_leaf {
            if let Kind::Leaf(entries) = &mut self.nodes[node_idx].kind {
                entries.push(Leaf { rect, value, active: true });
            }
            return self.maybe_split_leaf(node_idx);
        }

        let child_idx = {
            let Kind::Internal(children) = &self.nodes[node_idx].kind else { unreachable!() };
            self.choose_subtree(children, rect)
        };
        let sibling = self.insert_into(child_idx, rect, value);
        if let Some(sibling) = sibling {
            if let Kind::Internal(children) = &mut self.nodes[node_idx].kind {
                children.push(sibling);
            }
            self.maybe_split_internal(node_idx)
        } else {
            None
        }
    }

    fn maybe_split_leaf(&mut self, node_idx: usize) -> Option<usize> {
        let Kind::Leaf(entries) = &self.nodes[node_idx].kind else { unreachable!() };
        if entries.len() <= MAX {
            return None;
        }
        let Kind::Leaf(entries) = core::mem::replace(&mut self.nodes[node_idx].kind, Kind::Leaf(Vec::new())) else {
            unreachable!()
        };
        let (group_a, group_b) = split_entries(entries);
        let mbr_a = union_all(&group_a);
        let mbr_b = union_all(&group_b);
        self.nodes[node_idx] = Node { mbr: mbr_a, kind: Kind::Leaf(group_a) };
        Some(self.push_node(Node { mbr: mbr_b, kind: Kind::Leaf(group_b) }))
    }

    fn maybe_split_internal(&mut self, node_idx: usize) -> Option<usize> {
        let Kind::Internal(children) = &self.nodes[node_idx].kind else { unreachable!() };
        if children.len() <= MAX {
            return None;
        }
        let Kind::Internal(children) = core::mem::replace(&mut self.nodes[node_idx].kind, Kind::Internal(Vec::new()))
        else {
            unreachable!()
        };
        let refs: Vec<ChildRef> = children.into_iter().map(|idx| ChildRef { mbr: self.nodes[idx].mbr, idx }).collect();
        let (group_a, group_b) = split_entries(refs);
        let mbr_a = union_all(&group_a);
        let mbr_b = union_all(&group_b);
        self.nodes[node_idx] = Node { mbr: mbr_a, kind: Kind::Internal(group_a.into_iter().map(|c| c.idx).collect()) };
        Some(self.push_node(Node { mbr: mbr_b, kind: Kind::Internal(group_b.into_iter().map(|c| c.idx).collect()) }))
    }

    fn insert_one(&mut self, rect: Rect, value: V) {
        let Some(root_idx) = self.root else {
            let node = Node { mbr: rect, kind: Kind::Leaf(vec![Leaf { rect, value, active: true }]) };
            self.root = Some(self.push_node(node));
            return;
        };
        if let Some(sibling_idx) = self.insert_into(root_idx, rect, value) {
            let mbr = self.nodes[root_idx].mbr.union(&self.nodes[sibling_idx].mbr);
            let new_root = self.push_node(Node { mbr, kind: Kind::Internal(vec![root_idx, sibling_idx]) });
            self.root = Some(new_root);
        }
    }

    /// Marks every active leaf entry intersecting `rect` inactive, returning
    /// the `(rect, value)` pairs that were covering it. MBRs are left as-is —
    /// tombstoning trades a temporarily loose bounding box for never having
    /// to restructure the tree on removal.
    fn tombstone_intersecting(&mut self, node_idx: usize, rect: Rect, out: &mut Vec<(Rect, V)>)
    where
        V: Clone,
    {
        if !self.nodes[node_idx].mbr.intersects(&rect) {
            return;
        }
        match &mut self.nodes[node_idx].kind {
            Kind::Leaf(entries) => {
                for entry in entries.iter_mut() {
                    if entry.active && entry.rect.intersects(&rect) {
                        out.push((entry.rect, entry.value.clone()));
                        entry.active = false;
                    }
                }
            }
            Kind::Internal(children) => {
                let children = children.clone();
                for child in children {
                    self.tombstone_intersecting(child, rect, out);
                }
            }
        }
    }
}

impl<V: Clone> Backend<V> for RTreeIndex<V> {
    fn insert(&mut self, rect: Rect, value: V) {
        if rect.is_all() {
            self.nodes.clear();
            self.root = None;
            self.insert_one(rect, value);
            return;
        }

        let mut displaced = Vec::new();
        if let Some(root_idx) = self.root {
            self.tombstone_intersecting(root_idx, rect, &mut displaced);
        }

        for (old_rect, old_value) in displaced {
            for piece in subtract(old_rect, rect) {
                self.insert_one(piece, old_value.clone());
            }
        }
        self.insert_one(rect, value);
    }

    fn visit<F: FnMut(Rect, &V)>(&self, q: Rect, mut f: F) {
        fn walk<V>(nodes: &[Node<V>], idx: usize, q: Rect, f: &mut impl FnMut(Rect, &V)) {
            if !nodes[idx].mbr.intersects(&q) {
                return;
            }
            match &nodes[idx].kind {
                Kind::Leaf(entries) => {
                    for entry in entries {
                        if entry.active && entry.rect.intersects(&q) {
                            f(entry.rect, &entry.value);
                        }
                    }
                }
                Kind::Internal(children) => {
                    for &child in children {
                        walk(nodes, child, q, f);
                    }
                }
            }
        }
        if let Some(root) = self.root {
            walk(&self.nodes, root, q, &mut f);
        }
    }

    fn extent(&self) -> Extent {
        let mut rects = Vec::new();
        self.visit(Rect::ALL, |r, _| rects.push(r));
        extent_of(rects.iter())
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    fn len(&self) -> usize {
        let mut count = 0;
        self.visit(Rect::ALL, |_, _| count += 1);
        count
    }
}
