// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fragmap: a 2D rectangle index with last-writer-wins decomposition.
//!
//! A `fragmap` key holds a disjoint cover of the infinite integer plane:
//! every `insert` of a rectangle carves that rectangle out of whatever
//! previously occupied the space and keeps the remainder, so queries never
//! see overlapping fragments for the same key.
//!
//! - [`Rect`] is the closed-interval rectangle type, with `±∞` sentinel
//!   coordinates ([`Rect::ALL`] covers the whole plane, [`Rect::ZERO`] the
//!   origin point) and a validated constructor.
//! - [`Backend`] is the storage contract. Two implementations are provided,
//!   picked per key by whichever scales better for that key's fragment
//!   count:
//!   - [`backends::ZOrderIndex`]: a flat vector kept sorted by Morton code.
//!     Cheap and simple while the fragment count stays small.
//!   - [`backends::RTreeIndex`]: an R-tree with an `R*`-style overflow
//!     split, for keys whose fragment count grows large.
//! - [`Partition`] composes many independently-backed keys and answers
//!   `query` with the minimal common refinement across all of them, each
//!   sub-rectangle carrying the bundle of attributes that cover it.
//!
//! # Example
//!
//! ```rust
//! use fragmap::{backends::ZOrderIndex, Backend, Rect};
//!
//! let mut layer: ZOrderIndex<&str> = ZOrderIndex::new();
//! layer.insert(Rect::finite(0, 0, 10, 10).unwrap(), "background");
//! layer.insert(Rect::finite(4, 4, 6, 6).unwrap(), "sprite");
//!
//! // The sprite's rectangle fully replaced the background underneath it;
//! // the background survives as the four strips around it.
//! assert_eq!(layer.len(), 5);
//! ```
//!
//! Composing independent keys with [`Partition`]:
//!
//! ```rust
//! use fragmap::{backends::ZOrderIndex, Partition, Rect};
//!
//! let mut scene: Partition<&str, &str, ZOrderIndex<&str>> = Partition::new();
//! scene.set(Rect::finite(0, 0, 2, 2).unwrap(), "bg", "red");
//! scene.set(Rect::finite(1, 1, 3, 3).unwrap(), "fg", "blue");
//!
//! let joined = scene.query(Rect::finite(0, 0, 3, 3).unwrap());
//! assert!(joined.iter().any(|(_, bundle)| bundle.len() == 2));
//! ```
//!
//! [`RectIndex`] is a convenience alias for callers who just want a default
//! backend without naming one:
//!
//! ```rust
//! use fragmap::{RectIndex, Backend, Rect};
//!
//! let mut small: RectIndex<&str> = RectIndex::new(); // Z-order, for few fragments
//! small.insert(Rect::finite(0, 0, 3, 3).unwrap(), "a");
//!
//! let mut large = RectIndex::<&str>::with_rtree(); // R-tree, for many fragments
//! large.insert(Rect::finite(0, 0, 3, 3).unwrap(), "a");
//! ```

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod geometry;
mod morton;
mod partition;
mod rect;

pub use backend::Backend;
pub use geometry::{Extent, Fragments, extent_of, subtract};
pub use partition::{Bundle, Partition};
pub use rect::{Coord, EdgeFlags, Rect, RectError};

/// The default backend for a standalone key: a [`backends::ZOrderIndex`].
///
/// Picking a backend up front means naming one of [`backends::ZOrderIndex`]
/// or [`backends::RTreeIndex`] directly; `RectIndex` exists for callers who
/// would rather start with the small-population default and reach for
/// [`RectIndex::with_rtree`] only once a key's fragment count grows past it.
pub type RectIndex<V> = backends::ZOrderIndex<V>;

impl<V> RectIndex<V> {
    /// Builds an index using the R-tree backend instead of the Z-order
    /// default, for keys expected to hold many fragments.
    #[must_use]
    pub fn with_rtree() -> backends::RTreeIndex<V> {
        backends::RTreeIndex::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{RTreeIndex, ZOrderIndex};
    use alloc::string::String;
    use alloc::vec::Vec;

    // A single insert is stored and queryable verbatim.
    #[test]
    fn scenario_single_insert_roundtrips() {
        let mut layer: ZOrderIndex<String> = ZOrderIndex::new();
        layer.insert(Rect::finite(0, 0, 4, 4).unwrap(), String::from("a"));
        let hits: Vec<_> = layer.query(Rect::finite(0, 0, 4, 4).unwrap()).collect();
        assert_eq!(hits, [(Rect::finite(0, 0, 4, 4).unwrap(), String::from("a"))]);
    }

    // An infinite half-plane insert followed by a finite overwrite leaves
    // the remainder of the half-plane intact around the finite hole.
    #[test]
    fn scenario_half_plane_then_finite_overwrite() {
        let mut layer: ZOrderIndex<&str> = ZOrderIndex::new();
        let half_plane = Rect::new(Coord::NegInf, Coord::Finite(0), Coord::PosInf, Coord::PosInf).unwrap();
        layer.insert(half_plane, "h");
        layer.insert(Rect::finite(-1, -1, 1, 1).unwrap(), "x");

        let at_origin: Vec<_> = layer.query(Rect::finite(-1, -1, 1, 1).unwrap()).collect();
        assert!(at_origin.iter().all(|(_, v)| *v == "x"));

        let still_h: Vec<_> = layer.query(Rect::finite(100, 100, 101, 101).unwrap()).collect();
        assert!(still_h.iter().all(|(_, v)| *v == "h"));
    }

    // Repeated overwrite of the same rectangle with the same value leaves
    // exactly one fragment behind.
    #[test]
    fn scenario_idempotent_identical_overwrite() {
        let mut layer: ZOrderIndex<&str> = ZOrderIndex::new();
        let r = Rect::finite(0, 0, 5, 5).unwrap();
        layer.insert(r, "v");
        layer.insert(r, "v");
        layer.insert(r, "v");
        assert_eq!(layer.len(), 1);
    }

    // Inserting ALL always collapses prior state down to one fragment.
    #[test]
    fn scenario_insert_all_is_an_absorbing_reset() {
        let mut layer: RTreeIndex<&str> = RTreeIndex::new();
        layer.insert(Rect::finite(0, 0, 1, 1).unwrap(), "a");
        layer.insert(Rect::finite(5, 5, 6, 6).unwrap(), "b");
        layer.insert(Rect::ALL, "everything");
        assert_eq!(layer.len(), 1);
        let hits: Vec<_> = layer.query(Rect::finite(-1000, -1000, 1000, 1000).unwrap()).collect();
        assert_eq!(hits, [(Rect::ALL, "everything")]);
    }

    // Two independently-keyed rectangles join into per-region bundles.
    #[test]
    fn scenario_partition_join_reports_overlap_bundle() {
        let mut scene: Partition<&str, &str, ZOrderIndex<&str>> = Partition::new();
        scene.set(Rect::finite(0, 0, 2, 2).unwrap(), "bg", "red");
        scene.set(Rect::finite(1, 1, 3, 3).unwrap(), "fg", "blue");

        let joined = scene.query(Rect::finite(0, 0, 3, 3).unwrap());
        let overlap_rect = Rect::finite(1, 1, 2, 2).unwrap();
        let overlap = joined.iter().find(|(r, _)| r.intersects(&overlap_rect) && r.area() == overlap_rect.area());
        assert!(overlap.is_some());
        let (_, bundle) = overlap.unwrap();
        assert_eq!(bundle.len(), 2);
    }

    // Cross-backend consistency: the same insert sequence produces the
    // same queryable cover on both backends.
    #[test]
    fn scenario_backends_agree_on_the_same_inserts() {
        let ops: [(Rect, &str); 4] = [
            (Rect::finite(0, 0, 10, 10).unwrap(), "a"),
            (Rect::finite(3, 3, 7, 7).unwrap(), "b"),
            (Rect::finite(-5, -5, 0, 0).unwrap(), "c"),
            (Rect::finite(5, 5, 5, 5).unwrap(), "d"),
        ];

        let mut z: ZOrderIndex<&str> = ZOrderIndex::new();
        let mut r: RTreeIndex<&str> = RTreeIndex::new();
        for (rect, value) in ops {
            z.insert(rect, value);
            r.insert(rect, value);
        }

        let q = Rect::finite(-20, -20, 20, 20).unwrap();
        let mut z_hits: Vec<_> = z.query(q).collect();
        let mut r_hits: Vec<_> = r.query(q).collect();
        z_hits.sort_by_key(|(rect, _)| (rect.x1(), rect.y1(), rect.x2(), rect.y2()));
        r_hits.sort_by_key(|(rect, _)| (rect.x1(), rect.y1(), rect.x2(), rect.y2()));
        assert_eq!(z_hits, r_hits);
    }

    #[test]
    fn extent_reflects_only_whats_stored() {
        let mut layer: ZOrderIndex<&str> = ZOrderIndex::new();
        assert!(layer.extent().empty);
        layer.insert(Rect::finite(2, 2, 4, 4).unwrap(), "a");
        let e = layer.extent();
        assert!(!e.empty);
        assert_eq!(e.mbr, Rect::finite(2, 2, 4, 4).unwrap());
    }

    fn sorted<V: Ord + Clone>(mut v: Vec<(Rect, V)>) -> Vec<(Rect, V)> {
        v.sort_by(|a, b| {
            (a.0.x1(), a.0.y1(), a.0.x2(), a.0.y2(), a.1.clone()).cmp(&(
                b.0.x1(),
                b.0.y1(),
                b.0.x2(),
                b.0.y2(),
                b.1.clone(),
            ))
        });
        v
    }

    // Two overlapping finite inserts leave exactly the three fragments the
    // four-strip subtraction predicts.
    #[test]
    fn overlapping_insert_leaves_three_disjoint_fragments() {
        let mut layer: ZOrderIndex<&str> = ZOrderIndex::new();
        layer.insert(Rect::finite(0, 0, 2, 2).unwrap(), "A");
        layer.insert(Rect::finite(1, 1, 3, 3).unwrap(), "B");

        let got = sorted(layer.query(Rect::ALL).collect());
        let want = sorted(alloc::vec![
            (Rect::finite(0, 0, 2, 0).unwrap(), "A"),
            (Rect::finite(0, 1, 0, 2).unwrap(), "A"),
            (Rect::finite(1, 1, 3, 3).unwrap(), "B"),
        ]);
        assert_eq!(got, want);
    }

    // Two infinite, perpendicular inserts form a cross: the horizontal bar
    // survives as two half-infinite stubs either side of the vertical
    // column, both still unbounded on their outer edge.
    #[test]
    fn perpendicular_infinite_inserts_form_a_cross() {
        let mut layer: ZOrderIndex<&str> = ZOrderIndex::new();
        let horizontal = Rect::new(Coord::NegInf, Coord::Finite(1), Coord::PosInf, Coord::Finite(1)).unwrap();
        let vertical = Rect::new(Coord::Finite(1), Coord::NegInf, Coord::Finite(1), Coord::PosInf).unwrap();
        layer.insert(horizontal, "H");
        layer.insert(vertical, "V");

        let got = sorted(layer.query(Rect::ALL).collect());
        let want = sorted(alloc::vec![
            (Rect::new(Coord::NegInf, Coord::Finite(1), Coord::Finite(0), Coord::Finite(1)).unwrap(), "H"),
            (Rect::new(Coord::Finite(2), Coord::Finite(1), Coord::PosInf, Coord::Finite(1)).unwrap(), "H"),
            (vertical, "V"),
        ]);
        assert_eq!(got, want);
    }

    // Four disjoint quadrant inserts never touch each other, so the store
    // holds exactly the four original rectangles.
    #[test]
    fn disjoint_quadrant_inserts_stay_four_separate_fragments() {
        let mut layer: ZOrderIndex<i32> = ZOrderIndex::new();
        layer.insert(Rect::finite(0, 0, 1, 1).unwrap(), 1);
        layer.insert(Rect::finite(2, 0, 3, 1).unwrap(), 2);
        layer.insert(Rect::finite(0, 2, 1, 3).unwrap(), 3);
        layer.insert(Rect::finite(2, 2, 3, 3).unwrap(), 4);

        let got = sorted(layer.query(Rect::ALL).collect());
        assert_eq!(got.len(), 4);
        let mut values: Vec<i32> = got.iter().map(|(_, v)| *v).collect();
        values.sort_unstable();
        assert_eq!(values, [1, 2, 3, 4]);
        for i in 0..got.len() {
            for j in (i + 1)..got.len() {
                assert!(!got[i].0.intersects(&got[j].0));
            }
        }
    }

    // A global insert, then two point overwrites, leave three values: the
    // points exactly at their own cells and the global value everywhere
    // else, with infinite edges preserved on all four sides.
    #[test]
    fn global_insert_then_two_point_overwrites_keep_three_values() {
        let mut layer: RTreeIndex<&str> = RTreeIndex::new();
        layer.insert(Rect::ALL, "G");
        layer.insert(Rect::finite(2, 2, 2, 2).unwrap(), "P");
        layer.insert(Rect::finite(-2, -2, -2, -2).unwrap(), "N");

        let got: Vec<_> = layer.query(Rect::ALL).collect();
        assert_eq!(got.iter().filter(|(r, v)| *r == Rect::finite(2, 2, 2, 2).unwrap() && *v == "P").count(), 1);
        assert_eq!(got.iter().filter(|(r, v)| *r == Rect::finite(-2, -2, -2, -2).unwrap() && *v == "N").count(), 1);
        assert!(got.iter().filter(|(_, v)| *v == "P").count() == 1);
        assert!(got.iter().filter(|(_, v)| *v == "N").count() == 1);

        let g_fragments: Vec<_> = got.iter().filter(|(_, v)| *v == "G").collect();
        assert!(!g_fragments.is_empty());
        let extent = g_fragments.iter().fold(Extent::EMPTY, |acc, (r, _)| acc.fold(r));
        assert!(extent.edges.x_min && extent.edges.y_min && extent.edges.x_max && extent.edges.y_max);
    }

    // Joining two independently-keyed layers reports the three expected
    // attribute covers (bg-only, bg+fg, fg-only).
    #[test]
    fn two_key_join_reports_bg_only_both_and_fg_only_covers() {
        let mut scene: Partition<&str, &str, ZOrderIndex<&str>> = Partition::new();
        scene.set(Rect::finite(0, 0, 2, 2).unwrap(), "bg", "red");
        scene.set(Rect::finite(1, 1, 3, 3).unwrap(), "fg", "blue");

        let joined = scene.query(Rect::finite(0, 0, 3, 3).unwrap());
        let bg_only = joined.iter().filter(|(_, b)| b.len() == 1 && b[0] == ("bg", "red"));
        let fg_only = joined.iter().filter(|(_, b)| b.len() == 1 && b[0] == ("fg", "blue"));
        let both = joined.iter().filter(|(_, b)| b.len() == 2);
        assert!(bg_only.count() >= 1);
        assert!(fg_only.count() >= 1);
        assert_eq!(both.count(), 1);
    }

    // The fragmentation-bound property: adversarial insert patterns must
    // not blow fragment count past 4n, on either backend.
    fn concentric_fragment_count<B: Backend<String> + Default>(n: i64) -> usize {
        let mut idx = B::default();
        for i in 0..n {
            idx.insert(Rect::finite(i, i, 99 - i, 99 - i).unwrap(), alloc::format!("r{i}"));
        }
        idx.len()
    }

    // A diagonal staircase of 4x4 squares, each one step down-right from the
    // last so it only corner-touches its immediate predecessor (not the
    // whole run before it), to keep the adversarial case from degenerating
    // into an all-pairs overlap.
    fn diagonal_fragment_count<B: Backend<String> + Default>(n: i64) -> usize {
        let mut idx = B::default();
        for i in 0..n {
            idx.insert(Rect::finite(i * 3, i * 3, i * 3 + 3, i * 3 + 3).unwrap(), alloc::format!("d{i}"));
        }
        idx.len()
    }

    // A grid of cells, each immediately overwritten in its interior by a
    // smaller rectangle — the "mixed" part is alternating a disjoint tiling
    // insert with an overlapping one, so each position contributes its own
    // bounded four-strip frame rather than chaining overlaps across cells.
    fn checkerboard_fragment_count<B: Backend<String> + Default>(n: i64) -> usize {
        let mut idx = B::default();
        for i in 0..n {
            let pos = i / 2;
            let gx = pos % 10;
            let gy = pos / 10;
            let rect = if i % 2 == 0 {
                Rect::finite(gx * 5, gy * 5, gx * 5 + 3, gy * 5 + 3).unwrap()
            } else {
                Rect::finite(gx * 5 + 1, gy * 5 + 1, gx * 5 + 2, gy * 5 + 2).unwrap()
            };
            idx.insert(rect, alloc::format!("c{i}"));
        }
        idx.len()
    }

    #[test]
    fn fragmentation_bound_concentric_zorder() {
        assert!(concentric_fragment_count::<ZOrderIndex<String>>(50) < 200);
    }

    #[test]
    fn fragmentation_bound_concentric_rtree() {
        assert!(concentric_fragment_count::<RTreeIndex<String>>(50) < 200);
    }

    #[test]
    fn fragmentation_bound_diagonal_zorder() {
        assert!(diagonal_fragment_count::<ZOrderIndex<String>>(100) < 400);
    }

    #[test]
    fn fragmentation_bound_diagonal_rtree() {
        assert!(diagonal_fragment_count::<RTreeIndex<String>>(100) < 400);
    }

    #[test]
    fn fragmentation_bound_checkerboard_zorder() {
        assert!(checkerboard_fragment_count::<ZOrderIndex<String>>(60) < 240);
    }

    #[test]
    fn fragmentation_bound_checkerboard_rtree() {
        assert!(checkerboard_fragment_count::<RTreeIndex<String>>(60) < 240);
    }
}
