// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The geometry kernel: rectangle subtraction and extent accumulation.
//!
//! Every backend's last-writer-wins insert reduces to the same shape: find
//! the fragments an incoming rectangle overlaps, replace each with what's
//! left of it outside the new rectangle, and keep the new rectangle. This
//! module supplies that "what's left" computation and the running bounding
//! extent used to answer `extent()` queries.

use smallvec::SmallVec;

use crate::rect::{EdgeFlags, Rect};

/// `subtract(a, b)` never produces more than four fragments: one strip for
/// each side of `a` that peeks out past `b`.
pub type Fragments = SmallVec<[Rect; 4]>;

/// Splits `a` into the disjoint pieces of `a` that lie outside `b`.
///
/// Returns up to four axis-aligned strips — top, bottom, left, right, in
/// that order — any combination of which may be absent. An empty result
/// means `b` fully contains `a`; the caller should drop `a` without
/// replacement in that case.
#[must_use]
pub fn subtract(a: Rect, b: Rect) -> Fragments {
    let mut out = Fragments::new();
    if !a.intersects(&b) {
        out.push(a);
        return out;
    }

    // Top strip: the part of `a` above `b`'s upper edge.
    if a.y1() < b.y1() {
        out.push(Rect::new_unchecked(a.x1(), a.y1(), a.x2(), b.y1().pred()));
    }
    // Bottom strip: the part of `a` below `b`'s lower edge.
    if b.y2() < a.y2() {
        out.push(Rect::new_unchecked(a.x1(), b.y2().succ(), a.x2(), a.y2()));
    }
    // Left strip: the part of `a` left of `b`, restricted to the row band
    // `b` actually occupies so it doesn't double-count the top/bottom strips.
    let row_y1 = max(a.y1(), b.y1());
    let row_y2 = min(a.y2(), b.y2());
    if a.x1() < b.x1() {
        out.push(Rect::new_unchecked(a.x1(), row_y1, b.x1().pred(), row_y2));
    }
    // Right strip: the part of `a` right of `b`, same row band.
    if b.x2() < a.x2() {
        out.push(Rect::new_unchecked(b.x2().succ(), row_y1, a.x2(), row_y2));
    }

    out
}

fn min(a: crate::rect::Coord, b: crate::rect::Coord) -> crate::rect::Coord {
    if a <= b { a } else { b }
}

fn max(a: crate::rect::Coord, b: crate::rect::Coord) -> crate::rect::Coord {
    if a >= b { a } else { b }
}

/// The bounding extent of a collection of rectangles: their union's bounding
/// box, plus which sides of that box (if any) touch infinity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Extent {
    /// Minimum bounding rectangle of everything folded in. Meaningless when
    /// `empty` is `true`.
    pub mbr: Rect,
    /// Which sides of `mbr` are unbounded.
    pub edges: EdgeFlags,
    /// `true` if nothing has been folded in yet.
    pub empty: bool,
}

impl Extent {
    /// The extent of an empty collection: no bounds, every edge flagged so
    /// that folding in the first real rectangle always wins.
    pub const EMPTY: Self = Self {
        mbr: Rect::ZERO,
        edges: EdgeFlags { x_min: true, y_min: true, x_max: true, y_max: true },
        empty: true,
    };

    pub(crate) fn fold(self, rect: &Rect) -> Self {
        if self.empty {
            return Self { mbr: *rect, edges: EdgeFlags::of(rect), empty: false };
        }
        let mbr = self.mbr.union(rect);
        Self { mbr, edges: EdgeFlags::of(&mbr), empty: false }
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        match (self.empty, other.empty) {
            (true, true) => Self::EMPTY,
            (true, false) => other,
            (false, true) => self,
            (false, false) => {
                let mbr = self.mbr.union(&other.mbr);
                Self { mbr, edges: EdgeFlags::of(&mbr), empty: false }
            }
        }
    }
}

/// Folds `extent()` over every rectangle in `fragments`.
pub fn extent_of<'a>(fragments: impl IntoIterator<Item = &'a Rect>) -> Extent {
    fragments.into_iter().fold(Extent::EMPTY, Extent::fold)
}
