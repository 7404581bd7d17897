// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle algebra: closed-interval integer coordinates, the `±∞` sentinels,
//! and the validated [`Rect`] type every backend builds on.

use core::fmt;

/// A coordinate on the lattice: a finite integer or one of the two sentinels
/// that stand in for an unbounded edge.
///
/// `Coord` implements `Ord` so that `NegInf < Finite(_) < PosInf` regardless of
/// the finite value involved, which lets [`Rect`] treat an infinite edge the
/// same way it treats a finite one everywhere except arithmetic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Coord {
    /// Unbounded toward negative infinity.
    NegInf,
    /// A concrete lattice point.
    Finite(i64),
    /// Unbounded toward positive infinity.
    PosInf,
}

impl Coord {
    /// The coordinate immediately below this one. Saturates at the sentinels.
    #[must_use]
    pub const fn pred(self) -> Self {
        match self {
            Self::Finite(v) => Self::Finite(v.saturating_sub(1)),
            other => other,
        }
    }

    /// The coordinate immediately above this one. Saturates at the sentinels.
    #[must_use]
    pub const fn succ(self) -> Self {
        match self {
            Self::Finite(v) => Self::Finite(v.saturating_add(1)),
            other => other,
        }
    }

    /// `true` for [`Coord::NegInf`] or [`Coord::PosInf`].
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        matches!(self, Self::NegInf | Self::PosInf)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegInf => f.write_str("-inf"),
            Self::Finite(v) => write!(f, "{v}"),
            Self::PosInf => f.write_str("+inf"),
        }
    }
}

/// A widened measure used for area/perimeter comparisons, so that the `R*`
/// split heuristics never overflow and an infinite edge always outweighs any
/// finite one.
///
/// Declared in this order so that derived `Ord` puts every [`Measure::Finite`]
/// below [`Measure::Infinite`], independent of the finite magnitude.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Measure {
    Finite(i128),
    Infinite,
}

impl Measure {
    pub(crate) const ZERO: Self = Self::Finite(0);

    pub(crate) fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a + b),
            _ => Self::Infinite,
        }
    }

    pub(crate) fn sub(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a - b),
            (Self::Infinite, Self::Finite(_)) => Self::Infinite,
            _ => Self::Infinite,
        }
    }

    pub(crate) fn mul(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a * b),
            _ => Self::Infinite,
        }
    }
}

/// Lattice-point count along one axis of a closed interval `[lo, hi]`: one
/// more than the continuous span, since both endpoints are included.
fn span(lo: Coord, hi: Coord) -> Measure {
    match (lo, hi) {
        (Coord::Finite(a), Coord::Finite(b)) => Measure::Finite(i128::from(b) - i128::from(a) + 1),
        _ => Measure::Infinite,
    }
}

/// A closed axis-aligned rectangle: `[x1, x2] × [y1, y2]`, every bound
/// inclusive. Construction through [`Rect::new`] guarantees `x1 <= x2` and
/// `y1 <= y2`, so a `Rect` value is always well-formed once it exists.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rect {
    x1: Coord,
    y1: Coord,
    x2: Coord,
    y2: Coord,
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rect[{}, {} .. {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Returned by [`Rect::new`] when the requested bounds are inverted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RectError {
    x1: Coord,
    y1: Coord,
    x2: Coord,
    y2: Coord,
}

impl fmt::Display for RectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidRectangle: [{}, {} .. {}, {}] requires x1 <= x2 and y1 <= y2",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for RectError {}

impl Rect {
    /// The rectangle covering the entire plane: `[-inf, -inf .. +inf, +inf]`.
    ///
    /// A canonical constant rather than something assembled on each use, so
    /// that backends can test for it with a handful of enum comparisons
    /// instead of reasoning about magnitudes.
    pub const ALL: Self = Self {
        x1: Coord::NegInf,
        y1: Coord::NegInf,
        x2: Coord::PosInf,
        y2: Coord::PosInf,
    };

    /// The single-point rectangle at the origin: `[0, 0 .. 0, 0]`.
    pub const ZERO: Self = Self {
        x1: Coord::Finite(0),
        y1: Coord::Finite(0),
        x2: Coord::Finite(0),
        y2: Coord::Finite(0),
    };

    /// Builds a rectangle from its four bounds, rejecting inverted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RectError`] if `x1 > x2` or `y1 > y2`.
    pub fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Result<Self, RectError> {
        if x1 > x2 || y1 > y2 {
            return Err(RectError { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Builds a rectangle from finite integer bounds.
    ///
    /// # Errors
    ///
    /// Returns [`RectError`] if `x1 > x2` or `y1 > y2`.
    pub fn finite(x1: i64, y1: i64, x2: i64, y2: i64) -> Result<Self, RectError> {
        Self::new(Coord::Finite(x1), Coord::Finite(y1), Coord::Finite(x2), Coord::Finite(y2))
    }

    /// Builds a rectangle without checking that the bounds are ordered.
    ///
    /// Only used internally where the bounds are already known valid (unions,
    /// subtraction fragments, the sentinel constants) — calling this with
    /// `x1 > x2` or `y1 > y2` builds a `Rect` whose invariant is violated.
    pub(crate) const fn new_unchecked(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Lower `x` bound.
    #[must_use]
    pub const fn x1(&self) -> Coord {
        self.x1
    }

    /// Lower `y` bound.
    #[must_use]
    pub const fn y1(&self) -> Coord {
        self.y1
    }

    /// Upper `x` bound.
    #[must_use]
    pub const fn x2(&self) -> Coord {
        self.x2
    }

    /// Upper `y` bound.
    #[must_use]
    pub const fn y2(&self) -> Coord {
        self.y2
    }

    /// `true` for [`Rect::ALL`] — cheap componentwise check against the
    /// sentinel constant rather than inspecting every edge for infinity.
    #[must_use]
    pub fn is_all(&self) -> bool {
        *self == Self::ALL
    }

    /// `true` for [`Rect::ZERO`].
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Does this rectangle contain the point `(x, y)`?
    #[must_use]
    pub fn contains_point(&self, x: Coord, y: Coord) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }

    /// Does `self` fully contain `other`?
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.x1 <= other.x1 && other.x2 <= self.x2 && self.y1 <= other.y1 && other.y2 <= self.y2
    }

    /// Do `self` and `other` share at least one lattice point?
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x1 <= other.x2 && other.x1 <= self.x2 && self.y1 <= other.y2 && other.y1 <= self.y2
    }

    /// The overlapping region of `self` and `other`, or `None` if they are
    /// disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self::new_unchecked(
            max_coord(self.x1, other.x1),
            max_coord(self.y1, other.y1),
            min_coord(self.x2, other.x2),
            min_coord(self.y2, other.y2),
        ))
    }

    /// The smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new_unchecked(
            min_coord(self.x1, other.x1),
            min_coord(self.y1, other.y1),
            max_coord(self.x2, other.x2),
            max_coord(self.y2, other.y2),
        )
    }

    pub(crate) fn width(&self) -> Measure {
        span(self.x1, self.x2)
    }

    pub(crate) fn height(&self) -> Measure {
        span(self.y1, self.y2)
    }

    /// Heuristic area, used to rank candidate subtrees and split
    /// distributions. Not the lattice point count — an infinite edge makes
    /// this [`Measure::Infinite`], which always outranks any finite area.
    pub(crate) fn area(&self) -> Measure {
        self.width().mul(self.height())
    }

    /// Heuristic half-perimeter sum `width + height`, used by the `R*` split
    /// axis choice.
    pub(crate) fn margin(&self) -> Measure {
        self.width().add(self.height())
    }
}

fn min_coord(a: Coord, b: Coord) -> Coord {
    if a <= b { a } else { b }
}

fn max_coord(a: Coord, b: Coord) -> Coord {
    if a >= b { a } else { b }
}

/// Bit flags recording which edges of a rectangle lie on an unbounded
/// (sentinel) boundary. Used by [`crate::geometry::Extent`] to report whether
/// a cover touches infinity along a given side without callers needing to
/// re-inspect coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeFlags {
    /// `x1` is [`Coord::NegInf`].
    pub x_min: bool,
    /// `y1` is [`Coord::NegInf`].
    pub y_min: bool,
    /// `x2` is [`Coord::PosInf`].
    pub x_max: bool,
    /// `y2` is [`Coord::PosInf`].
    pub y_max: bool,
}

impl EdgeFlags {
    pub(crate) fn of(rect: &Rect) -> Self {
        Self {
            x_min: rect.x1 == Coord::NegInf,
            y_min: rect.y1 == Coord::NegInf,
            x_max: rect.x2 == Coord::PosInf,
            y_max: rect.y2 == Coord::PosInf,
        }
    }
}
