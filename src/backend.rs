// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract shared by every storage backend: the Z-order linear store
//! and the R-tree both implement [`Backend`], so the partition layer can
//! stay generic over which one a given key is using.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::geometry::Extent;
use crate::rect::Rect;

/// Last-writer-wins rectangle storage.
///
/// An implementor owns a disjoint cover of the plane: every `insert` carves
/// the incoming rectangle out of whatever previously occupied that space and
/// keeps the remainder, so at any point the stored fragments never overlap.
pub trait Backend<V> {
    /// Inserts `value` over `rect`, overwriting anything previously stored
    /// there. `rect` is already known valid — [`Rect`] only exists in a
    /// well-formed state.
    fn insert(&mut self, rect: Rect, value: V);

    /// Calls `f` with every stored fragment that intersects `q`, fragment
    /// rectangle first so the caller can recover exactly what's stored
    /// without forcing a clone of `V`.
    fn visit<F: FnMut(Rect, &V)>(&self, q: Rect, f: F);

    /// The bounding extent of everything currently stored.
    fn extent(&self) -> Extent;

    /// Discards all stored state.
    fn clear(&mut self);

    /// Number of stored fragments.
    fn len(&self) -> usize;

    /// `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collects every fragment intersecting `q` into `(rect, value)` pairs.
    ///
    /// A convenience built on [`Backend::visit`] for callers that want owned
    /// results rather than a callback.
    fn query<'a>(&'a self, q: Rect) -> Box<dyn Iterator<Item = (Rect, V)> + 'a>
    where
        V: Clone + 'a,
    {
        let mut out = Vec::new();
        self.visit(q, |r, v| out.push((r, v.clone())));
        Box::new(out.into_iter())
    }
}
