// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The vertical partition layer: one independent backend per attribute key,
//! composed at query time into a minimal common refinement carrying an
//! attribute bundle per sub-rectangle.
//!
//! Each key's backend already guarantees its own fragments never overlap —
//! the join here only has to line fragments from *different* keys up
//! against each other, which it does with a coordinate-compression sweep
//! rather than a general-purpose polygon clip.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::hash::Hash;
use core::marker::PhantomData;

use hashbrown::HashMap;

use crate::backend::Backend;
use crate::geometry::Extent;
use crate::rect::Rect;

/// The attributes covering one sub-rectangle of a [`Partition::query`]
/// result: one `(key, value)` pair per key whose backend covers that
/// sub-rectangle.
pub type Bundle<K, V> = Vec<(K, V)>;

/// A set of independently keyed rectangle backends, joined at query time.
///
/// `B` is the backend kind (`ZOrderIndex` or `RTreeIndex`) used for every
/// key; a key's backend is created lazily, on its first `set`.
pub struct Partition<K, V, B> {
    backends: HashMap<K, B>,
    _value: PhantomData<fn() -> V>,
}

impl<K, V, B> core::fmt::Debug for Partition<K, V, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Partition").field("keys", &self.backends.len()).finish()
    }
}

impl<K, V, B> Default for Partition<K, V, B> {
    fn default() -> Self {
        Self { backends: HashMap::new(), _value: PhantomData }
    }
}

impl<K, V, B> Partition<K, V, B>
where
    K: Eq + Hash + Clone,
    V: Clone,
    B: Backend<V> + Default,
{
    /// An empty partition with no keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites `key`'s backend over `rect` with `value`, last-writer-wins
    /// within that key only — other keys are untouched.
    pub fn set(&mut self, rect: Rect, key: K, value: V) {
        self.backends.entry(key).or_default().insert(rect, value);
    }

    /// Applies `bundle` to `rect`, one [`Partition::set`] per key.
    pub fn insert(&mut self, rect: Rect, bundle: impl IntoIterator<Item = (K, V)>) {
        for (key, value) in bundle {
            self.set(rect, key, value);
        }
    }

    /// The minimal common refinement of every key's cover over `q`: each
    /// returned sub-rectangle is disjoint from the others and carries the
    /// bundle of every key whose backend covers it.
    ///
    /// The decomposition isn't guaranteed to be coarsest-possible — adjacent
    /// sub-rectangles with identical bundles aren't merged — only that its
    /// per-key union matches each key's own cover of `q`.
    #[must_use]
    pub fn query(&self, q: Rect) -> Vec<(Rect, Bundle<K, V>)> {
        if self.backends.is_empty() {
            return Vec::new();
        }

        let per_key: Vec<(&K, Vec<(Rect, V)>)> = self
            .backends
            .iter()
            .filter_map(|(key, backend)| {
                let clipped: Vec<(Rect, V)> =
                    backend.query(q).filter_map(|(r, v)| r.intersection(&q).map(|clipped| (clipped, v))).collect();
                if clipped.is_empty() { None } else { Some((key, clipped)) }
            })
            .collect();
        if per_key.is_empty() {
            return Vec::new();
        }

        let mut xs = BTreeSet::new();
        let mut ys = BTreeSet::new();
        xs.insert(q.x1());
        xs.insert(q.x2().succ());
        ys.insert(q.y1());
        ys.insert(q.y2().succ());
        for (_, fragments) in &per_key {
            for (r, _) in fragments {
                xs.insert(r.x1());
                xs.insert(r.x2().succ());
                ys.insert(r.y1());
                ys.insert(r.y2().succ());
            }
        }
        let xs: Vec<_> = xs.into_iter().collect();
        let ys: Vec<_> = ys.into_iter().collect();

        let mut out = Vec::new();
        for xw in xs.windows(2) {
            for yw in ys.windows(2) {
                let cell = match Rect::new(xw[0], yw[0], xw[1].pred(), yw[1].pred()) {
                    Ok(cell) => cell,
                    Err(_) => continue,
                };
                let mut bundle = Bundle::new();
                for (key, fragments) in &per_key {
                    if let Some((_, value)) = fragments.iter().find(|(r, _)| r.contains_point(cell.x1(), cell.y1())) {
                        bundle.push(((*key).clone(), value.clone()));
                    }
                }
                if !bundle.is_empty() {
                    out.push((cell, bundle));
                }
            }
        }
        out
    }

    /// The bounding extent across every key's backend.
    #[must_use]
    pub fn extent(&self) -> Extent {
        self.backends.values().map(|b| b.extent()).fold(Extent::EMPTY, Extent::merge)
    }

    /// Iterates over every key with at least one stored fragment.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.backends.keys()
    }

    /// Number of fragments stored for `key`, or `0` if the key has never
    /// been set.
    #[must_use]
    pub fn size_of(&self, key: &K) -> usize {
        self.backends.get(key).map_or(0, |b| b.len())
    }

    /// `true` if no key holds any fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.values().all(|b| b.is_empty())
    }

    /// Discards every key's backend.
    pub fn clear(&mut self) {
        self.backends.clear();
    }
}
