// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A flat, Morton-ordered linear store. No tree to rebalance: every insert
//! is a full scan for overlaps followed by a handful of sorted insertions,
//! which is the right trade for the small fragment counts this backend is
//! meant for.

use alloc::vec::Vec;

use crate::backend::Backend;
use crate::geometry::{extent_of, subtract, Extent};
use crate::morton;
use crate::rect::Rect;

struct Entry<V> {
    rect: Rect,
    value: V,
    morton: u32,
}

/// Last-writer-wins rectangle storage backed by a `Vec` kept sorted by the
/// Morton code of each fragment's center.
#[derive(Debug)]
pub struct ZOrderIndex<V> {
    entries: Vec<Entry<V>>,
}

impl<V> core::fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Entry").field("rect", &self.rect).field("morton", &self.morton).finish()
    }
}

impl<V> Default for ZOrderIndex<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> ZOrderIndex<V> {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn splice_sorted(&mut self, entry: Entry<V>) {
        let pos = self.entries.partition_point(|e| e.morton < entry.morton);
        self.entries.insert(pos, entry);
    }
}

impl<V: Clone> Backend<V> for ZOrderIndex<V> {
    fn insert(&mut self, rect: Rect, value: V) {
        if rect.is_all() {
            self.entries.clear();
            let morton = morton::key(&rect);
            self.entries.push(Entry { rect, value, morton });
            return;
        }

        let mut survivors = Vec::with_capacity(self.entries.len());
        let mut fresh = Vec::new();
        for entry in self.entries.drain(..) {
            if !entry.rect.intersects(&rect) {
                survivors.push(entry);
                continue;
            }
            let pieces = subtract(entry.rect, rect);
            for piece in pieces {
                fresh.push(Entry { rect: piece, morton: morton::key(&piece), value: entry.value.clone() });
            }
        }
        self.entries = survivors;
        fresh.push(Entry { rect, morton: morton::key(&rect), value });
        for entry in fresh {
            self.splice_sorted(entry);
        }
    }

    fn visit<F: FnMut(Rect, &V)>(&self, q: Rect, mut f: F) {
        for entry in &self.entries {
            if entry.rect.intersects(&q) {
                f(entry.rect, &entry.value);
            }
        }
    }

    fn extent(&self) -> Extent {
        extent_of(self.entries.iter().map(|e| &e.rect))
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
