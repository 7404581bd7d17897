// Copyright 2025 the Fragmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two interchangeable [`crate::Backend`] implementations.
//!
//! - [`zorder`]: a flat, Morton-ordered vector. O(n) insert and query, no
//!   rebalancing — the right choice while a key's fragment count stays
//!   small.
//! - [`rtree`]: an R-tree with a fixed fan-out and an `R*`-style overflow
//!   split, guided by a minimum-area-enlargement insert path. Amortizes
//!   removal by tombstoning rather than restructuring the tree on every
//!   overwrite.

pub mod rtree;
pub mod zorder;

pub use rtree::{RTreeIndex, RTreeStats};
pub use zorder::ZOrderIndex;
