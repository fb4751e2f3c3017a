//! Fuzzy indexing and ranking of choice lists.
//!
//! This module provides the rebuildable fuzzy index, substring scoring helpers
//! and the ranking/grouping engine that orders choices for display.

// Module declarations
pub(crate) mod index;
pub(crate) mod rank;
pub(crate) mod scoring;

// Public re-exports (used via lib.rs)
pub use index::{FuzzyIndex, IndexHit};
pub use rank::{ALIAS_GROUP, EXACT_MATCH_GROUP, LAST_MATCH_GROUP, rank};
