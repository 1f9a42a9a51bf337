//! Lede search: sorted-prefix index over post titles.
//!
//! The index is a plain vector of `(normalized key, item)` pairs kept in
//! ordinal key order. A prefix query locates its bucket with two binary
//! searches and either slices it (alphabetical) or re-sorts it by date
//! (newest first). Corpora are small enough to hold in memory, so there is no
//! tokenization and no scoring.

#![forbid(unsafe_code)]

mod index;
mod normalize;
mod query;

use lede_core::Document;

pub use index::{lower_bound, IndexedEntry, PrefixIndex, HIGH_SENTINEL};
pub use normalize::normalize;

/// Index a document collection by title.
pub fn title_index(docs: impl IntoIterator<Item = Document>) -> PrefixIndex<Document> {
    PrefixIndex::build(docs, |d| d.title.as_str())
}

impl PrefixIndex<Document> {
    /// Newest-first title suggestions for `prefix_raw`.
    pub fn suggest(&self, prefix_raw: &str, limit: usize) -> Vec<&Document> {
        self.prefix_range_sorted(prefix_raw, limit, |d| d.date.as_deref())
    }
}
