use std::ops::Range;
use std::time::Instant;

use tracing::debug;

use crate::normalize;

/// Upper-bound sentinel appended to a prefix to find the end of its bucket.
/// `char::MAX` orders after every scalar value under `str` ordering.
pub const HIGH_SENTINEL: char = char::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntry<T> {
    /// Normalized search key.
    pub key: String,
    pub item: T,
}

/// Immutable array of entries sorted ascending by key (ordinal comparison).
///
/// Every key sharing a prefix sits in one contiguous run, which is what the
/// range queries in [`crate::query`] rely on. Rebuild to reflect changes.
#[derive(Debug, Clone)]
pub struct PrefixIndex<T> {
    entries: Vec<IndexedEntry<T>>,
}

impl<T> Default for PrefixIndex<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> PrefixIndex<T> {
    pub fn build<I, F>(items: I, get_key: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> &str,
    {
        let started = Instant::now();
        let mut entries: Vec<IndexedEntry<T>> = items
            .into_iter()
            .map(|item| IndexedEntry { key: normalize(get_key(&item)), item })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        let took_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::gauge!("prefix_index_entries", entries.len() as f64);
        metrics::histogram!("prefix_index_build_ms", took_ms);
        debug!(entries = entries.len(), took_ms, "prefix index built");
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexedEntry<T>] {
        &self.entries
    }

    pub fn lower_bound(&self, target: &str) -> usize {
        lower_bound(&self.entries, target)
    }

    /// Entry range whose keys start with `prefix` (already normalized).
    pub fn bucket(&self, prefix: &str) -> Range<usize> {
        let lo = self.lower_bound(prefix);
        let mut upper = String::with_capacity(prefix.len() + HIGH_SENTINEL.len_utf8());
        upper.push_str(prefix);
        upper.push(HIGH_SENTINEL);
        let hi = self.lower_bound(&upper);
        lo..hi.max(lo)
    }
}

/// Smallest `i` with `entries[i].key >= target`, or `entries.len()`.
pub fn lower_bound<T>(entries: &[IndexedEntry<T>], target: &str) -> usize {
    entries.partition_point(|e| e.key.as_str() < target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(keys: &[&'static str]) -> PrefixIndex<&'static str> {
        PrefixIndex::build(keys.iter().copied(), |s| *s)
    }

    #[test]
    fn build_sorts_normalized_keys() {
        let i = idx(&["Banana split", "apricot jam", "Äpple"]);
        let keys: Vec<&str> = i.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["apple", "apricot jam", "banana split"]);
        assert_eq!(i.entries()[0].item, "Äpple");
    }

    #[test]
    fn empty_build_is_empty() {
        let i: PrefixIndex<&str> = PrefixIndex::build(Vec::new(), |s| *s);
        assert!(i.is_empty());
        assert_eq!(i.lower_bound("a"), 0);
        assert_eq!(i.bucket("a"), 0..0);
    }

    #[test]
    fn lower_bound_positions() {
        let i = idx(&["b", "d", "d", "f"]);
        assert_eq!(i.lower_bound(""), 0);
        assert_eq!(i.lower_bound("a"), 0);
        assert_eq!(i.lower_bound("b"), 0);
        assert_eq!(i.lower_bound("c"), 1);
        assert_eq!(i.lower_bound("d"), 1);
        assert_eq!(i.lower_bound("e"), 3);
        assert_eq!(i.lower_bound("z"), 4);
    }

    #[test]
    fn bucket_is_contiguous_prefix_run() {
        let i = idx(&["ab", "abc", "abd", "ac", "b"]);
        assert_eq!(i.bucket("ab"), 0..3);
        assert_eq!(i.bucket("a"), 0..4);
        assert_eq!(i.bucket("abc"), 1..2);
        assert_eq!(i.bucket("x"), 5..5);
    }

    #[test]
    fn bucket_covers_astral_characters() {
        let i = idx(&["a\u{1F600}", "a\u{FFFF}", "ab", "b"]);
        assert_eq!(i.bucket("a"), 0..3);
    }
}
