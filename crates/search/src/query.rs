use lede_core::parse_timestamp;

use crate::{normalize, PrefixIndex};

impl<T> PrefixIndex<T> {
    /// Up to `limit` items whose key starts with `prefix_raw`, in key order.
    ///
    /// An empty prefix matches nothing rather than everything.
    pub fn prefix_range(&self, prefix_raw: &str, limit: usize) -> Vec<&T> {
        if prefix_raw.is_empty() || limit == 0 {
            return Vec::new();
        }
        let prefix = normalize(prefix_raw);
        if prefix.is_empty() {
            return Vec::new();
        }
        let range = self.bucket(&prefix);
        self.entries()[range].iter().take(limit).map(|e| &e.item).collect()
    }

    /// The newest `limit` items whose key starts with `prefix_raw`.
    ///
    /// The whole bucket is materialized and ordered by `get_date` descending;
    /// missing or unparseable dates count as epoch 0 and sort last.
    pub fn prefix_range_sorted<F>(&self, prefix_raw: &str, limit: usize, get_date: F) -> Vec<&T>
    where
        F: Fn(&T) -> Option<&str>,
    {
        if prefix_raw.is_empty() || limit == 0 {
            return Vec::new();
        }
        let prefix = normalize(prefix_raw);
        if prefix.is_empty() {
            return Vec::new();
        }
        let range = self.bucket(&prefix);
        if range.is_empty() {
            return Vec::new();
        }
        metrics::histogram!("prefix_bucket_size", range.len() as f64);
        let mut bucket: Vec<(i64, &T)> = self.entries()[range]
            .iter()
            .map(|e| (parse_timestamp(get_date(&e.item)), &e.item))
            .collect();
        bucket.sort_by(|a, b| b.0.cmp(&a.0));
        bucket.truncate(limit);
        bucket.into_iter().map(|(_, item)| item).collect()
    }
}
