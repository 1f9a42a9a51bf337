//! Lede store: the typeahead's in-RAM state.
//!
//! - [`ResultCache`]: bounded query → results map, FIFO eviction.
//! - [`CorpusStore`]: builds the title index for each published document
//!   collection and swaps it in atomically; readers get lock-free snapshots
//!   and an epoch channel to learn about swaps.

#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use arc_swap::ArcSwap;
use lede_core::{Document, SearchResult};
use lede_search::{title_index, PrefixIndex};
use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tracing::{debug, info};

/// Query → results map with fixed capacity. When full, the oldest inserted
/// key is evicted; lookups do not refresh a key's position.
pub struct ResultCache {
    map: FxHashMap<String, Vec<SearchResult>>,
    order: VecDeque<String>,
    cap: usize,
    evicted: u64,
}

impl ResultCache {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn with_capacity(cap: usize) -> Self {
        Self { map: FxHashMap::default(), order: VecDeque::new(), cap, evicted: 0 }
    }

    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }
    pub fn capacity(&self) -> usize { self.cap }
    pub fn evicted(&self) -> u64 { self.evicted }

    pub fn get(&self, query: &str) -> Option<&[SearchResult]> {
        self.map.get(query).map(Vec::as_slice)
    }

    pub fn contains(&self, query: &str) -> bool {
        self.map.contains_key(query)
    }

    /// Insert or replace. Replacing keeps the key's original position.
    pub fn insert(&mut self, query: String, results: Vec<SearchResult>) {
        if self.cap == 0 {
            return;
        }
        if !self.map.contains_key(&query) {
            if self.order.len() >= self.cap {
                if let Some(old) = self.order.pop_front() {
                    self.map.remove(&old);
                    self.evicted += 1;
                    metrics::counter!("typeahead_cache_evictions_total", 1u64);
                }
            }
            self.order.push_back(query.clone());
        }
        self.map.insert(query, results);
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self { Self::with_capacity(Self::DEFAULT_CAPACITY) }
}

/// One published document collection and its title index.
#[derive(Debug, Default)]
pub struct Corpus {
    /// 0 until the first collection is published.
    pub epoch: u64,
    pub index: PrefixIndex<Document>,
}

impl Corpus {
    pub fn len(&self) -> usize { self.index.len() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }
    pub fn is_published(&self) -> bool { self.epoch > 0 }

    /// Newest-first local suggestions projected for display.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        self.index.suggest(query, limit).into_iter().map(SearchResult::from).collect()
    }
}

/// Writer side: rebuilds the index for every published collection.
pub struct CorpusStore {
    snap: Arc<ArcSwap<Corpus>>,
    epoch_tx: watch::Sender<u64>,
    epoch: u64,
}

impl CorpusStore {
    pub fn new() -> Self {
        let (epoch_tx, _) = watch::channel(0u64);
        Self { snap: Arc::new(ArcSwap::from_pointee(Corpus::default())), epoch_tx, epoch: 0 }
    }

    /// Replace the collection wholesale. Returns the new epoch.
    pub fn publish(&mut self, docs: Vec<Document>) -> u64 {
        let count = docs.len();
        let index = title_index(docs);
        self.epoch = self.epoch.saturating_add(1);
        let epoch = self.epoch;
        self.snap.store(Arc::new(Corpus { epoch, index }));
        self.epoch_tx.send_replace(epoch);
        info!(epoch, docs = count, "corpus published");
        epoch
    }

    pub fn reader(&self) -> CorpusReader {
        CorpusReader { snap: Arc::clone(&self.snap), epoch_rx: self.epoch_tx.subscribe() }
    }

    pub fn epoch(&self) -> u64 { self.epoch }
}

impl Default for CorpusStore {
    fn default() -> Self { Self::new() }
}

/// Read side handed to controllers.
#[derive(Clone)]
pub struct CorpusReader {
    snap: Arc<ArcSwap<Corpus>>,
    epoch_rx: watch::Receiver<u64>,
}

impl CorpusReader {
    pub fn current(&self) -> Arc<Corpus> { self.snap.load_full() }

    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        let rx = self.epoch_rx.clone();
        debug!(epoch = *rx.borrow(), "corpus epoch subscriber added");
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lede_core::DocId;

    fn res(n: i64) -> Vec<SearchResult> {
        vec![SearchResult { id: DocId::Num(n), title: format!("t{}", n), href: format!("/p{}", n) }]
    }

    fn doc(id: i64, title: &str, date: &str) -> Document {
        Document {
            id: DocId::Num(id),
            database_id: Some(id),
            title: title.into(),
            slug: format!("p{}", id),
            date: Some(date.into()),
            excerpt: None,
            categories: smallvec::SmallVec::new(),
        }
    }

    #[test]
    fn cache_keeps_exactly_capacity_after_overflow() {
        let mut c = ResultCache::with_capacity(100);
        for i in 0..101 {
            c.insert(format!("q{}", i), res(i));
        }
        assert_eq!(c.len(), 100);
        assert!(!c.contains("q0"));
        assert!(c.contains("q1"));
        assert!(c.contains("q100"));
        assert_eq!(c.evicted(), 1);
        assert_eq!(c.keys().next(), Some("q1"));
    }

    #[test]
    fn replacing_keeps_insertion_position() {
        let mut c = ResultCache::with_capacity(2);
        c.insert("a".into(), res(1));
        c.insert("b".into(), res(2));
        c.insert("a".into(), res(3));
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a").unwrap()[0].id, DocId::Num(3));
        c.insert("c".into(), Vec::new());
        assert!(!c.contains("a"), "a was inserted first and must be evicted first");
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn lookups_do_not_refresh_position() {
        let mut c = ResultCache::with_capacity(2);
        c.insert("a".into(), res(1));
        c.insert("b".into(), res(2));
        assert!(c.get("a").is_some());
        c.insert("c".into(), res(3));
        assert!(!c.contains("a"));
    }

    #[test]
    fn empty_results_are_cached() {
        let mut c = ResultCache::default();
        c.insert("xyzzy".into(), Vec::new());
        assert_eq!(c.get("xyzzy"), Some(&[][..]));
        assert_eq!(c.capacity(), 100);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut c = ResultCache::with_capacity(0);
        c.insert("a".into(), res(1));
        assert!(c.is_empty());
    }

    #[test]
    fn publish_swaps_snapshot() {
        let mut store = CorpusStore::new();
        let reader = store.reader();
        assert!(!reader.current().is_published());
        let e = store.publish(vec![doc(1, "Apple pie", "2024-01-01"), doc(2, "Apricot jam", "2024-02-01")]);
        assert_eq!(e, 1);
        let snap = reader.current();
        assert_eq!(snap.epoch, 1);
        assert_eq!(snap.len(), 2);
        let hits = snap.suggest("ap", 10);
        assert_eq!(hits[0].href, "/p2");
        assert_eq!(hits[1].href, "/p1");
        store.publish(Vec::new());
        assert!(reader.current().is_empty());
        assert_eq!(snap.len(), 2, "old snapshot stays intact for holders");
    }

    #[tokio::test]
    async fn subscribers_see_epoch_changes() {
        let mut store = CorpusStore::new();
        let mut rx = store.reader().subscribe_epoch();
        assert_eq!(*rx.borrow(), 0);
        store.publish(vec![doc(1, "a", "2024-01-01")]);
        tokio::time::timeout(std::time::Duration::from_secs(1), rx.changed()).await.unwrap().unwrap();
        assert_eq!(*rx.borrow_and_update(), 1);
    }
}
