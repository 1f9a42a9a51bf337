use std::time::{Duration, Instant};

use lede_core::{decode_feed, SearchResult};
use tracing::{debug, warn};

use crate::{CancellationToken, RemoteError, RemoteResult, RemoteSearch};

/// Client for the site's `/api/search?q=&first=` route.
///
/// The route answers `{ posts, pageInfo }` with RENDERED post fields; posts
/// are decoded through the core payload boundary and projected to results.
pub struct HttpSearch {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    first: usize,
}

impl HttpSearch {
    pub const MAX_QUERY_CHARS: usize = 200;
    pub const DEFAULT_FIRST: usize = 10;
    pub const MAX_FIRST: usize = 50;
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    /// `base_url` is the site origin, e.g. `https://example.se`.
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        let endpoint = search_endpoint(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        Ok(Self { client, endpoint, first: Self::DEFAULT_FIRST })
    }

    /// Page size requested from the route, clamped to `1..=50`.
    pub fn with_first(mut self, first: usize) -> Self {
        self.first = first.clamp(1, Self::MAX_FIRST);
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn fetch(&self, query: &str) -> RemoteResult<Vec<SearchResult>> {
        let started = Instant::now();
        let first = self.first.to_string();
        let resp = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query), ("first", first.as_str())])
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            metrics::counter!("remote_search_failures_total", 1u64, "kind" => "status");
            warn!(status = status.as_u16(), query, "remote search rejected");
            return Err(RemoteError::Status(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(|e| RemoteError::Transport(e.to_string()))?;
        let feed = decode_feed(&body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        metrics::histogram!("remote_search_ms", started.elapsed().as_secs_f64() * 1000.0);
        debug!(query, hits = feed.documents.len(), skipped = feed.skipped, took_ms = %started.elapsed().as_millis(), "remote search done");
        Ok(feed.documents.iter().map(SearchResult::from).collect())
    }
}

#[async_trait::async_trait]
impl RemoteSearch for HttpSearch {
    async fn search(&self, query: &str, cancel: CancellationToken) -> RemoteResult<Vec<SearchResult>> {
        let q = clamp_query(query);
        if q.is_empty() {
            return Ok(Vec::new());
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(RemoteError::Aborted),
            res = self.fetch(&q) => res,
        }
    }
}

fn search_endpoint(base_url: &str) -> RemoteResult<reqwest::Url> {
    let raw = format!("{}/api/search", base_url.trim().trim_end_matches('/'));
    reqwest::Url::parse(&raw).map_err(|e| RemoteError::Config(format!("{}: {}", raw, e)))
}

fn clamp_query(query: &str) -> String {
    query.trim().chars().take(HttpSearch::MAX_QUERY_CHARS).collect()
}
