//! Lede core types: posts as the search core sees them.
//!
//! Content arrives from the CMS in several loosely typed shapes. It is decoded
//! once in [`payload`] and every other crate only ever sees [`Document`].

#![forbid(unsafe_code)]

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod payload;

pub use payload::{decode_feed, FeedDecode, PageInfo, RawPost, RawTerm, RawTerms};

/// Post identifier. The CMS hands out either a numeric database id or an
/// opaque (base64) string id depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    Num(i64),
    Str(String),
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Num(n) => write!(f, "{}", n),
            DocId::Str(s) => f.write_str(s),
        }
    }
}

/// Category or tag attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    pub slug: Option<String>,
}

/// Canonical post record consumed (read-only) by the search core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub database_id: Option<i64>,
    pub title: String,
    pub slug: String,
    /// Publication date as delivered by the CMS; only used for recency ordering.
    pub date: Option<String>,
    pub excerpt: Option<String>,
    pub categories: SmallVec<[Term; 2]>,
}

impl Document {
    /// Publication time in epoch milliseconds, `0` when missing or unparseable.
    pub fn timestamp(&self) -> i64 {
        parse_timestamp(self.date.as_deref())
    }

    pub fn href(&self) -> String {
        format!("/{}", self.slug)
    }
}

/// Presentation-facing projection of a matched document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: DocId,
    pub title: String,
    pub href: String,
}

impl From<&Document> for SearchResult {
    fn from(doc: &Document) -> Self {
        let id = match doc.database_id {
            Some(n) => DocId::Num(n),
            None => doc.id.clone(),
        };
        let title = if doc.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            doc.title.clone()
        };
        Self { id, title, href: doc.href() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Parse a CMS date into epoch milliseconds.
///
/// Accepts RFC 3339, the naive `YYYY-MM-DDTHH:MM:SS` form WordPress emits for
/// `date` (read as UTC), the space separated `date_gmt` form and bare dates.
/// Anything else, including a missing value, maps to `0` so undated posts sort
/// as the oldest.
pub fn parse_timestamp(raw: Option<&str>) -> i64 {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0;
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_millis();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return ndt.and_utc().timestamp_millis();
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

pub mod prelude {
    pub use super::{parse_timestamp, CoreError, DocId, Document, SearchResult, Term};
}
