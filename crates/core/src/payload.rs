//! Boundary decoding of CMS payloads.
//!
//! The content API is loose about shapes: feeds come bare, wrapped in
//! `{ posts }` or inside a GraphQL envelope, and term lists may be an array, a
//! `{ nodes }` connection or a lone string. Each variant is named here once and
//! normalized into [`Document`].

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{CoreError, CoreResult, DocId, Document, Term};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    #[serde(default)]
    pub id: Option<DocId>,
    #[serde(default)]
    pub database_id: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub categories: Option<RawTerms>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTerms {
    Connection { nodes: Vec<RawTerm> },
    List(Vec<RawTerm>),
    Single(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTerm {
    Node {
        name: String,
        #[serde(default)]
        slug: Option<String>,
    },
    Name(String),
}

impl From<RawTerm> for Term {
    fn from(raw: RawTerm) -> Self {
        match raw {
            RawTerm::Node { name, slug } => Term { name, slug },
            RawTerm::Name(name) => Term { name, slug: None },
        }
    }
}

impl RawTerms {
    pub fn into_terms(self) -> SmallVec<[Term; 2]> {
        match self {
            RawTerms::Connection { nodes } | RawTerms::List(nodes) => {
                nodes.into_iter().map(Term::from).collect()
            }
            RawTerms::Single(name) if name.trim().is_empty() => SmallVec::new(),
            RawTerms::Single(name) => smallvec::smallvec![Term { name, slug: None }],
        }
    }
}

impl TryFrom<RawPost> for Document {
    type Error = CoreError;

    fn try_from(raw: RawPost) -> CoreResult<Self> {
        let slug = raw
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(CoreError::MissingField("slug"))?;
        let id = match (raw.id, raw.database_id) {
            (Some(id), _) => id,
            (None, Some(n)) => DocId::Num(n),
            (None, None) => DocId::Str(format!("slug:{}", slug)),
        };
        Ok(Document {
            id,
            database_id: raw.database_id,
            title: raw.title.as_deref().map(clean_rendered).unwrap_or_default(),
            slug,
            date: raw.date.filter(|d| !d.trim().is_empty()),
            excerpt: raw.excerpt.as_deref().map(clean_rendered).filter(|e| !e.is_empty()),
            categories: raw.categories.map(RawTerms::into_terms).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(default)]
    nodes: Vec<RawPost>,
    #[serde(default, rename = "pageInfo")]
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    posts: Connection,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedPayload {
    Bare(Vec<RawPost>),
    Page {
        posts: Vec<RawPost>,
        #[serde(default, rename = "pageInfo")]
        page_info: Option<PageInfo>,
    },
    GraphQl {
        data: GraphQlData,
    },
}

/// Outcome of decoding one feed payload.
#[derive(Debug, Clone, Default)]
pub struct FeedDecode {
    pub documents: Vec<Document>,
    /// Posts dropped because they could not be turned into a [`Document`].
    pub skipped: usize,
    pub page_info: Option<PageInfo>,
}

/// Decode any of the supported feed shapes.
pub fn decode_feed(bytes: &[u8]) -> CoreResult<FeedDecode> {
    let payload: FeedPayload = serde_json::from_slice(bytes)?;
    let (raw, page_info) = match payload {
        FeedPayload::Bare(posts) => (posts, None),
        FeedPayload::Page { posts, page_info } => (posts, page_info),
        FeedPayload::GraphQl { data } => (data.posts.nodes, data.posts.page_info),
    };
    let total = raw.len();
    let documents: Vec<Document> = raw.into_iter().filter_map(|p| Document::try_from(p).ok()).collect();
    Ok(FeedDecode { skipped: total - documents.len(), documents, page_info })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static tag pattern"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("static entity pattern"))
}

/// Strip markup from a RENDERED CMS field, decode common entities and
/// collapse whitespace.
pub fn clean_rendered(s: &str) -> String {
    let no_tags = tag_re().replace_all(s, " ");
    let decoded = entity_re().replace_all(&no_tags, |caps: &Captures| {
        let ent = &caps[1];
        let ch = if let Some(hex) = ent.strip_prefix("#x").or_else(|| ent.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = ent.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match ent {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => None,
            }
        };
        ch.map(String::from).unwrap_or_else(|| caps[0].to_string())
    });
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
