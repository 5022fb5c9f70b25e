use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
}

impl Span {
    pub fn is_valid(&self) -> bool {
        self.start_line >= 1 && self.end_line >= self.start_line
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub source_file: String,
    pub span: Span,
    pub title: String,
    pub summary: String,
    pub content_raw: String,
    pub tags: Vec<String>,
    pub entities: Vec<String>,
    pub topics: Vec<String>,
    pub date: String,
    pub created_at: String,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub src: String,
    pub dst: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub source: String,
    pub line_count: usize,
    pub node_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub created_at: String,
    pub tz: String,
    pub splitter: String,
    pub stats: ParseStats,
    pub versions: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new(created_at: String, tz: String, splitter: &str, stats: ParseStats) -> Self {
        let mut versions = BTreeMap::new();
        versions.insert(
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        Self {
            created_at,
            tz,
            splitter: splitter.to_string(),
            stats,
            versions,
        }
    }
}

/// Output of one parser invocation, prior to being written durably.
#[derive(Debug, Clone, Default)]
pub struct ParsedArchive {
    pub nodes: Vec<NodeRecord>,
    pub entities: Vec<EntityRecord>,
    pub topics: Vec<TopicRecord>,
    pub links: Vec<LinkRecord>,
    pub stats: ParseStats,
}
