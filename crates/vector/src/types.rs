use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value predicate map applied to search candidates
pub type Filters = BTreeMap<String, String>;

/// Unit of retrievable content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk ID (unique within a corpus snapshot)
    pub chunk_id: String,

    /// Owning document ID
    pub doc_id: String,

    /// Chunk text
    pub text: String,

    /// Extra metadata usable by search filters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Chunk {
    /// Create new chunk without attributes
    pub fn new(
        chunk_id: impl Into<String>,
        doc_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            doc_id: doc_id.into(),
            text: text.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a filterable attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Id map entry; position in the id map equals `internal_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdMapEntry {
    /// Dense 0-based index id
    pub internal_id: usize,

    /// Chunk ID
    pub chunk_id: String,

    /// Document ID
    pub doc_id: String,

    /// Attributes copied from the chunk
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl IdMapEntry {
    /// Build entry for the chunk inserted at `internal_id`
    pub fn from_chunk(internal_id: usize, chunk: &Chunk) -> Self {
        Self {
            internal_id,
            chunk_id: chunk.chunk_id.clone(),
            doc_id: chunk.doc_id.clone(),
            attributes: chunk.attributes.clone(),
        }
    }

    /// Check every filter pair against this entry
    ///
    /// `chunk_id` and `doc_id` match the identifiers; any other key must be an
    /// attribute with an equal value.
    pub fn matches(&self, filters: &Filters) -> bool {
        filters.iter().all(|(key, expected)| {
            let actual = match key.as_str() {
                "chunk_id" => Some(&self.chunk_id),
                "doc_id" => Some(&self.doc_id),
                other => self.attributes.get(other),
            };
            actual == Some(expected)
        })
    }
}

/// Single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk ID
    pub chunk_id: String,

    /// Document ID
    pub doc_id: String,

    /// Cosine similarity (-1.0 to 1.0, higher is better)
    pub vec_score: f32,
}

/// Search results together with the version that served them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Hits ordered best first
    pub results: Vec<SearchResult>,

    /// Artifact version that answered the query
    pub index_version: String,
}

/// Health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" or "error"
    pub status: String,

    /// Loaded artifact version (empty when none)
    pub loaded_index_version: String,
}

impl HealthResponse {
    /// Healthy response for a loaded version
    pub fn ok(version: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            loaded_index_version: version.into(),
        }
    }

    /// Unhealthy response
    pub fn error() -> Self {
        Self {
            status: "error".to_string(),
            loaded_index_version: String::new(),
        }
    }
}
