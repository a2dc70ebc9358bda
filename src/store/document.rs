use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored text chunk with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Caller-assigned identifier
    pub id: String,
    /// Text that gets embedded
    pub content: String,
    /// Fields that filters are evaluated against
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Similarity to the query, set on retrieval results only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Map::new(),
            score: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}
