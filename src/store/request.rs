//! Requests accepted by a [`VectorStore`](crate::traits::VectorStore).
//!
//! Filters travel as canonical filter text and are compiled again when a
//! request is deserialized. A filter whose text would not compile back to
//! the same tree fails to serialize.

use serde::{Deserialize, Serialize};

use super::Document;
use crate::error::FilterError;
use crate::filter::{analyze, Expr};

pub const DEFAULT_TOP_K: usize = 4;

fn invalid(field: &str, message: &str) -> FilterError {
    FilterError::InvalidRequest {
        field: field.to_string(),
        message: message.to_string(),
    }
}

mod filter_text {
    use serde::{ser, Deserialize, Deserializer, Serializer};

    use crate::filter::{compile, Expr};

    pub fn serialize<S: Serializer>(filter: &Option<Expr>, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(expr) = filter else {
            return serializer.serialize_none();
        };
        let text = expr.to_string();
        match compile(&text) {
            Ok(back) if back == *expr => serializer.serialize_str(&text),
            Ok(_) => Err(ser::Error::custom(format!(
                "filter `{}` reads back as a different expression",
                text
            ))),
            Err(err) => Err(ser::Error::custom(err)),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Expr>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|text| compile(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrieveRequest {
    /// Text to embed and search with
    pub query: String,
    /// Maximum number of documents to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Lowest similarity score to keep, in [0, 1]
    #[serde(default)]
    pub min_similarity: f64,
    /// Metadata filter, applied before ranking
    #[serde(default, with = "filter_text", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,
}

impl RetrieveRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            min_similarity: 0.0,
            filter: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<Expr>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.query.trim().is_empty() {
            return Err(invalid("query", "must not be empty"));
        }
        if self.top_k == 0 {
            return Err(invalid("top_k", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(invalid("min_similarity", "must be between 0 and 1"));
        }
        match &self.filter {
            Some(filter) => analyze(Some(filter)),
            None => Ok(()),
        }
    }
}

/// Insert documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateRequest {
    pub documents: Vec<Document>,
}

impl CreateRequest {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.documents.is_empty() {
            return Err(invalid("documents", "must not be empty"));
        }
        Ok(())
    }
}

/// Remove every document matching a filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteRequest {
    #[serde(default, with = "filter_text")]
    pub filter: Option<Expr>,
}

impl DeleteRequest {
    pub fn new(filter: impl Into<Expr>) -> Self {
        Self {
            filter: Some(filter.into()),
        }
    }

    /// A missing filter is an error: deleting everything is never implied.
    pub fn validate(&self) -> Result<(), FilterError> {
        analyze(self.filter.as_ref())
    }
}
