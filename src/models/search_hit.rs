// file: src/models/search_hit.rs
// description: search hit document and search request models
// reference: elasticsearch semantic query body

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The `_source` of one hit, reduced to the fields the context block needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub content: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Renders the hit as a `Title`/`Content` block.
    pub fn render(&self) -> String {
        format!("Title\n{}\n\nContent\n{}\n", self.title, self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub index: String,
    pub semantic_field: String,
    pub query: String,
    pub size: usize,
}

impl SearchRequest {
    pub fn body(&self) -> Value {
        json!({
            "query": {
                "semantic": {
                    "field": self.semantic_field,
                    "query": self.query,
                }
            },
            "size": self.size,
        })
    }
}
