// file: src/search/retriever.rs
// description: semantic retrieval and context block assembly
// reference: top-k hits rendered as a single grounding document

use crate::config::ElasticsearchConfig;
use crate::error::RetrievalError;
use crate::models::{SearchHit, SearchRequest};
use crate::search::client::SearchBackend;
use tracing::{debug, info};

pub const CONTEXT_HEADER: &str = "Documents found\n\n";
pub const HIT_SEPARATOR: &str = "\n-----\n\n";

/// Renders hits in the given order. The separator only appears between blocks.
pub fn format_context(hits: &[SearchHit]) -> String {
    let blocks: Vec<String> = hits.iter().map(SearchHit::render).collect();

    let mut output = String::from(CONTEXT_HEADER);
    output.push_str(&blocks.join(HIT_SEPARATOR));
    output
}

pub struct SemanticRetriever<B> {
    backend: B,
    index: String,
    semantic_field: String,
}

impl<B: SearchBackend> SemanticRetriever<B> {
    pub fn new(backend: B, config: &ElasticsearchConfig) -> Self {
        Self::with_target(backend, &config.index, &config.semantic_field)
    }

    pub fn with_target(backend: B, index: &str, semantic_field: &str) -> Self {
        Self {
            backend,
            index: index.to_string(),
            semantic_field: semantic_field.to_string(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs one semantic query and parses at most `limit` hits, keeping backend order.
    ///
    /// A single malformed hit fails the whole call; partial results are never returned.
    pub async fn search_hits(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }

        let request = SearchRequest {
            index: self.index.clone(),
            semantic_field: self.semantic_field.clone(),
            query: query.to_string(),
            size: limit,
        };

        let sources = self.backend.search(&request).await?;
        if sources.len() > limit {
            debug!(
                "Backend returned {} hits for size {}, truncating",
                sources.len(),
                limit
            );
        }

        sources
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, source)| {
                serde_json::from_value::<SearchHit>(source)
                    .map_err(|source| RetrievalError::MalformedHit { index, source })
            })
            .collect()
    }

    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<String, RetrievalError> {
        let hits = self.search_hits(query, limit).await?;
        info!("Retrieved {} documents from {}", hits.len(), self.index);
        Ok(format_context(&hits))
    }
}
