// file: src/search/mod.rs
// description: semantic search module exports
// reference: internal module structure

pub mod client;
pub mod retriever;

pub use client::{ElasticsearchClient, SearchBackend};
pub use retriever::{CONTEXT_HEADER, HIT_SEPARATOR, SemanticRetriever, format_context};
