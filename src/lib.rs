// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod utils;

pub use config::{Config, ElasticsearchConfig, OllamaConfig, RetrievalConfig};
pub use error::{InferenceError, RagError, Result, RetrievalError};
pub use llm::{AnswerStream, ChatBackend, OllamaClient, StreamState};
pub use models::{AnswerChunk, ChatMessage, ChatRequest, Completion, Role, SearchHit};
pub use pipeline::{AnswerStats, Orchestrator, ProgressTracker, RagPipeline};
pub use search::{ElasticsearchClient, SearchBackend, SemanticRetriever, format_context};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(RagPipeline::from_config(&config).is_ok());
        assert_eq!(format_context(&[]), "Documents found\n\n");
    }
}
