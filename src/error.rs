// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

/// Errors raised while querying the search index or parsing its hits.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Failed to parse search response: {0}")]
    Response(String),

    #[error("Failed to parse document {index}: {source}")]
    MalformedHit {
        index: usize,
        source: serde_json::Error,
    },
}

/// Errors raised while streaming an answer from the chat backend.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Chat backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Model reported an error: {0}")]
    Model(String),

    #[error("Failed to decode stream line {line:?}: {source}")]
    Decode {
        line: String,
        source: serde_json::Error,
    },

    #[error("Answer stream ended before the backend signalled completion")]
    Truncated,

    #[error("Answer consumer failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
