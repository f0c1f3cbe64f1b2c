// file: src/llm/mod.rs
// description: chat backend module exports
// reference: internal module structure

pub mod ollama;
pub mod stream;

pub use ollama::{ChatBackend, NdjsonDecoder, OllamaClient};
pub use stream::{AnswerStream, ChatEventStream, StreamState};
