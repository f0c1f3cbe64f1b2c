// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod chat;
pub mod search_hit;

pub use chat::{AnswerChunk, ChatEvent, ChatMessage, ChatOptions, ChatRequest, Completion, Role};
pub use search_hit::{SearchHit, SearchRequest};
