// file: src/models/chat.rs
// description: chat request, message and streamed answer models
// reference: ollama /api/chat request and response lines

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
    pub stream: bool,
}

/// One incremental piece of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerChunk {
    pub content: String,
}

impl AnswerChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Metadata carried by the backend's final `done` line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Completion {
    pub done_reason: Option<String>,
    /// Generated token count.
    pub eval_count: Option<u64>,
    pub prompt_eval_count: Option<u64>,
    /// Nanoseconds.
    pub total_duration: Option<u64>,
}

/// What a chat backend emits while streaming.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Chunk(AnswerChunk),
    Done(Completion),
}
