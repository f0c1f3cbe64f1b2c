// file: src/llm/ollama.rs
// description: Ollama chat client streaming newline-delimited JSON answers
// reference: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion

use crate::config::OllamaConfig;
use crate::error::InferenceError;
use crate::llm::stream::ChatEventStream;
use crate::models::{AnswerChunk, ChatEvent, ChatRequest, Completion};
use crate::utils::Validator;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// A model endpoint that streams chat completions.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChatEventStream, InferenceError>;
}

#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    completion: Completion,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, InferenceError> {
        info!("Using Ollama at {} with model {}", config.url, config.chat_model);

        // Only the connect phase is bounded; generation time is open-ended.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: OllamaConfig) -> Self {
        Self { client, config }
    }

    pub fn model(&self) -> &str {
        &self.config.chat_model
    }

    /// Whether the configured model is among `models`. A name without a tag
    /// matches its `:latest` variant, the way Ollama resolves it.
    pub fn is_available(&self, models: &[String]) -> bool {
        let model = self.model();
        let latest = format!("{}:latest", model);
        models.iter().any(|m| m == model || *m == latest)
    }

    /// Lists the locally available models.
    pub async fn health_check(&self) -> Result<Vec<String>, InferenceError> {
        debug!("Checking Ollama connection");

        let response = self
            .client
            .get(Validator::join_url(&self.config.url, "/api/tags"))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Backend { status, body });
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<ChatEventStream, InferenceError> {
        let url = Validator::join_url(&self.config.url, "/api/chat");

        debug!(
            "Streaming chat from {} with model {} ({} messages)",
            url,
            request.model,
            request.messages.len()
        );

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InferenceError::Backend { status, body });
        }

        let events: ChatEventStream = Box::pin(decode_ndjson(response.bytes_stream()));
        Ok(events)
    }
}

/// Splits a byte stream into lines. Bytes are buffered raw so multibyte
/// characters split across network chunks survive.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let trimmed = line.trim_ascii();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_vec());
            }
        }
        lines
    }

    /// Returns whatever is left after the final newline.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buffer);
        let trimmed = rest.trim_ascii();
        (!trimmed.is_empty()).then(|| trimmed.to_vec())
    }
}

/// Parses one response line into zero, one or two events.
pub fn parse_line(line: &[u8]) -> Result<Vec<ChatEvent>, InferenceError> {
    let parsed: StreamLine =
        serde_json::from_slice(line).map_err(|source| InferenceError::Decode {
            line: String::from_utf8_lossy(line).into_owned(),
            source,
        })?;

    if let Some(error) = parsed.error {
        return Err(InferenceError::Model(error));
    }

    let mut events = Vec::with_capacity(2);
    if let Some(message) = parsed.message.filter(|m| !m.content.is_empty()) {
        events.push(ChatEvent::Chunk(AnswerChunk::new(message.content)));
    }
    if parsed.done {
        events.push(ChatEvent::Done(parsed.completion));
    }
    Ok(events)
}

/// Turns a response body into chat events, stopping after the `done` line or the first error.
pub fn decode_ndjson<S, B>(bytes: S) -> impl Stream<Item = Result<ChatEvent, InferenceError>> + Send + 'static
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = NdjsonDecoder::default();

        loop {
            let (lines, eof) = match bytes.next().await {
                Some(Ok(chunk)) => (decoder.push(chunk.as_ref()), false),
                Some(Err(e)) => {
                    yield Err(InferenceError::Request(e));
                    return;
                }
                None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for line in lines {
                match parse_line(&line) {
                    Ok(events) => {
                        for event in events {
                            let finished = matches!(event, ChatEvent::Done(_));
                            yield Ok(event);
                            if finished {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            if eof {
                return;
            }
        }
    }
}
