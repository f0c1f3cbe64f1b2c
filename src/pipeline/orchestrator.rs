// file: src/pipeline/orchestrator.rs
// description: builds the grounded chat request and coordinates retrieval with answering
// reference: sequential retrieve-then-stream workflow

use crate::config::{Config, OllamaConfig, RetrievalConfig};
use crate::error::{InferenceError, Result};
use crate::llm::{AnswerStream, ChatBackend, OllamaClient};
use crate::models::{AnswerChunk, ChatMessage, ChatOptions, ChatRequest};
use crate::pipeline::progress::AnswerStats;
use crate::search::{ElasticsearchClient, SearchBackend, SemanticRetriever};
use crate::utils::{OperationTimer, Validator};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const SLOW_RETRIEVAL: Duration = Duration::from_secs(5);

pub struct Orchestrator<C> {
    backend: C,
    model: String,
    temperature: f32,
}

impl<C: ChatBackend> Orchestrator<C> {
    pub fn new(backend: C, config: &OllamaConfig) -> Self {
        Self {
            backend,
            model: config.chat_model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Always `[instructions, context, question]`, with no reordering or dedup.
    pub fn build_messages(system_prompt: &str, context: &str, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(system_prompt),
            ChatMessage::system(context),
            ChatMessage::user(question),
        ]
    }

    pub fn build_request(&self, question: &str, context: &str, system_prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(system_prompt, context, question),
            options: ChatOptions {
                temperature: self.temperature,
            },
            stream: true,
        }
    }

    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        system_prompt: &str,
    ) -> std::result::Result<AnswerStream, InferenceError> {
        let request = self.build_request(question, context, system_prompt);
        debug!(
            "Submitting chat request to {} ({} context chars)",
            request.model,
            context.len()
        );

        let events = self.backend.stream_chat(request).await?;
        Ok(AnswerStream::new(events))
    }

    /// Streams the answer into `callback`, one chunk at a time in arrival order.
    pub async fn answer_with<F, E>(
        &self,
        question: &str,
        context: &str,
        system_prompt: &str,
        mut callback: F,
    ) -> std::result::Result<AnswerStats, InferenceError>
    where
        F: FnMut(&AnswerChunk) -> std::result::Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let start = Instant::now();
        let mut stats = AnswerStats::new();
        let mut stream = self.answer(question, context, system_prompt).await?;

        stream
            .for_each_chunk(|chunk| {
                stats.record_chunk(chunk);
                callback(chunk)
            })
            .await?;

        stats.duration = start.elapsed();
        stats.record_completion(stream.completion());
        Ok(stats)
    }
}

/// Retrieval followed by a grounded, streamed answer.
pub struct RagPipeline<S, C> {
    retriever: SemanticRetriever<S>,
    orchestrator: Orchestrator<C>,
    retrieval: RetrievalConfig,
}

impl RagPipeline<ElasticsearchClient, OllamaClient> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let search = ElasticsearchClient::new(config.elasticsearch.clone())?;
        let chat = OllamaClient::new(config.ollama.clone())?;

        Ok(Self::new(
            SemanticRetriever::new(search, &config.elasticsearch),
            Orchestrator::new(chat, &config.ollama),
            config.retrieval.clone(),
        ))
    }
}

impl<S: SearchBackend, C: ChatBackend> RagPipeline<S, C> {
    pub fn new(
        retriever: SemanticRetriever<S>,
        orchestrator: Orchestrator<C>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            orchestrator,
            retrieval,
        }
    }

    pub fn retriever(&self) -> &SemanticRetriever<S> {
        &self.retriever
    }

    pub fn orchestrator(&self) -> &Orchestrator<C> {
        &self.orchestrator
    }

    pub fn system_prompt(&self) -> &str {
        &self.retrieval.system_prompt
    }

    /// Uses the configured result count when `limit` is `None`.
    pub async fn retrieve_context(&self, question: &str, limit: Option<usize>) -> Result<String> {
        let limit = limit.unwrap_or(self.retrieval.size);
        let timer = OperationTimer::new("retrieval");
        let context = self.retriever.retrieve(question, limit).await?;
        timer.warn_if_slow(SLOW_RETRIEVAL, "semantic search");
        timer.finish();
        Ok(context)
    }

    pub async fn ask<F, E>(&self, question: &str, callback: F) -> Result<AnswerStats>
    where
        F: FnMut(&AnswerChunk) -> std::result::Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Validator::validate_question(question)?;

        let context = self.retrieve_context(question, None).await?;
        let stats = self
            .orchestrator
            .answer_with(question, &context, &self.retrieval.system_prompt, callback)
            .await?;

        info!(
            "Answer complete: {} chunks, {} chars in {:.2}s",
            stats.chunks,
            stats.chars,
            stats.duration.as_secs_f64()
        );
        Ok(stats)
    }
}
