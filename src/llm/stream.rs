// file: src/llm/stream.rs
// description: lazy, non-restartable stream of answer chunks
// reference: futures::Stream over a backend event stream

use crate::error::InferenceError;
use crate::models::{AnswerChunk, ChatEvent, Completion};
use futures::stream::{FusedStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Raw events produced by a chat backend.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, InferenceError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    NotStarted,
    Streaming,
    Completed,
    Failed,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Completed | StreamState::Failed)
    }
}

/// Yields answer chunks in arrival order and ends when the backend signals completion.
///
/// Once `Completed` or `Failed` the stream only yields `None`. A backend that stops
/// without signalling completion produces a single `InferenceError::Truncated`.
pub struct AnswerStream {
    events: ChatEventStream,
    state: StreamState,
    completion: Option<Completion>,
}

impl AnswerStream {
    pub fn new(events: ChatEventStream) -> Self {
        Self {
            events,
            state: StreamState::NotStarted,
            completion: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Backend metadata, available once the stream has completed.
    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Feeds every chunk to `callback`, stopping at the first error from either side.
    pub async fn for_each_chunk<F, E>(&mut self, mut callback: F) -> Result<(), InferenceError>
    where
        F: FnMut(&AnswerChunk) -> Result<(), E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        while let Some(item) = self.next().await {
            let chunk = item?;
            if let Err(e) = callback(&chunk) {
                self.state = StreamState::Failed;
                return Err(InferenceError::Callback(e.into()));
            }
        }
        Ok(())
    }
}

impl Stream for AnswerStream {
    type Item = Result<AnswerChunk, InferenceError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }

        match this.events.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(ChatEvent::Chunk(chunk)))) => {
                this.state = StreamState::Streaming;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Ok(ChatEvent::Done(completion)))) => {
                this.state = StreamState::Completed;
                this.completion = Some(completion);
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.state = StreamState::Failed;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.state = StreamState::Failed;
                Poll::Ready(Some(Err(InferenceError::Truncated)))
            }
        }
    }
}

impl FusedStream for AnswerStream {
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}
