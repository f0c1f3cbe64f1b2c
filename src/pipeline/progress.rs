// file: src/pipeline/progress.rs
// description: answer statistics and console spinner for the ask flow
// reference: uses indicatif for the spinner and tracks streaming metrics

use crate::models::{AnswerChunk, Completion};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct AnswerStats {
    pub chunks: usize,
    pub chars: usize,
    pub duration: Duration,
    /// Tokens generated, as reported by the backend.
    pub eval_count: Option<u64>,
    pub done_reason: Option<String>,
}

impl AnswerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_chunk(&mut self, chunk: &AnswerChunk) {
        self.chunks += 1;
        self.chars += chunk.content.chars().count();
    }

    pub fn record_completion(&mut self, completion: Option<&Completion>) {
        if let Some(completion) = completion {
            self.eval_count = completion.eval_count;
            self.done_reason = completion.done_reason.clone();
        }
    }

    pub fn chars_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.chars as f64 / secs
    }

    pub fn tokens_per_second(&self) -> Option<f64> {
        let secs = self.duration.as_secs_f64();
        match self.eval_count {
            Some(tokens) if secs > 0.0 => Some(tokens as f64 / secs),
            _ => None,
        }
    }
}

/// Spinner shown while waiting on the backends. Draws to stderr.
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn spinner(message: &str, colored: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        let template = if colored {
            "{spinner:.green} [{elapsed}] {msg}"
        } else {
            "{spinner} [{elapsed}] {msg}"
        };
        bar.set_style(
            ProgressStyle::default_spinner()
                .template(template)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A spinner when stderr is a terminal, otherwise a tracker that draws nothing.
    pub fn for_stderr(message: &str, colored: bool) -> Self {
        if std::io::stderr().is_terminal() {
            Self::spinner(message, colored)
        } else {
            Self::hidden()
        }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_message(&self, message: String) {
        self.bar.set_message(message);
    }

    /// Runs `f` with the spinner cleared, for printing to the terminal.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}
