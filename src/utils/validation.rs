// file: src/utils/validation.rs
// description: input validation utilities and helpers
// reference: input validation patterns

use crate::error::{RagError, Result};

pub struct Validator;

impl Validator {
    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RagError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_question(question: &str) -> Result<()> {
        if question.trim().is_empty() {
            return Err(RagError::Validation("Question is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_temperature(temperature: f32) -> Result<()> {
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(RagError::Validation(format!(
                "Temperature must be a non-negative number, got {}",
                temperature
            )));
        }
        Ok(())
    }

    /// Joins a base URL and a path without doubling or dropping the slash.
    pub fn join_url(base: &str, path: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com").is_ok());
        assert!(Validator::validate_url("http://localhost:9200").is_ok());
        assert!(Validator::validate_url("localhost:9200").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_question() {
        assert!(Validator::validate_question("What is JAK?").is_ok());
        assert!(Validator::validate_question("").is_err());
        assert!(Validator::validate_question("  \n ").is_err());
    }

    #[test]
    fn test_validate_temperature() {
        assert!(Validator::validate_temperature(0.0).is_ok());
        assert!(Validator::validate_temperature(1.2).is_ok());
        assert!(Validator::validate_temperature(-0.1).is_err());
        assert!(Validator::validate_temperature(f32::NAN).is_err());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            Validator::join_url("http://localhost:9200/", "/rag-ollama/_search"),
            "http://localhost:9200/rag-ollama/_search"
        );
        assert_eq!(
            Validator::join_url("http://localhost:11434", "api/chat"),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("héllo wörld", 5), "héllo...");
    }
}
