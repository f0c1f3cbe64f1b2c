// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{RagError, Result};
use crate::utils::Validator;
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Cloud IDs are issued both with and without padding.
const CLOUD_ID_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful medical assistant. Only answer the questions based on found documents.\nAdd references to the base document titles and be succint in your answers.";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub elasticsearch: ElasticsearchConfig,
    pub ollama: OllamaConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElasticsearchConfig {
    pub url: String,
    /// Elastic Cloud deployment ID. Takes precedence over `url` when set.
    #[serde(default)]
    pub cloud_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub index: String,
    pub semantic_field: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    pub url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    pub size: usize,
    pub system_prompt: String,
}

impl ElasticsearchConfig {
    /// Replaces `url` with the HTTPS endpoint encoded in `cloud_id`, if one is set.
    pub fn apply_cloud_id(&mut self) -> Result<()> {
        let Some(cloud_id) = self.cloud_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
        else {
            return Ok(());
        };

        self.url = cloud_endpoint(cloud_id)?;
        info!("Resolved Elastic Cloud ID to {}", self.url);
        Ok(())
    }
}

/// Decodes `name:base64(host[:port]$es_uuid$kibana_uuid)` into the Elasticsearch endpoint.
pub fn cloud_endpoint(cloud_id: &str) -> Result<String> {
    let invalid = |reason: &str| RagError::Config(format!("invalid elasticsearch.cloud_id: {}", reason));

    let encoded = cloud_id.rsplit_once(':').map_or(cloud_id, |(_, encoded)| encoded);
    let decoded = CLOUD_ID_ENGINE
        .decode(encoded)
        .map_err(|e| invalid(&e.to_string()))?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid("not valid UTF-8"))?;

    let mut parts = decoded.split('$');
    let host = parts.next().filter(|h| !h.is_empty()).ok_or_else(|| invalid("missing host"))?;
    let uuid = parts
        .next()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| invalid("missing Elasticsearch id"))?;

    Ok(match host.split_once(':') {
        Some((host, port)) => format!("https://{}.{}:{}", uuid, host, port),
        None => format!("https://{}.{}", uuid, host),
    })
}

impl Config {
    /// Layers built-in defaults, the optional TOML file and `OLLAMA_RAG__*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Loads `path` when it exists and falls back to defaults plus env vars otherwise.
    /// Errors from either layer are returned, never replaced by the defaults.
    pub fn discover(path: &Path) -> Result<Self> {
        Self::discover_with_env(path, None)
    }

    fn discover_with_env(path: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
        if path.exists() {
            Self::load_with_env(Some(path), env)
        } else {
            warn!(
                "Config file {} not found, using defaults and environment",
                path.display()
            );
            Self::load_with_env(None, env)
        }
    }

    /// `env` replaces the process environment as the override source when given.
    fn load_with_env(path: Option<&Path>, env: Option<config::Map<String, String>>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| RagError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("OLLAMA_RAG")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings = builder
            .build()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| RagError::Config(e.to_string()))?;

        config.elasticsearch.apply_cloud_id()?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            elasticsearch: ElasticsearchConfig {
                url: "http://localhost:9200".to_string(),
                cloud_id: None,
                api_key: None,
                index: "rag-ollama".to_string(),
                semantic_field: "semantic_field".to_string(),
                request_timeout_secs: 30,
            },
            ollama: OllamaConfig {
                url: "http://localhost:11434".to_string(),
                chat_model: "llama3.2:latest".to_string(),
                temperature: 0.0,
                connect_timeout_secs: 10,
            },
            retrieval: RetrievalConfig {
                size: 3,
                system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        Validator::validate_url(&self.elasticsearch.url)?;
        Validator::validate_url(&self.ollama.url)?;

        if self.elasticsearch.index.trim().is_empty() {
            return Err(RagError::Config("elasticsearch.index must not be empty".to_string()));
        }

        if self.elasticsearch.semantic_field.trim().is_empty() {
            return Err(RagError::Config(
                "elasticsearch.semantic_field must not be empty".to_string(),
            ));
        }

        if self.ollama.chat_model.trim().is_empty() {
            return Err(RagError::Config("ollama.chat_model must not be empty".to_string()));
        }

        Validator::validate_temperature(self.ollama.temperature)?;

        if self.retrieval.size == 0 {
            return Err(RagError::Config(
                "retrieval.size must be greater than 0".to_string(),
            ));
        }

        if self.elasticsearch.request_timeout_secs == 0 || self.ollama.connect_timeout_secs == 0 {
            return Err(RagError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.elasticsearch.index, "rag-ollama");
        assert_eq!(config.ollama.temperature, 0.0);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[ollama]\nchat_model = \"qwen2.5:7b\"\n\n[retrieval]\nsize = 5\n"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.ollama.chat_model, "qwen2.5:7b");
        assert_eq!(config.retrieval.size, 5);
        assert_eq!(config.ollama.url, "http://localhost:11434");
        assert_eq!(config.elasticsearch.semantic_field, "semantic_field");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[retrieval]\nsize = 0\n").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    fn env(vars: &[(&str, &str)]) -> config::Map<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[ollama]\nchat_model = \"qwen2.5:7b\"\n").unwrap();

        let config = Config::load_with_env(
            Some(file.path()),
            Some(env(&[
                ("OLLAMA_RAG__ELASTICSEARCH__API_KEY", "12345"),
                ("OLLAMA_RAG__OLLAMA__CHAT_MODEL", "qwen"),
                ("OLLAMA_RAG__RETRIEVAL__SIZE", "7"),
                ("UNRELATED__RETRIEVAL__SIZE", "1"),
            ])),
        )
        .unwrap();

        assert_eq!(config.elasticsearch.api_key.as_deref(), Some("12345"));
        assert_eq!(config.ollama.chat_model, "qwen");
        assert_eq!(config.retrieval.size, 7);
    }

    #[test]
    fn test_missing_file_still_reports_env_errors() {
        let missing = Path::new("does/not/exist.toml");

        let config = Config::discover_with_env(
            missing,
            Some(env(&[("OLLAMA_RAG__ELASTICSEARCH__API_KEY", "12345")])),
        )
        .unwrap();
        assert_eq!(config.elasticsearch.api_key.as_deref(), Some("12345"));

        let err = Config::discover_with_env(
            missing,
            Some(env(&[
                ("OLLAMA_RAG__ELASTICSEARCH__API_KEY", "12345"),
                ("OLLAMA_RAG__RETRIEVAL__SIZE", "0"),
            ])),
        )
        .unwrap_err();
        assert!(matches!(err, RagError::Config(msg) if msg.contains("retrieval.size")));
    }

    #[test]
    fn test_cloud_id_resolves_endpoint() {
        let encoded = CLOUD_ID_ENGINE.encode("us-central1.gcp.cloud.es.io$abc123$kb456");
        assert_eq!(
            cloud_endpoint(&format!("my-deployment:{}", encoded)).unwrap(),
            "https://abc123.us-central1.gcp.cloud.es.io"
        );

        let padded = base64::engine::general_purpose::STANDARD
            .encode("eu-west-1.aws.found.io:9243$es789$kb");
        assert_eq!(
            cloud_endpoint(&format!("prod:{}", padded)).unwrap(),
            "https://es789.eu-west-1.aws.found.io:9243"
        );
    }

    #[test]
    fn test_cloud_id_overrides_url_on_load() {
        let encoded = CLOUD_ID_ENGINE.encode("us-east-1.aws.elastic.cloud$deadbeef$kb");
        let cloud_id = format!("rag:{}", encoded);

        let config = Config::load_with_env(
            None,
            Some(env(&[("OLLAMA_RAG__ELASTICSEARCH__CLOUD_ID", cloud_id.as_str())])),
        )
        .unwrap();
        assert_eq!(
            config.elasticsearch.url,
            "https://deadbeef.us-east-1.aws.elastic.cloud"
        );
    }

    #[test]
    fn test_cloud_id_rejects_garbage() {
        assert!(cloud_endpoint("rag:not base64!").is_err());
        let no_uuid = CLOUD_ID_ENGINE.encode("host.example.com");
        assert!(matches!(
            cloud_endpoint(&format!("rag:{}", no_uuid)),
            Err(RagError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default_config();
        config.elasticsearch.url = "localhost:9200".to_string();
        assert!(matches!(
            config.validate(),
            Err(RagError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_temperature() {
        let mut config = Config::default_config();
        config.ollama.temperature = -0.5;
        assert!(config.validate().is_err());
    }
}
