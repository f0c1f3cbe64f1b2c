// file: src/search/client.rs
// description: Elasticsearch client issuing semantic queries over HTTP
// reference: https://www.elastic.co/guide/en/elasticsearch/reference/current/query-dsl-semantic-query.html

use crate::config::ElasticsearchConfig;
use crate::error::RetrievalError;
use crate::models::SearchRequest;
use crate::utils::Validator;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// A document index that answers semantic queries.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Returns the raw `_source` of every hit in ranking order. A hit that
    /// carries no source is returned as `Value::Null`.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>, RetrievalError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_source", default)]
    source: Option<Value>,
}

#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    config: ElasticsearchConfig,
}

impl ElasticsearchClient {
    pub fn new(config: ElasticsearchConfig) -> Result<Self, RetrievalError> {
        info!("Using Elasticsearch at {}", config.url);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Reuses an existing HTTP client, e.g. one with custom TLS or proxy settings.
    pub fn with_client(client: Client, config: ElasticsearchConfig) -> Self {
        Self { client, config }
    }

    pub fn index(&self) -> &str {
        &self.config.index
    }

    pub fn semantic_field(&self) -> &str {
        &self.config.semantic_field
    }

    pub async fn ping(&self) -> Result<(), RetrievalError> {
        debug!("Checking Elasticsearch connection");

        let response = self
            .authorize(self.client.get(Validator::join_url(&self.config.url, "/")))
            .send()
            .await?;

        ensure_success(response).await.map(|_| ())
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.config.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => builder.header("Authorization", format!("ApiKey {}", key)),
            None => builder,
        }
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Value>, RetrievalError> {
        let url = Validator::join_url(&self.config.url, &format!("{}/_search", request.index));

        debug!(
            "Semantic search on {} (field {}, size {})",
            request.index, request.semantic_field, request.size
        );

        let response = self
            .authorize(self.client.post(&url))
            .json(&request.body())
            .send()
            .await?;

        let body = ensure_success(response).await?.text().await?;
        let sources = parse_search_response(&body)?;

        debug!("Search returned {} hits", sources.len());
        Ok(sources)
    }
}

async fn ensure_success(response: Response) -> Result<Response, RetrievalError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(RetrievalError::Backend { status, body })
}

/// Extracts `hits.hits[*]._source` from a `_search` response body.
pub fn parse_search_response(body: &str) -> Result<Vec<Value>, RetrievalError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| RetrievalError::Response(e.to_string()))?;

    Ok(response
        .hits
        .hits
        .into_iter()
        .map(|hit| hit.source.unwrap_or(Value::Null))
        .collect())
}
