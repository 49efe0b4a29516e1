use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};

/// Turns text into a fixed-length vector.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, for logging
    fn model(&self) -> &str;

    /// Embed a single text
    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f64>>;
}

/// HTTP client for OpenAI-compatible `/v1/embeddings` endpoints.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(settings: &KnowledgeSettings) -> Self {
        Self {
            base_url: settings.embedding_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> KnowledgeResult<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn embeddings_url(&self) -> String {
        if self.base_url.ends_with("/v1") {
            format!("{}/embeddings", self.base_url)
        } else {
            format!("{}/v1/embeddings", self.base_url)
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", api_key))
        {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    pub async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f64>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedRequest {
            model: self.model.clone(),
            input: inputs.to_vec(),
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Embedding(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response.json().await?;
        let embeddings = payload.into_vectors().ok_or_else(|| {
            KnowledgeError::Embedding("embedding response missing vectors".to_string())
        })?;

        if embeddings.len() != inputs.len() {
            return Err(KnowledgeError::Embedding(format!(
                "embedding response returned {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait::async_trait]
impl Embedder for EmbeddingClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> KnowledgeResult<Vec<f64>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| KnowledgeError::Embedding("embedding response was empty".to_string()))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

/// Accepts the OpenAI shape (`data[].embedding`) as well as the Ollama
/// shapes (`embeddings` / `embedding`).
#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    data: Option<Vec<EmbedData>>,
    embeddings: Option<Vec<Vec<f64>>>,
    embedding: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f64>,
}

impl EmbedResponse {
    fn into_vectors(self) -> Option<Vec<Vec<f64>>> {
        if let Some(mut data) = self.data {
            data.sort_by_key(|d| d.index);
            return Some(data.into_iter().map(|d| d.embedding).collect());
        }
        if let Some(embeddings) = self.embeddings {
            return Some(embeddings);
        }
        self.embedding.map(|embedding| vec![embedding])
    }
}
