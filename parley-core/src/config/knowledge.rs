//! Knowledge system configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `parley-knowledge`. They are created from the user-facing
//! `KnowledgeTomlSettings` TOML struct via `From`.

use serde::{Deserialize, Serialize};

use super::settings::KnowledgeTomlSettings;

/// Scoring function used to rank stored items against a query.
///
/// `Dot` is the raw inner product. It only equals cosine similarity when the
/// provider returns unit-norm vectors, which OpenAI embeddings are in
/// practice but not by contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    #[default]
    Dot,
    Cosine,
}

/// Resolved knowledge engine settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Pin the vector dimension up front instead of learning it from the
    /// first stored item.
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub max_items: Option<usize>,
    #[serde(default)]
    pub similarity: Similarity,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
            top_k: default_top_k(),
            max_items: None,
            similarity: Similarity::Dot,
        }
    }
}

fn default_embedding_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_top_k() -> usize {
    3
}

impl From<&KnowledgeTomlSettings> for KnowledgeSettings {
    fn from(value: &KnowledgeTomlSettings) -> Self {
        let mut settings = KnowledgeSettings::default();
        if let Some(url) = &value.embedding_url {
            settings.embedding_url = url.clone();
        }
        if let Some(model) = &value.embedding_model {
            settings.embedding_model = model.clone();
        }
        if let Some(dim) = value.embedding_dim {
            settings.embedding_dim = Some(dim);
        }
        if let Some(top_k) = value.top_k {
            settings.top_k = top_k;
        }
        if let Some(max_items) = value.max_items {
            settings.max_items = Some(max_items);
        }
        if let Some(similarity) = value.similarity {
            settings.similarity = similarity;
        }
        settings
    }
}
