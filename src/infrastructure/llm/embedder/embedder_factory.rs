use std::sync::Arc;

use crate::application::ports::Embedder;
use crate::presentation::config::{EmbeddingProvider, EmbeddingsSettings, OpenAiSettings};

use super::{HashingEmbedder, OpenAiEmbedder};

pub struct EmbedderFactory;

#[derive(Debug, thiserror::Error)]
pub enum EmbedderFactoryError {
    #[error("missing API key: OpenAI embedder requires APP_OPENAI__API_KEY")]
    MissingApiKey,
}

impl EmbedderFactory {
    pub fn create(
        embeddings: &EmbeddingsSettings,
        openai: &OpenAiSettings,
    ) -> Result<Arc<dyn Embedder>, EmbedderFactoryError> {
        match embeddings.provider {
            EmbeddingProvider::Hashing => {
                tracing::info!(dimension = embeddings.dimension, "Using hashing embedder");
                Ok(Arc::new(HashingEmbedder::new(embeddings.dimension)))
            }
            EmbeddingProvider::OpenAi => {
                let key = openai
                    .api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .ok_or(EmbedderFactoryError::MissingApiKey)?;
                tracing::info!(
                    model = %embeddings.model,
                    dimension = embeddings.dimension,
                    "Using OpenAI embedding model"
                );
                let mut embedder = OpenAiEmbedder::new(key, embeddings.model.clone())
                    .with_dimensions(embeddings.dimension);
                if let Some(base_url) = &openai.base_url {
                    embedder = embedder.with_base_url(base_url.clone());
                }
                Ok(Arc::new(embedder))
            }
        }
    }
}
