use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::{Embed, EmbedError, EmbeddingsBuilder, TextEmbedder};
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;
use crate::infrastructure::llm::require_api_key;

/// OpenAI embeddings through rig.
pub struct TextEmbedding {
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }
}

/// A text tagged with its position in the batch. `EmbeddingsBuilder` returns
/// documents in no particular order.
#[derive(Debug, Clone)]
struct Indexed {
    index: usize,
    text: String,
}

impl Embed for Indexed {
    fn embed(&self, embedder: &mut TextEmbedder) -> Result<(), EmbedError> {
        embedder.embed(self.text.clone());
        Ok(())
    }
}

/// Puts `(index, vector)` pairs back into batch order. Every index below
/// `expected` must appear exactly once.
fn in_batch_order(
    results: impl IntoIterator<Item = (usize, Vec<f64>)>,
    expected: usize,
) -> Result<Vec<Embedding>, DomainError> {
    let mut slots: Vec<Option<Embedding>> = vec![None; expected];
    for (index, vector) in results {
        let slot = slots.get_mut(index).ok_or_else(|| {
            DomainError::external(format!("embedding for unknown batch index {index}"))
        })?;
        if slot.is_some() {
            return Err(DomainError::external(format!(
                "duplicate embedding for batch index {index}"
            )));
        }
        *slot = Some(Embedding::new(vector.into_iter().map(|x| x as f32).collect()));
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                DomainError::external(format!("no embedding returned for batch index {index}"))
            })
        })
        .collect()
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        require_api_key()?;

        let client = openai::Client::from_env();
        let model = client.embedding_model(&self.model);

        let mut builder = EmbeddingsBuilder::new(model);
        for (index, text) in texts.iter().enumerate() {
            builder = builder
                .document(Indexed {
                    index,
                    text: text.to_string(),
                })
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        let embeddings = builder
            .build()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let vectors = in_batch_order(
            embeddings
                .into_iter()
                .map(|(doc, emb)| (doc.index, emb.first().vec)),
            texts.len(),
        )?;

        if let Some(bad) = vectors.iter().find(|v| v.dimension() != self.dimension) {
            return Err(DomainError::external(format!(
                "embedding model {} returned dimension {}, expected {}",
                self.model,
                bad.dimension(),
                self.dimension
            )));
        }

        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
