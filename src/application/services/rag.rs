use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use super::prompt::{self, PromptTemplates};
use crate::domain::{
    chunk_content,
    ports::{EmbeddingService, LlmService, VectorStore},
    ChatMode, Document, DocumentChunk, DomainError, Message, SearchResult,
};

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub top_k: usize,
    pub chunk_size: usize,
    pub max_context_length: usize,
    pub include_sources: bool,
    pub prompts: PromptTemplates,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            chunk_size: 300,
            max_context_length: 3000,
            include_sources: true,
            prompts: PromptTemplates::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RagQuery<'a> {
    pub message: &'a str,
    pub history: &'a [Message],
    pub mode: ChatMode,
    pub template_name: Option<&'a str>,
}

impl<'a> RagQuery<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            message,
            history: &[],
            mode: ChatMode::Chat,
            template_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub response: String,
    pub sources: Vec<SourceRef>,
    pub confidence: f32,
}

pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmService>,
    settings: RagSettings,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmService>,
        settings: RagSettings,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            llm,
            settings,
        }
    }

    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        let expanded = prompt::expand_query(query);
        let embedding = self.embedding.embed(&expanded).await?;
        self.vector_store.search(&embedding, self.settings.top_k).await
    }

    /// Runs retrieval, prompt assembly and a single completion.
    #[instrument(skip(self, query), fields(mode = ?query.mode, history = query.history.len()))]
    pub async fn answer(&self, query: &RagQuery<'_>) -> Result<RagAnswer, DomainError> {
        let results = self.retrieve(query.message).await?;
        let context = prompt::format_context(&results, self.settings.max_context_length);
        let prompt = self.settings.prompts.build(
            query.message,
            &context,
            query.history,
            query.mode,
            query.template_name,
        );
        tracing::debug!(prompt_len = prompt.len(), retrieved = results.len(), "prompt built");

        let response = self.llm.complete(&prompt).await?;

        let sources = if self.settings.include_sources {
            prompt::extract_sources(&results)
                .into_iter()
                .map(|title| SourceRef { title })
                .collect()
        } else {
            Vec::new()
        };

        Ok(RagAnswer {
            response,
            sources,
            confidence: prompt::confidence(&results),
        })
    }

    /// Chunks, embeds and indexes a document.
    #[instrument(skip(self, content))]
    pub async fn ingest(
        &self,
        name: &str,
        content: &str,
    ) -> Result<(Document, Vec<DocumentChunk>), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("document name must not be empty"));
        }
        let doc = Document::new(name);
        let chunks = chunk_content(&doc, content, self.settings.chunk_size);
        self.index_chunks(&chunks).await?;
        Ok((doc, chunks))
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DomainError::external(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            self.vector_store.upsert(chunk, embedding).await?;
        }

        Ok(())
    }

    pub async fn indexed_chunks(&self) -> Result<usize, DomainError> {
        self.vector_store.len().await
    }
}
