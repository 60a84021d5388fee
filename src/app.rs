//! Startup wiring: builds both sub-applications, mounts them and wraps the
//! result in the gateway. Any failure here aborts startup.

use axum::Router;
use std::sync::Arc;
use tracing::info;

use crate::api::gateway::{
    create_gateway, CorsPolicy, EventLog, GatewayError, MountTable, RouterApp,
};
use crate::api::{predictive, rag};
use crate::application::{PredictionService, RagService, RagSettings};
use crate::domain::DomainError;
use crate::infrastructure::{
    ingest_directory, require_api_key, AppConfig, InMemoryVectorStore, LinearRiskModel, OpenAiLlm,
    TextEmbedding, WhisperTranscription,
};

pub const RAG_PREFIX: &str = "/rag";
pub const PREDICTIVE_PREFIX: &str = "/predictive";

pub async fn build_app(config: &AppConfig, log: Arc<dyn EventLog>) -> Result<Router, GatewayError> {
    let rag_router = build_rag(config)
        .await
        .map_err(|e| GatewayError::startup("rag", e))?;
    let predictive_router =
        build_predictive(config).map_err(|e| GatewayError::startup("predictive", e))?;

    let mounts = MountTable::builder()
        .mount(RAG_PREFIX, Arc::new(RouterApp::new("rag", rag_router)))
        .mount(
            PREDICTIVE_PREFIX,
            Arc::new(RouterApp::new("predictive", predictive_router)),
        )
        .build()?;

    create_gateway(
        mounts,
        &CorsPolicy::from(&config.config.cors),
        &config.config.gateway,
        log,
    )
}

pub async fn build_rag(config: &AppConfig) -> Result<Router, DomainError> {
    require_api_key()?;

    let rag_config = &config.config.rag;
    let settings = RagSettings {
        top_k: rag_config.top_k,
        chunk_size: rag_config.chunk_size,
        max_context_length: rag_config.max_context_length,
        include_sources: rag_config.include_sources,
        prompts: config.prompts.rag.clone(),
    };
    let service = RagService::new(
        Arc::new(TextEmbedding::from_config(&config.config.embedding)),
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(OpenAiLlm::from_config(&config.config.llm)),
        settings,
    );

    if let Some(dir) = &rag_config.knowledge_dir {
        let stats = ingest_directory(&service, dir).await?;
        info!(
            dir = %dir.display(),
            files = stats.files,
            chunks = stats.chunks,
            "knowledge base loaded"
        );
    } else {
        info!("no knowledge directory configured, starting with an empty index");
    }

    let transcriber = WhisperTranscription::from_config(&config.config.transcription);
    Ok(rag::router(Arc::new(service), Arc::new(transcriber)))
}

pub fn build_predictive(config: &AppConfig) -> Result<Router, DomainError> {
    let path = &config.config.predictive.model_path;
    let model = LinearRiskModel::load(path)?;
    info!(path = %path.display(), "risk model loaded");
    Ok(predictive::router(Arc::new(PredictionService::new(
        Arc::new(model),
    ))))
}
