//! Retrieval-augmented clinical chatbot, served under `/rag`.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::docs::{self, ApiDocs};
use crate::api::error::{self, ApiError};
use crate::application::{RagAnswer, RagQuery, RagService};
use crate::domain::{ports::TranscriptionService, ChatMode, DomainError, Message};

/// Upload ceiling of the Whisper API.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct RagState {
    pub service: Arc<RagService>,
    pub transcriber: Arc<dyn TranscriptionService>,
}

#[derive(Debug, Deserialize)]
pub struct UserMessage {
    pub message: String,
    pub history: Option<Vec<Message>>,
    pub mode: Option<String>,
    pub template_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    pub chunks: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

pub fn router(service: Arc<RagService>, transcriber: Arc<dyn TranscriptionService>) -> Router {
    Router::new()
        .route("/ask_rag", post(ask_rag))
        .route("/documents", post(create_document))
        .route(
            "/transcribe_audio",
            post(transcribe_audio).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .with_state(RagState {
            service,
            transcriber,
        })
        .merge(docs::router(Arc::new(api_docs())))
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
}

pub async fn ask_rag(
    State(state): State<RagState>,
    payload: Result<Json<UserMessage>, JsonRejection>,
) -> Result<Json<RagAnswer>, ApiError> {
    let Json(payload) = payload?;
    let history = payload.history.unwrap_or_default();
    let mode = ChatMode::parse(payload.mode.as_deref());

    info!(
        message_len = payload.message.len(),
        mode = ?mode,
        template = payload.template_name.as_deref().unwrap_or("-"),
        history_len = history.len(),
        "ask_rag"
    );

    let query = RagQuery {
        message: &payload.message,
        history: &history,
        mode,
        template_name: payload.template_name.as_deref(),
    };
    let answer = state.service.answer(&query).await?;
    Ok(Json(answer))
}

pub async fn create_document(
    State(state): State<RagState>,
    payload: Result<Json<CreateDocumentRequest>, JsonRejection>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let Json(request) = payload?;
    let (doc, chunks) = state.service.ingest(&request.name, &request.content).await?;
    info!(document_id = %doc.id, chunks = chunks.len(), "document indexed");

    Ok(Json(DocumentResponse {
        id: doc.id,
        name: doc.name,
        chunks: chunks.len(),
        created_at: doc.created_at,
    }))
}

/// Transcribes the multipart field `file`.
pub async fn transcribe_audio(
    State(state): State<RagState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("audio.webm").to_string();
        let audio = field.bytes().await?;
        info!(filename = %filename, bytes = audio.len(), "transcribe_audio");
        if audio.is_empty() {
            return Err(DomainError::validation("uploaded audio file is empty").into());
        }

        let text = state.transcriber.transcribe(audio.to_vec(), &filename).await?;
        return Ok(Json(TranscriptionResponse { text }));
    }

    Err(DomainError::validation("multipart field 'file' is required").into())
}

fn api_docs() -> ApiDocs {
    ApiDocs {
        title: "RAG Chatbot Service",
        description: "Sub-application for RAG-based Clinical Chatbot",
        version: "1.0.0",
        paths: json!({
            "/ask_rag": {
                "post": {
                    "summary": "Answer a chat or scribe request using retrieved context",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": {
                            "type": "object",
                            "required": ["message"],
                            "properties": {
                                "message": { "type": "string" },
                                "history": { "type": "array", "items": {
                                    "type": "object",
                                    "properties": {
                                        "role": { "type": "string", "examples": ["system", "user", "assistant"] },
                                        "content": { "type": "string" }
                                    }
                                }},
                                "mode": { "type": "string", "default": "chat" },
                                "template_name": { "type": "string" }
                            }
                        }}}
                    },
                    "responses": {
                        "200": { "description": "Answer with sources and confidence" },
                        "500": { "description": "Pipeline failure" }
                    }
                }
            },
            "/transcribe_audio": {
                "post": {
                    "summary": "Transcribe an uploaded audio clip",
                    "requestBody": {
                        "required": true,
                        "content": { "multipart/form-data": { "schema": {
                            "type": "object",
                            "required": ["file"],
                            "properties": { "file": { "type": "string", "format": "binary" } }
                        }}}
                    },
                    "responses": {
                        "200": { "description": "Transcribed text" },
                        "422": { "description": "Missing or empty file" },
                        "500": { "description": "Transcription failure" }
                    }
                }
            },
            "/documents": {
                "post": {
                    "summary": "Index a document into the knowledge base",
                    "responses": {
                        "200": { "description": "Document id and chunk count" },
                        "422": { "description": "Invalid document" }
                    }
                }
            }
        }),
    }
}
