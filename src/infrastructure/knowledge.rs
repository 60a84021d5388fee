use std::path::Path;
use tracing::info;

use crate::application::RagService;
use crate::domain::DomainError;

const INDEXED_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub chunks: usize,
}

/// Indexes every text or markdown file directly under `dir`, in name order.
pub async fn ingest_directory(rag: &RagService, dir: &Path) -> Result<IngestStats, DomainError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        DomainError::configuration(format!(
            "knowledge directory {} is not readable: {e}",
            dir.display()
        ))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DomainError::internal(e.to_string()))?
    {
        let path = entry.path();
        let indexed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| INDEXED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if indexed && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut stats = IngestStats::default();
    for path in files {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DomainError::internal(format!("failed to read {}: {e}", path.display()))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let (_doc, chunks) = rag.ingest(&name, &content).await?;
        info!(file = %name, chunks = chunks.len(), "knowledge file indexed");
        stats.files += 1;
        stats.chunks += chunks.len();
    }

    Ok(stats)
}
