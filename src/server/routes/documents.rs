//! Document ingestion and management endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::Document;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResult {
    pub filename: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<UploadFileResult>,
    pub total_documents: usize,
    pub total_chunks: usize,
}

/// POST /api/documents/upload - multipart batch upload.
///
/// Per-file extraction failures are reported per file and do not abort the
/// batch; an unavailable embedder fails the whole request because later
/// files could not be processed either.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let max_files = state.config().server.max_files_per_upload;
    let max_file_size = state.config().server.max_file_size;

    let mut results = Vec::new();
    let mut processed = 0usize;
    let mut failed = 0usize;
    let mut seen = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        seen += 1;
        if seen > max_files {
            return Err(Error::InvalidRequest(format!(
                "too many files in one upload (limit {})",
                max_files
            )));
        }

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                failed += 1;
                results.push(UploadFileResult {
                    filename,
                    status: "error",
                    doc_id: None,
                    chunks: None,
                    error: Some(format!("failed to read file: {}", e)),
                });
                continue;
            }
        };

        if data.len() > max_file_size {
            failed += 1;
            results.push(UploadFileResult {
                filename,
                status: "error",
                doc_id: None,
                chunks: None,
                error: Some(format!(
                    "file exceeds the {} MB limit",
                    max_file_size / (1024 * 1024)
                )),
            });
            continue;
        }

        tracing::info!("processing upload '{}' ({} bytes)", filename, data.len());

        match state.ingest_file(&filename, &data).await {
            Ok((doc_id, chunks)) => {
                processed += 1;
                results.push(UploadFileResult {
                    filename,
                    status: "success",
                    doc_id: Some(doc_id),
                    chunks: Some(chunks),
                    error: None,
                });
            }
            // A dead embedder fails the batch; the index stays consistent
            Err(e @ Error::EmbedderUnavailable(_)) => return Err(e),
            Err(e) => {
                tracing::warn!("failed to process '{}': {}", filename, e);
                failed += 1;
                results.push(UploadFileResult {
                    filename,
                    status: "error",
                    doc_id: None,
                    chunks: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    if seen == 0 {
        return Err(Error::InvalidRequest("no files uploaded".to_string()));
    }

    Ok(Json(UploadResponse {
        processed,
        failed,
        results,
        total_documents: state.index().count_documents(),
        total_chunks: state.index().count_chunks(),
    }))
}

#[derive(Deserialize)]
pub struct IngestUrlRequest {
    pub url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestUrlResponse {
    pub doc_id: Uuid,
    pub chunks: usize,
    pub total_documents: usize,
    pub total_chunks: usize,
}

/// POST /api/documents/url
pub async fn ingest_url(
    State(state): State<AppState>,
    Json(request): Json<IngestUrlRequest>,
) -> Result<Json<IngestUrlResponse>> {
    if request.url.trim().is_empty() {
        return Err(Error::InvalidRequest("url is required".to_string()));
    }

    let (doc_id, chunks) = state.ingest_url(&request.url).await?;
    tracing::info!("ingested URL '{}' ({} chunks)", request.url, chunks);

    Ok(Json(IngestUrlResponse {
        doc_id,
        chunks,
        total_documents: state.index().count_documents(),
        total_chunks: state.index().count_chunks(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub name: String,
    pub chunks: usize,
    pub added_at: chrono::DateTime<chrono::Utc>,
}

impl From<Document> for DocumentSummary {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            chunks: doc.chunk_count,
            added_at: doc.added_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total_chunks: usize,
}

/// GET /api/documents
pub async fn list(State(state): State<AppState>) -> Json<DocumentListResponse> {
    Json(DocumentListResponse {
        documents: state
            .index()
            .list_documents()
            .into_iter()
            .map(DocumentSummary::from)
            .collect(),
        total_chunks: state.index().count_chunks(),
    })
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// DELETE /api/documents/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let doc_id = Uuid::parse_str(&id).map_err(|_| Error::DocumentNotFound(id.clone()))?;
    let removed = state.index().remove(&doc_id)?;
    tracing::info!("deleted document {} ({} chunks)", doc_id, removed);
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/documents/clear
pub async fn clear(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.index().clear();
    tracing::info!("cleared all documents");
    Json(SuccessResponse { success: true })
}
