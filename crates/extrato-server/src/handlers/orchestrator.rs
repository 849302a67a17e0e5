//! Identification and auto-routed extraction handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use extrato_core::{ExtractionOutcome, Identification, Pipeline};

use crate::{AppError, AppState};

use super::FileRequest;

#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
    pub file_id: String,
    #[serde(flatten)]
    pub identification: Identification,
}

#[derive(Debug, Serialize)]
pub struct OcrFileResponse {
    pub identification: Identification,
    #[serde(flatten)]
    pub outcome: ExtractionOutcome,
}

/// POST /api/v1/identify-file - classify a Drive file
///
/// Identification failures (download, conversion, model transport) are
/// surfaced as errors; an unreadable but reachable document comes back
/// as the unknown classification.
pub async fn identify_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FileRequest>,
) -> Result<Json<IdentifyResponse>, AppError> {
    let pipeline = state.pipeline()?;
    let identification = pipeline.identify(&request.file_id).await?;
    Ok(Json(IdentifyResponse {
        file_id: request.file_id,
        identification,
    }))
}

/// POST /api/v1/ocr-file - identify, route, and extract in one call
pub async fn ocr_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FileRequest>,
) -> Result<Json<OcrFileResponse>, AppError> {
    let pipeline = state.pipeline()?;

    let identification = pipeline.identify(&request.file_id).await?;
    Pipeline::route(&identification.bank, identification.document_type)?;

    let outcome = pipeline
        .extract(
            &request.file_id,
            &identification.bank,
            identification.document_type,
            request.output_filename.as_deref(),
        )
        .await;

    Ok(Json(OcrFileResponse {
        identification,
        outcome,
    }))
}
