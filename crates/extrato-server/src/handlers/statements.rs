//! Fixed-bank extraction endpoints
//!
//! Each endpoint skips identification and runs extraction with a known
//! bank and document type. The outcome is always 200 with a structured
//! body; extraction problems show up as `success: false`.

use std::sync::Arc;

use axum::{extract::State, Json};

use extrato_core::{DocumentKind, ExtractionOutcome};

use crate::{AppError, AppState};

use super::FileRequest;

async fn extract_fixed(
    state: &AppState,
    request: &FileRequest,
    bank: &str,
    kind: DocumentKind,
) -> Result<Json<ExtractionOutcome>, AppError> {
    let pipeline = state.pipeline()?;
    Ok(Json(
        pipeline
            .extract(
                &request.file_id,
                bank,
                kind,
                request.output_filename.as_deref(),
            )
            .await,
    ))
}

/// POST /api/v1/ocr-bank-statement-picpay
pub async fn picpay_bank_statement(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FileRequest>,
) -> Result<Json<ExtractionOutcome>, AppError> {
    extract_fixed(&state, &request, "picpay", DocumentKind::BankStatement).await
}

/// POST /api/v1/ocr-bank-statement-itau
pub async fn itau_bank_statement(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FileRequest>,
) -> Result<Json<ExtractionOutcome>, AppError> {
    extract_fixed(&state, &request, "itau", DocumentKind::BankStatement).await
}

/// POST /api/v1/ocr-cc-statement-picpay
pub async fn picpay_credit_card(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FileRequest>,
) -> Result<Json<ExtractionOutcome>, AppError> {
    extract_fixed(&state, &request, "picpay", DocumentKind::CreditCard).await
}

/// POST /api/v1/ocr-cc-statement-itau
pub async fn itau_credit_card(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FileRequest>,
) -> Result<Json<ExtractionOutcome>, AppError> {
    extract_fixed(&state, &request, "itau", DocumentKind::CreditCard).await
}

/// POST /api/v1/ocr-cc-statement-xp
pub async fn xp_credit_card(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FileRequest>,
) -> Result<Json<ExtractionOutcome>, AppError> {
    extract_fixed(&state, &request, "xp", DocumentKind::CreditCard).await
}
