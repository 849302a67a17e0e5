//! Input-folder listing and bulk processing handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use extrato_core::{DriveFile, FileStore, FolderSummary};

use crate::{AppError, AppState};

#[derive(Debug, Serialize)]
pub struct InputFolderListing {
    pub folder_id: String,
    pub total_files: usize,
    pub supported_files: usize,
    pub files: Vec<DriveFile>,
}

/// GET /api/v1/list-input-files - list the configured input folder
pub async fn list_input_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InputFolderListing>, AppError> {
    let folder_id = state
        .settings
        .drive
        .input_folder_id
        .clone()
        .ok_or_else(|| AppError::bad_request("Input folder is not configured"))?;

    let store = state.store.clone().ok_or_else(|| {
        AppError::internal(
            "Google Drive client is not configured (set GOOGLE_DRIVE_CREDENTIALS_PATH)",
        )
    })?;

    let files = store.list_folder(&folder_id).await?;
    let supported_files = files
        .iter()
        .filter(|f| state.settings.is_supported_format(&f.name))
        .count();

    Ok(Json(InputFolderListing {
        folder_id,
        total_files: files.len(),
        supported_files,
        files,
    }))
}

/// POST /api/v1/process-input-folder - process every supported file
pub async fn process_input_folder(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FolderSummary>, AppError> {
    if state.settings.drive.input_folder_id.is_none() {
        return Err(AppError::bad_request("Input folder is not configured"));
    }
    let pipeline = state.pipeline()?;
    let summary = pipeline.process_folder().await?;
    Ok(Json(summary))
}
