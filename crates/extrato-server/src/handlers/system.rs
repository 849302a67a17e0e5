//! Health and configuration introspection handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use extrato_core::VisionBackend;

use crate::{AppError, AppState};

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: String,
    pub version: &'static str,
    pub docs: &'static str,
}

/// GET / - service banner
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        service: state.settings.app.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        docs: "/api/v1",
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub dependencies: Dependencies,
}

#[derive(Debug, Serialize)]
pub struct Dependencies {
    pub llm_configured: bool,
    pub llm_model: Option<String>,
    pub drive_configured: bool,
}

/// GET /api/v1/health - liveness plus dependency configuration
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        dependencies: Dependencies {
            llm_configured: state.model.is_some(),
            llm_model: state.model.as_ref().map(|m| m.model().to_string()),
            drive_configured: state.store.is_some(),
        },
    })
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub app_name: String,
    pub llm_model: String,
    pub llm_base_url: Option<String>,
    pub api_key: &'static str,
    pub input_folder_id: Option<String>,
    pub output_folder_id: Option<String>,
    pub supported_formats: Vec<String>,
    pub pdf_dpi: u32,
    pub prompts: Vec<String>,
}

/// GET /api/v1/show-config - effective configuration with secrets masked
pub async fn show_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigResponse>, AppError> {
    let settings = &state.settings;
    Ok(Json(ConfigResponse {
        app_name: settings.app.name.clone(),
        llm_model: settings.llm.model.clone(),
        llm_base_url: settings.llm.base_url.clone(),
        api_key: if settings.llm.api_key.is_some() {
            "***configured***"
        } else {
            "not set"
        },
        input_folder_id: settings.drive.input_folder_id.clone(),
        output_folder_id: settings.drive.output_folder_id.clone(),
        supported_formats: settings.processing.supported_formats.clone(),
        pdf_dpi: settings.processing.pdf_dpi,
        prompts: state.prompts.names(),
    }))
}
