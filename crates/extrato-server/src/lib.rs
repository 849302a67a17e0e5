//! Extrato Web Server
//!
//! Axum-based REST API around the statement OCR pipeline. The API is
//! deliberately small: classify a Drive file, extract its transactions,
//! run the input folder in bulk, plus health and config introspection.
//!
//! The model and Drive clients are optional at startup so the service
//! can boot (and report health) without credentials; operations that
//! need them fail with a clear error instead.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use extrato_core::{ModelClient, Pipeline, PromptStore, Settings, StoreClient};

mod handlers;

/// Shared application state
pub struct AppState {
    pub settings: Arc<Settings>,
    pub prompts: Arc<PromptStore>,
    pub model: Option<ModelClient>,
    pub store: Option<StoreClient>,
}

impl AppState {
    /// Assemble a pipeline, or explain which dependency is missing
    pub fn pipeline(&self) -> Result<Pipeline, AppError> {
        let model = self.model.clone().ok_or_else(|| {
            AppError::internal("LLM client is not configured (set OPENAI_API_KEY)")
        })?;
        let store = self.store.clone().ok_or_else(|| {
            AppError::internal(
                "Google Drive client is not configured (set GOOGLE_DRIVE_CREDENTIALS_PATH)",
            )
        })?;
        Ok(Pipeline::new(
            model,
            store,
            self.prompts.clone(),
            self.settings.clone(),
        ))
    }
}

/// Build application state from settings, constructing whatever clients
/// the configuration allows
pub fn build_state(settings: Settings) -> anyhow::Result<AppState> {
    let prompts = Arc::new(PromptStore::load(Some(settings.prompts_file.clone()))?);
    if settings.prompts_file.exists() {
        info!(path = %settings.prompts_file.display(), "Loaded prompts file");
    }

    let model = ModelClient::from_settings(&settings.llm);
    if model.is_some() {
        info!(model = %settings.llm.model, "LLM client configured");
    } else {
        info!("LLM client not configured (set OPENAI_API_KEY)");
    }

    let store = match StoreClient::from_settings(&settings.drive) {
        Some(result) => {
            let client = result?;
            info!("Google Drive client configured");
            Some(client)
        }
        None => {
            info!("Google Drive client not configured (set GOOGLE_DRIVE_CREDENTIALS_PATH)");
            None
        }
    };

    Ok(AppState {
        settings: Arc::new(settings),
        prompts,
        model,
        store,
    })
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Orchestration
        .route("/identify-file", post(handlers::identify_file))
        .route("/ocr-file", post(handlers::ocr_file))
        // Fixed-bank endpoints
        .route(
            "/ocr-bank-statement-picpay",
            post(handlers::picpay_bank_statement),
        )
        .route(
            "/ocr-bank-statement-itau",
            post(handlers::itau_bank_statement),
        )
        .route("/ocr-cc-statement-picpay", post(handlers::picpay_credit_card))
        .route("/ocr-cc-statement-itau", post(handlers::itau_credit_card))
        .route("/ocr-cc-statement-xp", post(handlers::xp_credit_card))
        // Bulk input folder
        .route("/list-input-files", get(handlers::list_input_files))
        .route("/process-input-folder", post(handlers::process_input_folder))
        // System
        .route("/health", get(handlers::health))
        .route("/show-config", get(handlers::show_config));

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api/v1", api_routes)
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the server
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let app = create_router(state);

    info!("Starting server at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "{}", self.message);
        }
        let body = Json(serde_json::json!({
            "error": self.message
        }));
        (self.status, body).into_response()
    }
}

impl From<extrato_core::Error> for AppError {
    fn from(err: extrato_core::Error) -> Self {
        use extrato_core::Error;
        match err {
            // Routing rejections are the caller's mistake
            Error::UnsupportedBank(_) | Error::UnsupportedDocument(_) => {
                AppError::bad_request(err.to_string())
            }
            _ => AppError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests;
