//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use image::ImageOutputFormat;
use tower::ServiceExt;

use extrato_core::{DriveFile, MockModel, MockStore};

fn test_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 64, image::Rgb([180u8, 180, 180]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Jpeg(85))
        .unwrap();
    buf.into_inner()
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.llm.retry_delay = 0.0;
    settings.drive.input_folder_id = Some("input".into());
    settings.drive.output_folder_id = Some("output".into());
    settings
}

fn setup_app(model: MockModel, store: MockStore) -> Router {
    setup_app_with_settings(model, store, test_settings())
}

fn setup_app_with_settings(model: MockModel, store: MockStore, settings: Settings) -> Router {
    let state = AppState {
        settings: Arc::new(settings),
        prompts: Arc::new(PromptStore::embedded().unwrap()),
        model: Some(ModelClient::Mock(model)),
        store: Some(StoreClient::Mock(store)),
    };
    create_router(state)
}

fn setup_unconfigured_app() -> Router {
    let state = AppState {
        settings: Arc::new(Settings::default()),
        prompts: Arc::new(PromptStore::embedded().unwrap()),
        model: None,
        store: None,
    };
    create_router(state)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ========== System ==========

#[tokio::test]
async fn test_root_banner() {
    let app = setup_app(MockModel::new(), MockStore::new());
    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["service"], "extrato");
    assert_eq!(json["docs"], "/api/v1");
}

#[test]
fn test_build_state_uses_configured_prompts_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "identify_file: custom instruction\n").unwrap();
    file.flush().unwrap();

    let mut settings = Settings::default();
    settings.prompts_file = file.path().to_path_buf();

    let state = build_state(settings).unwrap();
    assert_eq!(
        state.prompts.get("identify_file").unwrap(),
        "custom instruction"
    );
}

#[test]
fn test_build_state_falls_back_to_embedded_prompts() {
    let mut settings = Settings::default();
    settings.prompts_file = std::path::PathBuf::from("/nonexistent/prompts.yaml");

    let state = build_state(settings).unwrap();
    assert!(state.prompts.get("identify_file").is_ok());
}

#[tokio::test]
async fn test_health_reports_dependency_state() {
    let app = setup_app(MockModel::new(), MockStore::new());
    let response = app.oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["dependencies"]["llm_configured"], true);
    assert_eq!(json["dependencies"]["drive_configured"], true);
    assert!(json["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_health_with_nothing_configured() {
    let app = setup_unconfigured_app();
    let response = app.oneshot(get("/api/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["dependencies"]["llm_configured"], false);
    assert_eq!(json["dependencies"]["drive_configured"], false);
}

#[tokio::test]
async fn test_show_config_masks_api_key() {
    let mut settings = test_settings();
    settings.llm.api_key = Some("sk-secret".into());
    let app = setup_app_with_settings(MockModel::new(), MockStore::new(), settings);

    let response = app.oneshot(get("/api/v1/show-config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["api_key"], "***configured***");
    assert!(!json.to_string().contains("sk-secret"));
    assert_eq!(json["input_folder_id"], "input");
    // Prompt names are listed, contents are not
    assert!(json["prompts"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p == "identify_file"));
}

// ========== Identification ==========

#[tokio::test]
async fn test_identify_file() {
    let model = MockModel::new();
    model.push_response(r#"{"bank": "itau", "document_type": "credit_card", "confidence": 0.92}"#);
    let store = MockStore::new();
    store.seed_file("f1", "fatura.jpg", test_jpeg());

    let app = setup_app(model, store);
    let response = app
        .oneshot(post_json(
            "/api/v1/identify-file",
            serde_json::json!({"file_id": "f1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["bank"], "itau");
    assert_eq!(json["document_type"], "credit_card");
}

#[tokio::test]
async fn test_identify_file_surfaces_transport_failure() {
    let model = MockModel::new();
    for _ in 0..3 {
        model.push_error("connection reset by peer");
    }
    let store = MockStore::new();
    store.seed_file("f1", "fatura.jpg", test_jpeg());

    let app = setup_app(model, store);
    let response = app
        .oneshot(post_json(
            "/api/v1/identify-file",
            serde_json::json!({"file_id": "f1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("connection reset by peer"));
}

#[tokio::test]
async fn test_identify_file_requires_configured_clients() {
    let app = setup_unconfigured_app();
    let response = app
        .oneshot(post_json(
            "/api/v1/identify-file",
            serde_json::json!({"file_id": "f1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

// ========== Auto-routed extraction ==========

#[tokio::test]
async fn test_ocr_file_end_to_end() {
    let model = MockModel::new();
    model.push_response(
        r#"{"bank": "picpay", "document_type": "bank_statement", "confidence": 0.9}"#,
    );
    model.push_response("date,description,amount\n02/01/2024,PIX,150.00\n");
    let store = MockStore::new();
    store.seed_file("f1", "extrato.jpg", test_jpeg());

    let app = setup_app(model, store.clone());
    let response = app
        .oneshot(post_json(
            "/api/v1/ocr-file",
            serde_json::json!({"file_id": "f1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["identification"]["bank"], "picpay");
    assert_eq!(json["success"], true);
    assert_eq!(json["transactions_count"], 1);
    assert_eq!(store.uploads().len(), 1);
}

#[tokio::test]
async fn test_ocr_file_rejects_unsupported_bank() {
    let model = MockModel::new();
    model.push_response(r#"{"bank": "amex", "document_type": "credit_card", "confidence": 0.9}"#);
    let store = MockStore::new();
    store.seed_file("f1", "fatura.jpg", test_jpeg());

    let app = setup_app(model, store.clone());
    let response = app
        .oneshot(post_json(
            "/api/v1/ocr-file",
            serde_json::json!({"file_id": "f1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("amex"));
    assert!(store.uploads().is_empty());
}

// ========== Fixed-bank endpoints ==========

#[tokio::test]
async fn test_picpay_bank_statement_uploads_csv() {
    let model = MockModel::new();
    model.push_response("date,description,amount\n02/01/2024,PIX RECEBIDO,150.00\n03/01/2024,MERCADO,-87.50\n");
    let store = MockStore::new();
    store.seed_file("f1", "extrato_jan.pdf.jpg", test_jpeg());

    let app = setup_app(model, store.clone());
    let response = app
        .oneshot(post_json(
            "/api/v1/ocr-bank-statement-picpay",
            serde_json::json!({"file_id": "f1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["transactions_count"], 2);
    assert!(json["csv_file_url"].as_str().unwrap().contains("drive.google.com"));

    let uploads = store.uploads();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].content.starts_with('\u{feff}'));
    assert!(uploads[0]
        .content
        .contains("date,description,amount,balance,category,installments"));
}

#[tokio::test]
async fn test_extraction_failure_is_structured_not_http_error() {
    let model = MockModel::new();
    for _ in 0..3 {
        model.push_error("model overloaded");
    }
    let store = MockStore::new();
    store.seed_file("f1", "fatura.jpg", test_jpeg());

    let app = setup_app(model, store);
    let response = app
        .oneshot(post_json(
            "/api/v1/ocr-cc-statement-xp",
            serde_json::json!({"file_id": "f1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("model overloaded"));
    assert!(json.get("csv_file_id").is_none());
}

// ========== Input folder ==========

#[tokio::test]
async fn test_list_input_files() {
    let store = MockStore::new();
    store.seed_folder_entry(
        "input",
        DriveFile {
            id: "f1".into(),
            name: "extrato.pdf".into(),
            mime_type: Some("application/pdf".into()),
            size: Some("1000".into()),
            created_time: None,
        },
    );
    store.seed_folder_entry(
        "input",
        DriveFile {
            id: "f2".into(),
            name: "notes.docx".into(),
            mime_type: None,
            size: None,
            created_time: None,
        },
    );

    let app = setup_app(MockModel::new(), store);
    let response = app.oneshot(get("/api/v1/list-input-files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total_files"], 2);
    assert_eq!(json["supported_files"], 1);
    assert_eq!(json["folder_id"], "input");
}

#[tokio::test]
async fn test_list_input_files_without_configured_folder() {
    let app = setup_app_with_settings(MockModel::new(), MockStore::new(), Settings::default());
    let response = app.oneshot(get("/api/v1/list-input-files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_input_folder_isolates_failures() {
    let model = MockModel::new();
    let store = MockStore::new();

    for i in 1..=2 {
        let id = format!("f{}", i);
        let name = format!("extrato_{}.jpg", i);
        store.seed_file(&id, &name, test_jpeg());
        store.seed_folder_entry(
            "input",
            DriveFile {
                id,
                name,
                mime_type: Some("image/jpeg".into()),
                size: None,
                created_time: None,
            },
        );
    }

    // First file succeeds, second file's identify keeps failing
    model.push_response(
        r#"{"bank": "itau", "document_type": "bank_statement", "confidence": 0.9}"#,
    );
    model.push_response("date,description,amount\n01/01/2024,TED,-10.00\n");
    for _ in 0..3 {
        model.push_error("unreadable scan");
    }

    let app = setup_app(model, store.clone());
    let response = app
        .oneshot(post_json(
            "/api/v1/process-input-folder",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total_files"], 2);
    assert_eq!(json["processed_files"].as_array().unwrap().len(), 1);
    assert_eq!(json["failed_files"].as_array().unwrap().len(), 1);
    assert_eq!(json["failed_files"][0]["file_id"], "f2");
    assert_eq!(store.uploads().len(), 1);
}
