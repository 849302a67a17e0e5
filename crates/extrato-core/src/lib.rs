//! Extrato Core Library
//!
//! Shared functionality for the statement OCR service:
//! - Drive download/upload with service-account auth
//! - PDF and image conversion to model-ready page images
//! - Pluggable vision model backends (OpenAI-compatible, mock)
//! - Prompt store with embedded defaults and file overrides
//! - CSV repair into the fixed transaction schema
//! - The processing pipeline tying identification and extraction together

pub mod ai;
pub mod convert;
pub mod csv_output;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod settings;
pub mod store;

pub use ai::{retry_with_backoff, MockModel, ModelClient, OpenAiBackend, VisionBackend};
pub use error::{Error, Result};
pub use models::{DocumentKind, DriveFile, ExtractionOutcome, Identification, TransactionRow};
pub use pipeline::{FailedFile, FolderSummary, Pipeline, ProcessedFile};
pub use prompts::{extraction_key, PromptStore, IDENTIFY_PROMPT};
pub use settings::Settings;
pub use store::{DriveStore, FileStore, MockStore, StoreClient, StoredDocument, UploadedCsv};
