//! Error types for extrato

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Drive API error: {0}")]
    Drive(String),

    #[error("PDF conversion error: {0}")]
    Pdf(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported bank: {0}")]
    UnsupportedBank(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedDocument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
