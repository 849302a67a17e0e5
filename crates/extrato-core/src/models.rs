//! Shared data types for identification, extraction, and Drive listings

use serde::{Deserialize, Serialize};

/// Document categories the identification step can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    BankStatement,
    CreditCard,
    #[serde(other)]
    Unknown,
}

impl DocumentKind {
    /// String form used in prompt keys and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank_statement",
            Self::CreditCard => "credit_card",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label used in result messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank statement",
            Self::CreditCard => "credit card statement",
            Self::Unknown => "unknown document",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification produced by the identify operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identification {
    #[serde(default = "unknown_bank")]
    pub bank: String,
    #[serde(default = "unknown_kind")]
    pub document_type: DocumentKind,
    #[serde(default)]
    pub confidence: f64,
}

fn unknown_bank() -> String {
    "unknown".to_string()
}

fn unknown_kind() -> DocumentKind {
    DocumentKind::Unknown
}

impl Identification {
    /// Fallback used when the model response cannot be parsed
    pub fn unknown() -> Self {
        Self {
            bank: "unknown".to_string(),
            document_type: DocumentKind::Unknown,
            confidence: 0.0,
        }
    }
}

/// One extracted transaction line item
///
/// The schema is fixed and ordered; optional fields serialize as empty
/// strings, never as absent columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRow {
    pub date: String,
    pub description: String,
    pub amount: String,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub installments: String,
}

/// Terminal result of an extraction operation
///
/// `success == false` implies the csv/count/timing fields are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutcome {
    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            csv_file_id: None,
            csv_file_url: None,
            transactions_count: None,
            processing_time_seconds: None,
            error: Some(error.into()),
        }
    }
}

/// A file entry from a Drive folder listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
}
