//! HTTP request handlers organized by domain

pub mod folder;
pub mod orchestrator;
pub mod statements;
pub mod system;

// Re-export all handlers for use in router
pub use folder::*;
pub use orchestrator::*;
pub use statements::*;
pub use system::*;

use serde::Deserialize;

/// Request body shared by every single-file operation
#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub file_id: String,
    /// Optional name for the uploaded CSV; derived from the source file
    /// when absent
    #[serde(default)]
    pub output_filename: Option<String>,
}
