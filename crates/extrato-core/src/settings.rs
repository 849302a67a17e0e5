//! Process-wide configuration
//!
//! Settings are loaded once at startup from an optional YAML file, then
//! overlaid with environment variables for everything secret. The resulting
//! struct is passed by reference to each component at construction time;
//! nothing reads config from ambient globals after startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Top-level application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppSettings,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub drive: DriveSettings,
    pub processing: ProcessingSettings,
    /// Prompts YAML that overrides the embedded defaults when present
    pub prompts_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            server: ServerSettings::default(),
            llm: LlmSettings::default(),
            drive: DriveSettings::default(),
            processing: ProcessingSettings::default(),
            prompts_file: PathBuf::from("config/prompts.yaml"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub debug: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "extrato".to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model name sent in chat-completion requests
    pub model: String,
    /// Base URL override for OpenAI-compatible servers; empty means the
    /// public OpenAI endpoint
    pub base_url: Option<String>,
    /// API key; only ever read from the environment, never from file
    #[serde(skip)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Retry attempts for external calls
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff
    pub retry_delay: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: None,
            api_key: None,
            max_tokens: 4000,
            temperature: 0.1,
            max_retries: 3,
            retry_delay: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DriveSettings {
    /// Path to the service-account credentials JSON; env only
    #[serde(skip)]
    pub credentials_path: Option<PathBuf>,
    pub input_folder_id: Option<String>,
    pub output_folder_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Lowercased file extensions accepted by the bulk-folder operation
    pub supported_formats: Vec<String>,
    /// Resolution cap for PDF page images
    pub pdf_dpi: u32,
    pub max_file_size_mb: u64,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "pdf".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
            ],
            pdf_dpi: 300,
            max_file_size_mb: 50,
        }
    }
}

impl Settings {
    /// Load settings from an optional YAML file, then apply env overrides
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                serde_yaml::from_str(&content)?
            }
            None => Settings::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Overlay secrets and deployment-specific values from the environment
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            if !url.is_empty() {
                self.llm.base_url = Some(url);
            }
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(path) = std::env::var("GOOGLE_DRIVE_CREDENTIALS_PATH") {
            if !path.is_empty() {
                self.drive.credentials_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(id) = std::env::var("GOOGLE_DRIVE_INPUT_FOLDER_ID") {
            if !id.is_empty() {
                self.drive.input_folder_id = Some(id);
            }
        }
        if let Ok(id) = std::env::var("GOOGLE_DRIVE_OUTPUT_FOLDER_ID") {
            if !id.is_empty() {
                self.drive.output_folder_id = Some(id);
            }
        }
        if let Ok(path) = std::env::var("EXTRATO_PROMPTS_FILE") {
            if !path.is_empty() {
                self.prompts_file = PathBuf::from(path);
            }
        }
    }

    /// Check whether a filename has one of the supported extensions
    pub fn is_supported_format(&self, filename: &str) -> bool {
        let ext = filename
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        self.processing.supported_formats.iter().any(|f| f == &ext)
    }
}
