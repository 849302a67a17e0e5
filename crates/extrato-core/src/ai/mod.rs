//! Vision model abstraction
//!
//! A single trait covers what the pipeline needs from a model: send page
//! images with an instruction, get text back. `ModelClient` is the
//! concrete enum wrapper giving Clone and compile-time dispatch; the mock
//! variant drives tests without network access.

mod mock;
mod openai;

pub use mock::MockModel;
pub use openai::OpenAiBackend;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::settings::LlmSettings;

/// Interface every vision backend implements
///
/// Backends are Send + Sync so clients can be shared across async tasks.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Send page images plus an instruction, returning the raw model text
    async fn analyze(&self, images: &[Vec<u8>], instruction: &str, max_tokens: u32)
        -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for health reporting)
    fn model(&self) -> &str;
}

/// Concrete model client enum
#[derive(Clone)]
pub enum ModelClient {
    /// OpenAI or any server speaking the chat-completions API
    OpenAi(OpenAiBackend),
    /// Scripted backend for testing
    Mock(MockModel),
}

impl ModelClient {
    /// Build a client from settings; `None` when no API key is configured
    pub fn from_settings(settings: &LlmSettings) -> Option<Self> {
        let api_key = settings.api_key.as_deref()?;
        Some(ModelClient::OpenAi(OpenAiBackend::new(
            settings.base_url.as_deref(),
            &settings.model,
            api_key,
        )))
    }

    pub fn mock() -> Self {
        ModelClient::Mock(MockModel::new())
    }
}

#[async_trait]
impl VisionBackend for ModelClient {
    async fn analyze(
        &self,
        images: &[Vec<u8>],
        instruction: &str,
        max_tokens: u32,
    ) -> Result<String> {
        match self {
            ModelClient::OpenAi(b) => b.analyze(images, instruction, max_tokens).await,
            ModelClient::Mock(b) => b.analyze(images, instruction, max_tokens).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ModelClient::OpenAi(b) => b.health_check().await,
            ModelClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ModelClient::OpenAi(b) => b.model(),
            ModelClient::Mock(b) => b.model(),
        }
    }
}

/// Run an async operation with exponential backoff
///
/// The delay before attempt `n` is `base_delay * 2^(n-1)`. The last error
/// is returned once attempts are exhausted.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay_secs: f64,
    label: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < max_retries.max(1) => {
                let delay = base_delay_secs * f64::powi(2.0, attempt as i32);
                warn!(
                    attempt = attempt + 1,
                    delay_secs = delay,
                    "{} failed, retrying: {}",
                    label,
                    e
                );
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
