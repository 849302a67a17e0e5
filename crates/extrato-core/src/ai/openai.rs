//! OpenAI chat-completions backend
//!
//! Works with api.openai.com and any server implementing the same
//! `/v1/chat/completions` API. Page images travel inline as base64 data
//! URLs in a multimodal user message.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::VisionBackend;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl Clone for OpenAiBackend {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

impl OpenAiBackend {
    pub fn new(base_url: Option<&str>, model: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl VisionBackend for OpenAiBackend {
    async fn analyze(
        &self,
        images: &[Vec<u8>],
        instruction: &str,
        max_tokens: u32,
    ) -> Result<String> {
        // Text-only requests stay a plain string; multimodal requests use
        // the parts form with one data-URL entry per page image
        let content = if images.is_empty() {
            ChatContent::Text(instruction.to_string())
        } else {
            let mut parts = vec![ContentPart::Text {
                text: instruction.to_string(),
            }];
            for image in images {
                let encoded = base64::engine::general_purpose::STANDARD.encode(image);
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/jpeg;base64,{}", encoded),
                    },
                });
            }
            ChatContent::Parts(parts)
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            temperature: Some(0.1),
            max_tokens: Some(max_tokens),
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        debug!(
            model = %self.model,
            images = images.len(),
            "Chat completion returned"
        );

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::InvalidData("No choices in model response".into()))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

/// Chat message content (text or multimodal)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
