//! Scripted mock backend for tests
//!
//! Responses are consumed in FIFO order; once the queue is empty a fixed
//! default comes back. An `Err` entry surfaces as an `InvalidData` error,
//! which lets tests exercise failure paths per call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::VisionBackend;

#[derive(Clone)]
pub struct MockModel {
    responses: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    default_response: String,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default_response: "date,description,amount\n01/01/2024,MOCK,0.00\n".to_string(),
        }
    }

    /// Queue a successful response
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Ok(response.into()));
    }

    /// Queue a failure
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Err(message.into()));
    }

    pub fn with_default(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionBackend for MockModel {
    async fn analyze(
        &self,
        _images: &[Vec<u8>],
        _instruction: &str,
        _max_tokens: u32,
    ) -> Result<String> {
        let next = self.responses.lock().expect("mock lock").pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(Error::InvalidData(message)),
            None => Ok(self.default_response.clone()),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        "mock"
    }
}
