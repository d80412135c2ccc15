//! Scripted gateway for handler tests.

use super::{AiGateway, ApiKeyState, ChatCompletion, GeneratedImage};
use crate::error::{AppError, AppResult};
use crate::models::{ChatMessage, ImagePrompt};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FakeAiGateway {
    key: ApiKeyState,
    pub calls: AtomicUsize,
    pub last_image_prompt: Mutex<Option<ImagePrompt>>,
    fail_with: Mutex<Option<AppError>>,
}

impl FakeAiGateway {
    pub fn new() -> Self {
        Self::with_key(ApiKeyState::Configured)
    }

    pub fn with_key(key: ApiKeyState) -> Self {
        Self {
            key,
            calls: AtomicUsize::new(0),
            last_image_prompt: Mutex::new(None),
            fail_with: Mutex::new(None),
        }
    }

    pub fn fail_next(&self, err: AppError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_with.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AiGateway for FakeAiGateway {
    fn api_key_state(&self) -> ApiKeyState {
        self.key
    }

    async fn chat(&self, _system: &str, messages: &[ChatMessage]) -> AppResult<ChatCompletion> {
        self.record_call()?;
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        Ok(ChatCompletion {
            content: format!("Allô! Tu m'as demandé: {last}"),
            model: "fake/concierge".to_string(),
        })
    }

    async fn generate_image(&self, prompt: &ImagePrompt) -> AppResult<GeneratedImage> {
        self.record_call()?;
        *self.last_image_prompt.lock().unwrap() = Some(prompt.clone());
        Ok(GeneratedImage {
            url: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            description: "Château Frontenac under snow".to_string(),
        })
    }
}
