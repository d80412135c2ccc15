use crate::config::AiGatewayConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ChatMessage, ChatRole, ImagePrompt};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const GATEWAY_HELP_URL: &str = "https://vercel.com/docs/ai-gateway";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// `data:` URL or remote URL as returned by the provider.
    pub url: String,
    pub description: String,
}

/// Hosted model provider used by the chat and image endpoints.
#[async_trait]
pub trait AiGateway: Send + Sync {
    fn api_key_state(&self) -> ApiKeyState;

    fn is_configured(&self) -> bool {
        self.api_key_state() == ApiKeyState::Configured
    }

    async fn chat(&self, system: &str, messages: &[ChatMessage]) -> AppResult<ChatCompletion>;

    async fn generate_image(&self, prompt: &ImagePrompt) -> AppResult<GeneratedImage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyState {
    Missing,
    Empty,
    Configured,
}

impl ApiKeyState {
    pub fn of(key: Option<&str>) -> Self {
        match key {
            None => ApiKeyState::Missing,
            Some(k) if k.trim().is_empty() => ApiKeyState::Empty,
            Some(_) => ApiKeyState::Configured,
        }
    }
}

/// OpenAI-compatible gateway client (`POST {base_url}/chat/completions`).
#[derive(Clone)]
pub struct HttpAiGateway {
    http: Client,
    cfg: AiGatewayConfig,
}

impl HttpAiGateway {
    pub fn new(cfg: AiGatewayConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("guide-vrai-backend/ai-gateway")
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }

    async fn post(&self, body: serde_json::Value) -> AppResult<CompletionResponse> {
        if !self.is_configured() {
            return Err(missing_key_error());
        }

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.cfg.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }
        Ok(resp.json().await?)
    }
}

fn missing_key_error() -> AppError {
    AppError::ConfigError(format!(
        "AI Gateway API key is not configured. Set AI_GATEWAY_API_KEY, see {GATEWAY_HELP_URL}"
    ))
}

fn classify_transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() || err.is_connect() {
        AppError::GatewayUnreachable(
            "Failed to connect to AI Gateway. Please try again.".to_string(),
        )
    } else {
        AppError::ReqwestError(err)
    }
}

fn classify_status(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::ConfigError(
            "Invalid or missing AI Gateway API key. Please check your environment variables."
                .to_string(),
        ),
        StatusCode::TOO_MANY_REQUESTS => {
            AppError::RateLimited("Too many requests. Please try again later.".to_string())
        }
        _ => AppError::ExternalApiError(format!(
            "AI Gateway returned HTTP {}: {}",
            status.as_u16(),
            body.chars().take(500).collect::<String>()
        )),
    }
}

#[async_trait]
impl AiGateway for HttpAiGateway {
    fn api_key_state(&self) -> ApiKeyState {
        ApiKeyState::of(self.cfg.api_key.as_deref())
    }

    async fn chat(&self, system: &str, messages: &[ChatMessage]) -> AppResult<ChatCompletion> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(json!({ "role": ChatRole::System, "content": system }));
        wire.extend(
            messages
                .iter()
                .map(|m| json!({ "role": m.role, "content": m.content })),
        );

        let resp = self
            .post(json!({ "model": self.cfg.chat_model, "messages": wire }))
            .await?;
        let model = resp.model.clone().unwrap_or_else(|| self.cfg.chat_model.clone());
        let message = resp.into_first_message()?;

        Ok(ChatCompletion {
            content: message.content.unwrap_or_default(),
            model,
        })
    }

    async fn generate_image(&self, prompt: &ImagePrompt) -> AppResult<GeneratedImage> {
        let mut content = Vec::with_capacity(prompt.image_urls.len() + 1);
        for url in &prompt.image_urls {
            content.push(json!({ "type": "image_url", "image_url": { "url": url } }));
        }
        content.push(json!({ "type": "text", "text": prompt.gateway_text() }));

        let resp = self
            .post(json!({
                "model": self.cfg.image_model,
                "messages": [{ "role": "user", "content": content }],
                "modalities": ["image", "text"],
            }))
            .await?;
        let message = resp.into_first_message()?;

        let url = message
            .images
            .into_iter()
            .map(|img| img.image_url.url)
            .find(|url| !url.starts_with("data:") || url.starts_with("data:image/"))
            .ok_or_else(|| {
                AppError::ExternalApiError(
                    "No image generated: the model did not return any images".to_string(),
                )
            })?;

        Ok(GeneratedImage {
            url,
            description: message.content.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

impl CompletionResponse {
    fn into_first_message(self) -> AppResult<CompletionMessage> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AppError::ExternalApiError("AI Gateway returned no choices".into()))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    images: Vec<CompletionImage>,
}

#[derive(Debug, Deserialize, Serialize)]
struct CompletionImage {
    image_url: ImageUrl,
}

#[derive(Debug, Deserialize, Serialize)]
struct ImageUrl {
    url: String,
}
