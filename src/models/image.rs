use crate::entities::{GenerationMode, ai_generation_entity as gen_entity};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_PROMPT_LENGTH: usize = 5000;
pub const DEFAULT_EDIT_STRENGTH: f32 = 0.8;

/// Raw generator request. `mode` stays a string so a missing or unknown
/// mode is reported as a 400 rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub strength: Option<f32>,
    #[serde(default)]
    pub image1_url: Option<String>,
    #[serde(default)]
    pub image2_url: Option<String>,
}

/// A generator request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePrompt {
    pub mode: GenerationMode,
    pub prompt: String,
    pub aspect_ratio: Option<String>,
    pub strength: f32,
    /// Source images for editing; empty for text-to-image.
    pub image_urls: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_acceptable_image_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://") || url.starts_with("data:image/")
}

impl ImagePrompt {
    pub fn from_request(req: GenerateImageRequest) -> AppResult<Self> {
        let mode = non_blank(req.mode)
            .ok_or_else(|| AppError::ValidationError("Mode is required".into()))?;
        let prompt = non_blank(req.prompt)
            .ok_or_else(|| AppError::ValidationError("Prompt is required".into()))?;
        if prompt.chars().count() > MAX_PROMPT_LENGTH {
            return Err(AppError::ValidationError(format!(
                "Prompt too long. Maximum {MAX_PROMPT_LENGTH} characters."
            )));
        }

        let mode = match mode.as_str() {
            "text-to-image" => GenerationMode::TextToImage,
            "image-editing" => GenerationMode::ImageEditing,
            _ => return Err(AppError::ValidationError("Invalid mode".into())),
        };

        let strength = req.strength.unwrap_or(DEFAULT_EDIT_STRENGTH);
        if !(0.0..=1.0).contains(&strength) {
            return Err(AppError::ValidationError(
                "Strength must be between 0 and 1".into(),
            ));
        }

        let image_urls = match mode {
            GenerationMode::TextToImage => Vec::new(),
            GenerationMode::ImageEditing => {
                let first = non_blank(req.image1_url).ok_or_else(|| {
                    AppError::ValidationError("An image is required for image editing".into())
                })?;
                let urls: Vec<String> = std::iter::once(first)
                    .chain(non_blank(req.image2_url))
                    .collect();
                if !urls.iter().all(|u| is_acceptable_image_url(u)) {
                    return Err(AppError::ValidationError(
                        "Images must be http(s) or data:image URLs".into(),
                    ));
                }
                urls
            }
        };

        Ok(Self {
            mode,
            prompt,
            aspect_ratio: non_blank(req.aspect_ratio),
            strength,
            image_urls,
        })
    }

    /// Instruction text sent to the image model.
    pub fn gateway_text(&self) -> String {
        match self.mode {
            GenerationMode::TextToImage => match &self.aspect_ratio {
                Some(ratio) => format!(
                    "Generate a high-quality image with a {ratio} aspect ratio: {}",
                    self.prompt
                ),
                None => format!("Generate a high-quality image: {}", self.prompt),
            },
            GenerationMode::ImageEditing
                if (self.strength - DEFAULT_EDIT_STRENGTH).abs() > f32::EPSILON =>
            {
                format!(
                    "{} (editing strength: {}%)",
                    self.prompt,
                    (self.strength * 100.0).round() as i32
                )
            }
            GenerationMode::ImageEditing => self.prompt.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateImageResponse {
    pub url: String,
    pub prompt: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStatusResponse {
    pub configured: bool,
    pub has_value: bool,
    pub is_empty: bool,
    pub message: String,
    pub help_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AiGenerationResponse {
    pub id: Uuid,
    pub user_email: Option<String>,
    pub prompt: String,
    pub image_url: String,
    pub mode: GenerationMode,
    pub aspect_ratio: Option<String>,
    pub description: Option<String>,
    pub strength: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl From<gen_entity::Model> for AiGenerationResponse {
    fn from(m: gen_entity::Model) -> Self {
        Self {
            id: m.id,
            user_email: m.user_email,
            prompt: m.prompt,
            image_url: m.image_url,
            mode: m.mode,
            aspect_ratio: m.aspect_ratio,
            description: m.description,
            strength: m.strength,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub user_email: Option<String>,
    pub prompt: String,
    pub image_url: String,
    pub mode: GenerationMode,
    pub aspect_ratio: Option<String>,
    pub description: Option<String>,
    pub strength: Option<f32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: &str, prompt: &str) -> GenerateImageRequest {
        GenerateImageRequest {
            mode: Some(mode.to_string()),
            prompt: Some(prompt.to_string()),
            ..Default::default()
        }
    }

    fn validation_message(req: GenerateImageRequest) -> String {
        match ImagePrompt::from_request(req) {
            Err(AppError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_text_to_image_prompt() {
        let prompt = ImagePrompt::from_request(request("text-to-image", "Poutine at 3am")).unwrap();
        assert_eq!(prompt.mode, GenerationMode::TextToImage);
        assert!(prompt.image_urls.is_empty());
        assert_eq!(
            prompt.gateway_text(),
            "Generate a high-quality image: Poutine at 3am"
        );
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(
            validation_message(GenerateImageRequest {
                prompt: Some("x".into()),
                ..Default::default()
            }),
            "Mode is required"
        );
        assert_eq!(
            validation_message(request("text-to-image", "   ")),
            "Prompt is required"
        );
        assert_eq!(validation_message(request("sketch", "x")), "Invalid mode");
    }

    #[test]
    fn test_prompt_length_bound() {
        let at_limit = "é".repeat(MAX_PROMPT_LENGTH);
        assert!(ImagePrompt::from_request(request("text-to-image", &at_limit)).is_ok());

        let too_long = "a".repeat(MAX_PROMPT_LENGTH + 1);
        assert_eq!(
            validation_message(request("text-to-image", &too_long)),
            "Prompt too long. Maximum 5000 characters."
        );
    }

    #[test]
    fn test_image_editing_needs_source() {
        let msg = validation_message(request("image-editing", "Add snow"));
        assert!(msg.contains("image is required"));

        let mut req = request("image-editing", "Add snow");
        req.image1_url = Some("file:///etc/passwd".into());
        assert!(ImagePrompt::from_request(req).is_err());
    }

    #[test]
    fn test_image_editing_strength_in_text() {
        let mut req = request("image-editing", "Add snow");
        req.image1_url = Some("https://example.com/a.jpg".into());
        req.image2_url = Some("data:image/png;base64,AAAA".into());
        req.strength = Some(0.5);

        let prompt = ImagePrompt::from_request(req).unwrap();
        assert_eq!(prompt.image_urls.len(), 2);
        assert_eq!(prompt.gateway_text(), "Add snow (editing strength: 50%)");
    }

    #[test]
    fn test_default_strength_keeps_prompt() {
        let mut req = request("image-editing", "Add snow");
        req.image1_url = Some("https://example.com/a.jpg".into());

        let prompt = ImagePrompt::from_request(req).unwrap();
        assert_eq!(prompt.gateway_text(), "Add snow");
    }

    #[test]
    fn test_strength_out_of_range() {
        let mut req = request("image-editing", "Add snow");
        req.image1_url = Some("https://example.com/a.jpg".into());
        req.strength = Some(1.5);
        assert!(ImagePrompt::from_request(req).is_err());
    }
}
