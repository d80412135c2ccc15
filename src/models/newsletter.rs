use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_EMAIL_LENGTH: usize = 320;

pub const SUBSCRIBED_MESSAGE: &str = "Bienvenue! Tu vas recevoir les meilleurs deals en premier.";
pub const ALREADY_SUBSCRIBED_MESSAGE: &str = "Déjà inscrit! Tu reçois déjà nos updates.";
pub const PREFERENCES_UPDATED_MESSAGE: &str = "Préférences mises à jour!";

fn opted_in() -> bool {
    true
}

/// Which mailings a subscriber wants. Everything is on unless switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewsletterPreferences {
    #[serde(default = "opted_in")]
    pub events: bool,
    #[serde(default = "opted_in")]
    pub venues: bool,
    #[serde(default = "opted_in")]
    pub deals: bool,
}

impl Default for NewsletterPreferences {
    fn default() -> Self {
        Self {
            events: true,
            venues: true,
            deals: true,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub preferences: Option<NewsletterPreferences>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    pub email: String,
    pub preferences: NewsletterPreferences,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscribeResponse {
    pub email: String,
    pub already_subscribed: bool,
}

/// Trimmed, lowercased address with a plausible `local@domain.tld` shape.
pub fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    let invalid = || AppError::ValidationError("Invalid email address".into());

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.chars().any(|c| c.is_whitespace()) {
        return Err(invalid());
    }
    Ok(email)
}
