pub mod booking;
pub mod chat;
pub mod generation;
pub mod image;
pub mod newsletter;
pub mod places;
pub mod subscription;

pub use booking::booking_config;
pub use chat::chat_config;
pub use generation::generation_config;
pub use image::image_config;
pub use newsletter::newsletter_config;
pub use places::places_config;
pub use subscription::subscription_config;

use crate::config::BillingConfig;
use crate::models::{UsageDecision, UsageDeniedResponse};
use actix_web::{HttpResponse, web};

/// Every route served under `/api`.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(chat_config)
        .configure(image_config)
        .configure(subscription_config)
        .configure(generation_config)
        .configure(places_config)
        .configure(booking_config)
        .configure(newsletter_config);
}

/// 403 body for a refused metered action.
pub(crate) fn usage_denied(decision: UsageDecision, billing: &BillingConfig) -> HttpResponse {
    HttpResponse::Forbidden().json(UsageDeniedResponse {
        error: decision
            .reason_message()
            .unwrap_or_else(|| "Usage not allowed".to_string()),
        upgrade_url: billing.upgrade_url.clone(),
        subscription: decision.subscription.map(Into::into),
    })
}
