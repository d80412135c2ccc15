use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    BookingStatus, BookingType, City, GenerationMode, PlaceType, SubscriptionStatus,
    VipBookingType,
};
use crate::handlers;
use crate::middlewares::IDENTITY_HEADER;
use crate::models::*;

struct IdentityAddon;

impl Modify for IdentityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "client_identity",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(IDENTITY_HEADER))),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::chat::chat,
        handlers::image::generate_image,
        handlers::image::check_api_key,
        handlers::subscription::get_subscription,
        handlers::generation::list_generations,
        handlers::generation::get_generation,
        handlers::generation::delete_generation,
        handlers::places::list_places,
        handlers::places::featured_places,
        handlers::places::get_place,
        handlers::booking::create_booking,
        handlers::booking::my_bookings,
        handlers::booking::get_booking,
        handlers::booking::cancel_booking,
        handlers::newsletter::subscribe,
        handlers::newsletter::update_preferences,
    ),
    components(
        schemas(
            ChatRole,
            ChatMessage,
            ChatRequest,
            ChatReplyResponse,
            GenerateImageRequest,
            GenerateImageResponse,
            ApiKeyStatusResponse,
            AiGenerationResponse,
            GenerationQuery,
            GenerationMode,
            SubscriptionStatus,
            SubscriptionResponse,
            UsageDeniedResponse,
            UsageSummaryResponse,
            PlaceType,
            City,
            BookingType,
            PlaceResponse,
            VipBookingType,
            BookingStatus,
            CreateBookingRequest,
            BookingResponse,
            NewsletterPreferences,
            SubscribeRequest,
            UpdatePreferencesRequest,
            SubscribeResponse,
        )
    ),
    modifiers(&IdentityAddon),
    tags(
        (name = "chat", description = "Concierge chat"),
        (name = "image", description = "Image generation and history"),
        (name = "subscription", description = "Trial and usage ledger"),
        (name = "places", description = "Venue guide"),
        (name = "bookings", description = "Guest list, VIP table and event bookings"),
        (name = "newsletter", description = "Deals newsletter"),
    ),
    info(
        title = "Le Guide Vrai Québec API",
        version = "1.0.0",
        description = "Nightlife guide backend: concierge chat, image generation and trial usage"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_metered_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/chat"));
        assert!(doc.paths.paths.contains_key("/generate-image"));
        assert!(doc.paths.paths.contains_key("/generations/{id}"));
        assert!(doc.paths.paths.contains_key("/places/featured"));
        assert!(doc.paths.paths.contains_key("/bookings/{code}/cancel"));
        assert!(doc.paths.paths.contains_key("/newsletter/preferences"));
    }
}
