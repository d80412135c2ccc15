use crate::models::*;
use crate::services::NewsletterService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/newsletter",
    tag = "newsletter",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscribed, or already on the list", body = SubscribeResponse),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn subscribe(
    newsletter: web::Data<NewsletterService>,
    request: web::Json<SubscribeRequest>,
) -> Result<HttpResponse> {
    match newsletter.subscribe(request.into_inner()).await {
        Ok(outcome) => {
            let message = if outcome.already_subscribed {
                ALREADY_SUBSCRIBED_MESSAGE
            } else {
                SUBSCRIBED_MESSAGE
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
                outcome,
                message.to_string(),
            )))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/newsletter/preferences",
    tag = "newsletter",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences saved", body = NewsletterPreferences),
        (status = 404, description = "Not subscribed")
    )
)]
pub async fn update_preferences(
    newsletter: web::Data<NewsletterService>,
    request: web::Json<UpdatePreferencesRequest>,
) -> Result<HttpResponse> {
    match newsletter.update_preferences(request.into_inner()).await {
        Ok(preferences) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            preferences,
            PREFERENCES_UPDATED_MESSAGE.to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn newsletter_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/newsletter")
            .route("", web::post().to(subscribe))
            .route("/preferences", web::put().to(update_preferences)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{TestState, test_app};
    use actix_web::{http::StatusCode, test};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_repeat_signup_gets_already_subscribed_message() {
        let mut state = TestState::new();
        state.newsletter = NewsletterService::new(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        ));
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(json!({ "email": "marie@example.ca" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], ALREADY_SUBSCRIBED_MESSAGE);
        assert_eq!(body["data"]["already_subscribed"], true);
    }

    #[actix_web::test]
    async fn test_bad_email_is_400() {
        let state = TestState::new();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(json!({ "email": "pas-un-courriel" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_preferences_update() {
        let mut state = TestState::new();
        state.newsletter = NewsletterService::new(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        ));
        let app = test_app!(state);

        let req = test::TestRequest::put()
            .uri("/api/newsletter/preferences")
            .set_json(json!({ "email": "marie@example.ca", "preferences": { "deals": false } }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], PREFERENCES_UPDATED_MESSAGE);
        assert_eq!(body["data"], json!({ "events": true, "venues": true, "deals": false }));
    }
}
