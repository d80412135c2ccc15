use crate::config::BillingConfig;
use crate::error::AppError;
use crate::external::AiGateway;
use crate::handlers::usage_denied;
use crate::middlewares::get_identity_from_request;
use crate::models::*;
use crate::services::LedgerService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

pub const CONCIERGE_SYSTEM_PROMPT: &str = "You are 'Le Guide Vrai Québec', a passionate local expert for Montreal and Quebec City. Your primary language is French, but you can switch to English if the user prefers. You know every hidden gem, the best restaurants, the liveliest bars, and the most exclusive clubs. Your goal is to give authentic, high-quality recommendations that make the user feel like a local VIP. Be enthusiastic, use local Quebec expressions occasionally where appropriate, and focus on providing specific, actionable advice about dining, nightlife, and culture.";

fn validate_messages(messages: &[ChatMessage]) -> Result<(), AppError> {
    if messages.is_empty() {
        return Err(AppError::ValidationError(
            "At least one message is required".into(),
        ));
    }
    if messages.iter().any(|m| m.role == ChatRole::System) {
        return Err(AppError::ValidationError(
            "System messages are not accepted".into(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    params(
        ("x-user-email" = Option<String>, Header, description = "Client identity; guest quota when absent")
    ),
    responses(
        (status = 200, description = "Concierge reply", body = ChatReplyResponse),
        (status = 400, description = "Invalid conversation"),
        (status = 403, description = "Trial limit reached, trial expired or subscription inactive", body = UsageDeniedResponse),
        (status = 429, description = "Upstream rate limit"),
        (status = 503, description = "AI gateway unreachable")
    )
)]
/// Concierge chat. The message counter is bumped after the reply is
/// produced, in a detached task.
pub async fn chat(
    ledger: web::Data<LedgerService>,
    gateway: web::Data<dyn AiGateway>,
    billing: web::Data<BillingConfig>,
    req: HttpRequest,
    request: web::Json<ChatRequest>,
) -> Result<HttpResponse> {
    let identity = get_identity_from_request(&req);
    let request = request.into_inner();
    if let Err(e) = validate_messages(&request.messages) {
        return Ok(e.error_response());
    }

    let decision = ledger
        .check_limit(identity.as_str(), UsageKind::Message)
        .await;
    if !decision.allowed {
        return Ok(usage_denied(decision, &billing));
    }

    match gateway
        .chat(CONCIERGE_SYSTEM_PROMPT, &request.messages)
        .await
    {
        Ok(completion) => {
            ledger.spawn_increment(identity.0, UsageKind::Message);
            Ok(HttpResponse::Ok().json(ApiResponse::success(ChatReplyResponse {
                message: ChatMessage {
                    role: ChatRole::Assistant,
                    content: completion.content,
                },
                model: completion.model,
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn chat_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat", web::post().to(chat));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SubscriptionStatus;
    use crate::handlers::test_support::{TestState, eventually, test_app};
    use crate::middlewares::IDENTITY_HEADER;
    use crate::services::GUEST_IDENTITY;
    use actix_web::{http::StatusCode, test};
    use chrono::Utc;
    use serde_json::{Value, json};

    fn chat_request(identity: Option<&str>) -> test::TestRequest {
        let req = test::TestRequest::post().uri("/api/chat").set_json(json!({
            "messages": [{ "role": "user", "content": "Meilleure poutine à Québec?" }]
        }));
        match identity {
            Some(id) => req.insert_header((IDENTITY_HEADER, id)),
            None => req,
        }
    }

    #[actix_web::test]
    async fn test_chat_reply_then_usage_recorded() {
        let state = TestState::new();
        let app = test_app!(state);

        let resp = test::call_service(&app, chat_request(Some("u1")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["message"]["role"], "assistant");
        assert_eq!(state.gateway.call_count(), 1);

        let store = state.store.clone();
        assert!(eventually(|| store.get("u1").is_some_and(|s| s.messages_used == 1)).await);
    }

    #[actix_web::test]
    async fn test_chat_denied_at_limit() {
        let state = TestState::new();
        let mut record = state.ledger.new_trial_record("u1", Utc::now());
        record.messages_used = 100;
        state.store.seed(record);
        let app = test_app!(state);

        let resp = test::call_service(&app, chat_request(Some("u1")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "Trial limit reached (100 messages). Subscribe for unlimited access."
        );
        assert_eq!(body["upgradeUrl"], state.billing.upgrade_url.as_str());
        assert_eq!(body["subscription"]["messages_used"], 100);
        assert_eq!(state.gateway.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_chat_denied_when_inactive() {
        let state = TestState::new();
        let mut record = state.ledger.new_trial_record("u1", Utc::now());
        record.subscription_status = SubscriptionStatus::Inactive;
        state.store.seed(record);
        let app = test_app!(state);

        let resp = test::call_service(&app, chat_request(Some("u1")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Subscription inactive"));
    }

    #[actix_web::test]
    async fn test_chat_fails_open_on_storage_outage() {
        let state = TestState::new();
        state.store.set_unavailable(true);
        let app = test_app!(state);

        let resp = test::call_service(&app, chat_request(Some("u1")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.gateway.call_count(), 1);
    }

    #[actix_web::test]
    async fn test_response_does_not_wait_for_increment() {
        let state = TestState::new();
        let gate = state.store.hold_increments();
        let app = test_app!(state);

        let resp = test::call_service(&app, chat_request(Some("u1")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.store.get("u1").unwrap().messages_used, 0);

        gate.notify_one();
        let store = state.store.clone();
        assert!(eventually(|| store.get("u1").is_some_and(|s| s.messages_used == 1)).await);
    }

    #[actix_web::test]
    async fn test_gateway_failure_is_not_metered() {
        let state = TestState::new();
        state
            .gateway
            .fail_next(AppError::RateLimited("Too many requests".into()));
        let app = test_app!(state);

        let resp = test::call_service(&app, chat_request(Some("u1")).to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(state.store.get("u1").unwrap().messages_used, 0);
    }

    #[actix_web::test]
    async fn test_missing_identity_uses_guest_quota() {
        let state = TestState::new();
        let app = test_app!(state);

        let resp = test::call_service(&app, chat_request(None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.store.get(GUEST_IDENTITY).is_some());
    }

    #[actix_web::test]
    async fn test_empty_conversation_rejected() {
        let state = TestState::new();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({ "messages": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.store.len(), 0);
    }
}
