use crate::config::BillingConfig;
use crate::entities::GenerationMode;
use crate::error::{AppError, AppResult};
use crate::external::{AiGateway, ApiKeyState, GATEWAY_HELP_URL};
use crate::handlers::usage_denied;
use crate::middlewares::get_identity_from_request;
use crate::models::*;
use crate::services::{GenerationService, LedgerService};
use actix_multipart::Multipart;
use actix_web::guard::{self, GuardContext};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use base64::Engine;
use futures_util::StreamExt;
use std::future::Future;

/// Per uploaded source image.
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Generate or edit an image.
///
/// Accepts JSON, or `multipart/form-data` with the same field names plus
/// `image1`/`image2` file parts.
#[utoipa::path(
    post,
    path = "/generate-image",
    tag = "image",
    request_body = GenerateImageRequest,
    params(
        ("x-user-email" = Option<String>, Header, description = "Client identity; guest quota when absent")
    ),
    responses(
        (status = 200, description = "Generated image", body = GenerateImageResponse),
        (status = 400, description = "Invalid mode, prompt or source image"),
        (status = 403, description = "Trial limit reached, trial expired or subscription inactive", body = UsageDeniedResponse),
        (status = 429, description = "Upstream rate limit"),
        (status = 500, description = "AI gateway not configured"),
        (status = 503, description = "AI gateway unreachable")
    )
)]
pub async fn generate_image(
    ledger: web::Data<LedgerService>,
    gateway: web::Data<dyn AiGateway>,
    generations: web::Data<GenerationService>,
    billing: web::Data<BillingConfig>,
    req: HttpRequest,
    request: web::Json<GenerateImageRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    generate(&ledger, &gateway, &generations, &billing, &req, std::future::ready(Ok(request))).await
}

/// Form variant of [`generate_image`] used by the web client's file upload.
pub async fn generate_image_form(
    ledger: web::Data<LedgerService>,
    gateway: web::Data<dyn AiGateway>,
    generations: web::Data<GenerationService>,
    billing: web::Data<BillingConfig>,
    req: HttpRequest,
    form: Multipart,
) -> Result<HttpResponse> {
    generate(&ledger, &gateway, &generations, &billing, &req, read_image_form(form)).await
}

/// The body is only read once the key and quota checks have passed.
async fn generate(
    ledger: &LedgerService,
    gateway: &web::Data<dyn AiGateway>,
    generations: &GenerationService,
    billing: &BillingConfig,
    req: &HttpRequest,
    body: impl Future<Output = AppResult<GenerateImageRequest>>,
) -> Result<HttpResponse> {
    if !gateway.is_configured() {
        return Ok(AppError::ConfigError(
            "AI Gateway API key is not configured. Set AI_GATEWAY_API_KEY.".into(),
        )
        .error_response());
    }

    let identity = get_identity_from_request(req);
    let decision = ledger.check_limit(identity.as_str(), UsageKind::Image).await;
    if !decision.allowed {
        return Ok(usage_denied(decision, billing));
    }

    let prompt = match body.await.and_then(ImagePrompt::from_request) {
        Ok(p) => p,
        Err(e) => return Ok(e.error_response()),
    };

    match gateway.generate_image(&prompt).await {
        Ok(image) => {
            ledger.spawn_increment(identity.0.clone(), UsageKind::Image);
            generations.spawn_save(NewGeneration {
                user_email: Some(identity.0),
                prompt: prompt.prompt.clone(),
                image_url: image.url.clone(),
                mode: prompt.mode,
                aspect_ratio: prompt.aspect_ratio.clone(),
                description: Some(image.description.clone()),
                strength: (prompt.mode == GenerationMode::ImageEditing).then_some(prompt.strength),
            });

            Ok(HttpResponse::Ok().json(GenerateImageResponse {
                url: image.url,
                prompt: prompt.prompt,
                description: image.description,
            }))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/check-api-key",
    tag = "image",
    responses(
        (status = 200, description = "Gateway key status", body = ApiKeyStatusResponse)
    )
)]
pub async fn check_api_key(gateway: web::Data<dyn AiGateway>) -> Result<HttpResponse> {
    let state = gateway.api_key_state();
    let message = match state {
        ApiKeyState::Missing => "AI_GATEWAY_API_KEY is not set",
        ApiKeyState::Empty => "AI_GATEWAY_API_KEY is set but empty",
        ApiKeyState::Configured => "AI Gateway API key is configured",
    };

    Ok(HttpResponse::Ok().json(ApiKeyStatusResponse {
        configured: state == ApiKeyState::Configured,
        has_value: state != ApiKeyState::Missing,
        is_empty: state == ApiKeyState::Empty,
        message: message.to_string(),
        help_url: GATEWAY_HELP_URL.to_string(),
    }))
}

fn invalid_form(err: impl std::fmt::Display) -> AppError {
    AppError::ValidationError(format!("Invalid form data: {err}"))
}

fn image_data_url(media_type: Option<&str>, bytes: &[u8]) -> AppResult<String> {
    let media_type = media_type.unwrap_or("image/jpeg");
    if !media_type.starts_with("image/") {
        return Err(AppError::ValidationError(
            "Uploaded files must be images".into(),
        ));
    }
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{media_type};base64,{encoded}"))
}

/// Collects the generator fields from a multipart body. Uploaded `image1` /
/// `image2` parts become `data:` URLs and win over `image1Url` / `image2Url`.
async fn read_image_form(mut form: Multipart) -> AppResult<GenerateImageRequest> {
    let mut request = GenerateImageRequest::default();
    let mut uploads: [Option<String>; 2] = [None, None];

    while let Some(field) = form.next().await {
        let mut field = field.map_err(invalid_form)?;
        let name = field.name().unwrap_or_default().to_string();
        let media_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(invalid_form)?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::ValidationError(format!(
                    "{name} exceeds {} MB",
                    MAX_UPLOAD_BYTES / (1024 * 1024)
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let slot = match name.as_str() {
            "image1" => Some(0),
            "image2" => Some(1),
            _ => None,
        };
        if let Some(slot) = slot {
            if !bytes.is_empty() {
                uploads[slot] = Some(image_data_url(media_type.as_deref(), &bytes)?);
            }
            continue;
        }

        let value = String::from_utf8(bytes).map_err(invalid_form)?;
        match name.as_str() {
            "mode" => request.mode = Some(value),
            "prompt" => request.prompt = Some(value),
            "aspectRatio" => request.aspect_ratio = Some(value),
            "strength" if !value.trim().is_empty() => {
                let strength = value.trim().parse().map_err(|_| {
                    AppError::ValidationError("Strength must be a number".into())
                })?;
                request.strength = Some(strength);
            }
            "image1Url" => request.image1_url = Some(value),
            "image2Url" => request.image2_url = Some(value),
            _ => {}
        }
    }

    let [image1, image2] = uploads;
    request.image1_url = image1.or(request.image1_url);
    request.image2_url = image2.or(request.image2_url);
    Ok(request)
}

fn is_multipart(ctx: &GuardContext) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

pub fn image_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/generate-image")
            .route(
                web::post()
                    .guard(guard::fn_guard(is_multipart))
                    .to(generate_image_form),
            )
            .route(web::post().to(generate_image)),
    )
    .route("/check-api-key", web::get().to(check_api_key));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::fake::FakeAiGateway;
    use crate::handlers::test_support::{TestState, eventually, test_app};
    use crate::middlewares::IDENTITY_HEADER;
    use actix_web::{http::StatusCode, test};
    use chrono::Utc;
    use serde_json::{Value, json};

    fn image_request(identity: &str, body: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/generate-image")
            .insert_header((IDENTITY_HEADER, identity))
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_generate_image_meters_after_success() {
        let state = TestState::new();
        let app = test_app!(state);

        let req = image_request(
            "u1",
            json!({ "mode": "text-to-image", "prompt": "Rue du Petit-Champlain", "aspectRatio": "16:9" }),
        );
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["url"].as_str().unwrap().starts_with("data:image/"));
        assert_eq!(body["prompt"], "Rue du Petit-Champlain");

        let sent = state.gateway.last_image_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(sent.aspect_ratio.as_deref(), Some("16:9"));

        let store = state.store.clone();
        assert!(eventually(|| store.get("u1").is_some_and(|s| s.images_used == 1)).await);
    }

    #[actix_web::test]
    async fn test_unconfigured_gateway_checked_first() {
        let state = TestState::with_gateway(FakeAiGateway::with_key(ApiKeyState::Missing));
        let app = test_app!(state);

        let req = image_request("u1", json!({ "mode": "text-to-image", "prompt": "x" }));
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
        assert_eq!(state.store.len(), 0);
    }

    #[actix_web::test]
    async fn test_image_denied_at_limit() {
        let state = TestState::new();
        let mut record = state.ledger.new_trial_record("u1", Utc::now());
        record.images_used = 10;
        state.store.seed(record);
        let app = test_app!(state);

        let req = image_request("u1", json!({ "mode": "text-to-image", "prompt": "x" }));
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "Trial limit reached (10 images). Subscribe for unlimited access."
        );
        assert_eq!(body["subscription"]["images_used"], 10);
        assert_eq!(state.gateway.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_expired_trial_denied() {
        let state = TestState::new();
        let record = state
            .ledger
            .new_trial_record("u1", Utc::now() - chrono::Duration::days(8));
        state.store.seed(record);
        let app = test_app!(state);

        let req = image_request("u1", json!({ "mode": "text-to-image", "prompt": "x" }));
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "Free trial expired. Subscribe for $6/month to continue."
        );
    }

    #[actix_web::test]
    async fn test_invalid_requests_are_400() {
        let state = TestState::new();
        let app = test_app!(state);

        for body in [
            json!({ "prompt": "x" }),
            json!({ "mode": "text-to-image", "prompt": "  " }),
            json!({ "mode": "text-to-image", "prompt": "a".repeat(5001) }),
            json!({ "mode": "image-editing", "prompt": "Add snow" }),
        ] {
            let resp = test::call_service(&app, image_request("u1", body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(state.gateway.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_rate_limited_gateway_is_429_and_unmetered() {
        let state = TestState::new();
        state
            .gateway
            .fail_next(AppError::RateLimited("Too many requests".into()));
        let app = test_app!(state);

        let req = image_request("u1", json!({ "mode": "text-to-image", "prompt": "x" }));
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(state.store.get("u1").unwrap().images_used, 0);
    }

    #[actix_web::test]
    async fn test_check_api_key_reports_empty_key() {
        let state = TestState::with_gateway(FakeAiGateway::with_key(ApiKeyState::Empty));
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/check-api-key").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["configured"], false);
        assert_eq!(body["hasValue"], true);
        assert_eq!(body["isEmpty"], true);
        assert_eq!(body["helpUrl"], GATEWAY_HELP_URL);
    }

    const BOUNDARY: &str = "guide-vrai-form";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn form_request(identity: &str, parts: &[Part]) -> test::TestRequest {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, mime, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\nContent-Type: {mime}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        test::TestRequest::post()
            .uri("/api/generate-image")
            .insert_header((IDENTITY_HEADER, identity))
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_form_text_to_image() {
        let state = TestState::new();
        let app = test_app!(state);

        let req = form_request(
            "u1",
            &[
                Part::Text("mode", "text-to-image"),
                Part::Text("prompt", "Carnaval de Québec"),
                Part::Text("aspectRatio", "1:1"),
                Part::Text("strength", ""),
            ],
        );
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let sent = state.gateway.last_image_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(sent.prompt, "Carnaval de Québec");
        assert_eq!(sent.aspect_ratio.as_deref(), Some("1:1"));
        assert!(sent.image_urls.is_empty());

        let store = state.store.clone();
        assert!(eventually(|| store.get("u1").is_some_and(|s| s.images_used == 1)).await);
    }

    #[actix_web::test]
    async fn test_form_upload_becomes_data_url() {
        let state = TestState::new();
        let app = test_app!(state);

        let req = form_request(
            "u1",
            &[
                Part::Text("mode", "image-editing"),
                Part::Text("prompt", "add snow"),
                Part::Text("strength", "0.5"),
                Part::Text("image1Url", "https://cdn.example.com/ignored.png"),
                Part::File("image1", "image/png", b"\x89PNG"),
                Part::Text("image2Url", "https://cdn.example.com/second.jpg"),
            ],
        );
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let sent = state.gateway.last_image_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(sent.mode, GenerationMode::ImageEditing);
        assert_eq!(sent.strength, 0.5);
        assert_eq!(
            sent.image_urls,
            vec![
                "data:image/png;base64,iVBORw==".to_string(),
                "https://cdn.example.com/second.jpg".to_string(),
            ]
        );
    }

    #[actix_web::test]
    async fn test_form_rejects_non_image_upload() {
        let state = TestState::new();
        let app = test_app!(state);

        let req = form_request(
            "u1",
            &[
                Part::Text("mode", "image-editing"),
                Part::Text("prompt", "add snow"),
                Part::File("image1", "application/pdf", b"%PDF-1.4"),
            ],
        );
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.gateway.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_form_is_not_read_when_denied() {
        let state = TestState::new();
        let mut record = state.ledger.new_trial_record("u1", Utc::now());
        record.images_used = 10;
        state.store.seed(record);
        let app = test_app!(state);

        let req = form_request("u1", &[Part::File("image1", "application/pdf", b"x")]);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_unclassified_gateway_failure_is_500() {
        let state = TestState::new();
        state
            .gateway
            .fail_next(AppError::ExternalApiError("upstream said 418".into()));
        let app = test_app!(state);

        let req = image_request("u1", json!({ "mode": "text-to-image", "prompt": "x" }));
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "EXTERNAL_API_ERROR");
    }
}
