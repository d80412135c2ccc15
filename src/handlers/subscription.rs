use crate::middlewares::get_identity_from_request;
use crate::models::*;
use crate::services::LedgerService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/subscription",
    tag = "subscription",
    params(
        ("x-user-email" = Option<String>, Header, description = "Client identity; guest quota when absent")
    ),
    responses(
        (status = 200, description = "Caller's subscription and remaining quota", body = UsageSummaryResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_subscription(
    ledger: web::Data<LedgerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let identity = get_identity_from_request(&req);

    match ledger.usage_summary(identity.as_str()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/subscription", web::get().to(get_subscription));
}
