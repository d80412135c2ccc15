use crate::middlewares::get_identity_from_request;
use crate::models::*;
use crate::services::GenerationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/generations",
    tag = "image",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
        ("x-user-email" = Option<String>, Header, description = "Client identity")
    ),
    responses(
        (status = 200, description = "Caller's generated images, newest first")
    )
)]
pub async fn list_generations(
    generations: web::Data<GenerationService>,
    req: HttpRequest,
    query: web::Query<GenerationQuery>,
) -> Result<HttpResponse> {
    let identity = get_identity_from_request(&req);

    match generations.list_for_user(identity.as_str(), &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/generations/{id}",
    tag = "image",
    params(
        ("id" = Uuid, Path, description = "Generation id"),
        ("x-user-email" = Option<String>, Header, description = "Client identity")
    ),
    responses(
        (status = 200, description = "Generation", body = AiGenerationResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_generation(
    generations: web::Data<GenerationService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let identity = get_identity_from_request(&req);

    match generations
        .get_for_user(identity.as_str(), path.into_inner())
        .await
    {
        Ok(item) => Ok(HttpResponse::Ok().json(ApiResponse::success(item))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/generations/{id}",
    tag = "image",
    params(
        ("id" = Uuid, Path, description = "Generation id"),
        ("x-user-email" = Option<String>, Header, description = "Client identity")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_generation(
    generations: web::Data<GenerationService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let identity = get_identity_from_request(&req);

    match generations
        .delete_for_user(identity.as_str(), path.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            (),
            "Generation deleted".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn generation_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/generations")
            .route("", web::get().to(list_generations))
            .route("/{id}", web::get().to(get_generation))
            .route("/{id}", web::delete().to(delete_generation)),
    );
}
