use crate::models::*;
use crate::services::PlaceService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/places",
    tag = "places",
    params(
        ("type" = Option<String>, Query, description = "restaurant, nightlife, hotel or event"),
        ("city" = Option<String>, Query, description = "Montreal, Quebec City or Other"),
        ("has_vip" = Option<bool>, Query, description = "Only places with VIP tables"),
        ("is_hot" = Option<bool>, Query, description = "Only trending places"),
        ("exclusive" = Option<bool>, Query, description = "Only exclusive places"),
        ("booking_type" = Option<String>, Query, description = "reservation, ticket, guestlist or none"),
        ("search" = Option<String>, Query, description = "Name or description contains")
    ),
    responses(
        (status = 200, description = "Matching places, hot first then by rating", body = [PlaceResponse])
    )
)]
pub async fn list_places(
    places: web::Data<PlaceService>,
    filters: web::Query<PlaceFilters>,
) -> Result<HttpResponse> {
    match places.list(&filters).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/places/featured",
    tag = "places",
    responses(
        (status = 200, description = "Hot or exclusive places, best rated first", body = [PlaceResponse])
    )
)]
pub async fn featured_places(places: web::Data<PlaceService>) -> Result<HttpResponse> {
    match places.featured().await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/places/{id}",
    tag = "places",
    params(("id" = Uuid, Path, description = "Place id")),
    responses(
        (status = 200, description = "Place", body = PlaceResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_place(
    places: web::Data<PlaceService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match places.get(path.into_inner()).await {
        Ok(place) => Ok(HttpResponse::Ok().json(ApiResponse::success(place))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn places_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/places")
            .route("", web::get().to(list_places))
            .route("/featured", web::get().to(featured_places))
            .route("/{id}", web::get().to(get_place)),
    );
}
