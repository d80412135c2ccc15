use crate::middlewares::get_identity_from_request;
use crate::models::*;
use crate::services::BookingService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

/// The caller's identity when it is a real address rather than a guest or
/// anonymous id.
fn caller_email(req: &HttpRequest) -> Option<String> {
    let identity = get_identity_from_request(req);
    if identity.is_guest() {
        return None;
    }
    normalize_email(identity.as_str()).ok()
}

#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = CreateBookingRequest,
    params(
        ("x-user-email" = Option<String>, Header, description = "Used as the contact address when the form has none")
    ),
    responses(
        (status = 201, description = "Booking created as pending", body = BookingResponse),
        (status = 400, description = "Invalid booking"),
        (status = 404, description = "Place not found")
    )
)]
pub async fn create_booking(
    bookings: web::Data<BookingService>,
    req: HttpRequest,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse> {
    let caller = caller_email(&req);

    match bookings
        .create(request.into_inner(), caller.as_deref())
        .await
    {
        Ok(booking) => Ok(HttpResponse::Created().json(ApiResponse::success(booking))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    params(
        ("x-user-email" = Option<String>, Header, description = "Client identity")
    ),
    responses(
        (status = 200, description = "Caller's bookings, latest date first", body = [BookingResponse])
    )
)]
pub async fn my_bookings(
    bookings: web::Data<BookingService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let Some(email) = caller_email(&req) else {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(Vec::<BookingResponse>::new())));
    };

    match bookings.list_for_email(&email).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/bookings/{code}",
    tag = "bookings",
    params(("code" = String, Path, description = "Confirmation code")),
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_booking(
    bookings: web::Data<BookingService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match bookings.get_by_code(&path).await {
        Ok(booking) => Ok(HttpResponse::Ok().json(ApiResponse::success(booking))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/bookings/{code}/cancel",
    tag = "bookings",
    params(("code" = String, Path, description = "Confirmation code")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 400, description = "Booking already completed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn cancel_booking(
    bookings: web::Data<BookingService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match bookings.cancel(&path).await {
        Ok(booking) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            booking,
            "Booking cancelled".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn booking_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking))
            .route("", web::get().to(my_bookings))
            .route("/{code}", web::get().to(get_booking))
            .route("/{code}/cancel", web::post().to(cancel_booking)),
    );
}
