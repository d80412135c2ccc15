use crate::entities::{BookingStatus, VipBookingType, vip_booking_entity as booking};
use crate::error::{AppError, AppResult};
use crate::models::normalize_email;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_PARTY_SIZE: i32 = 20;
pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_SPECIAL_REQUEST_LENGTH: usize = 1000;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub place_id: Uuid,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    pub user_name: String,
    pub booking_type: VipBookingType,
    /// `YYYY-MM-DD`
    pub booking_date: NaiveDate,
    /// `HH:MM`
    #[serde(default)]
    pub booking_time: Option<String>,
    pub party_size: i32,
    #[serde(default)]
    pub special_request: Option<String>,
    #[serde(default)]
    pub sponsor_name: Option<String>,
}

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub place_id: Uuid,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_name: String,
    pub booking_type: VipBookingType,
    pub booking_date: NaiveDate,
    pub booking_time: Option<String>,
    pub party_size: i32,
    pub special_request: Option<String>,
    pub sponsor_name: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewBooking {
    /// `today` is the earliest bookable date.
    pub fn from_request(req: CreateBookingRequest, today: NaiveDate) -> AppResult<Self> {
        let user_name = req.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(AppError::ValidationError("Name is required".into()));
        }
        if user_name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::ValidationError("Name is too long".into()));
        }
        if !(1..=MAX_PARTY_SIZE).contains(&req.party_size) {
            return Err(AppError::ValidationError(format!(
                "Party size must be between 1 and {MAX_PARTY_SIZE}"
            )));
        }
        if req.booking_date < today {
            return Err(AppError::ValidationError(
                "Booking date cannot be in the past".into(),
            ));
        }

        let booking_time = non_blank(req.booking_time);
        if let Some(time) = &booking_time {
            NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| {
                AppError::ValidationError("Booking time must be HH:MM".into())
            })?;
        }

        let special_request = non_blank(req.special_request);
        if special_request
            .as_ref()
            .is_some_and(|r| r.chars().count() > MAX_SPECIAL_REQUEST_LENGTH)
        {
            return Err(AppError::ValidationError(
                "Special request is too long".into(),
            ));
        }

        let user_email = non_blank(req.user_email)
            .map(|e| normalize_email(&e))
            .transpose()?;

        Ok(Self {
            place_id: req.place_id,
            user_id: non_blank(req.user_id),
            user_email,
            user_name,
            booking_type: req.booking_type,
            booking_date: req.booking_date,
            booking_time,
            party_size: req.party_size,
            special_request,
            sponsor_name: non_blank(req.sponsor_name),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub place_id: Uuid,
    pub user_email: Option<String>,
    pub user_name: String,
    pub booking_type: VipBookingType,
    pub booking_date: NaiveDate,
    pub booking_time: Option<String>,
    pub party_size: i32,
    pub status: BookingStatus,
    pub special_request: Option<String>,
    pub confirmation_code: String,
    pub table_number: Option<String>,
    pub minimum_spend: Option<f64>,
    pub sponsor_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<booking::Model> for BookingResponse {
    fn from(m: booking::Model) -> Self {
        Self {
            id: m.id,
            place_id: m.place_id,
            user_email: m.user_email,
            user_name: m.user_name,
            booking_type: m.booking_type,
            booking_date: m.booking_date,
            booking_time: m.booking_time,
            party_size: m.party_size,
            status: m.status,
            special_request: m.special_request,
            confirmation_code: m.confirmation_code,
            table_number: m.table_number,
            minimum_spend: m.minimum_spend,
            sponsor_name: m.sponsor_name,
            created_at: m.created_at,
            confirmed_at: m.confirmed_at,
            cancelled_at: m.cancelled_at,
        }
    }
}
