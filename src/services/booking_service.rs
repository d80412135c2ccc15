use crate::entities::{
    BookingStatus, VipBookingType, place_entity as place, vip_booking_entity as booking,
};
use crate::error::{AppError, AppResult};
use crate::models::{BookingResponse, CreateBookingRequest, NewBooking};
use crate::utils::{generate_confirmation_code, normalize_confirmation_code};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

/// Retries when a freshly generated confirmation code is already taken.
const CODE_ATTEMPTS: usize = 3;

/// Guest-list, VIP table and event bookings.
#[derive(Clone)]
pub struct BookingService {
    pool: Arc<DatabaseConnection>,
}

impl BookingService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// `caller` fills in `user_email` when the form left it blank.
    pub async fn create(
        &self,
        request: CreateBookingRequest,
        caller: Option<&str>,
    ) -> AppResult<BookingResponse> {
        self.create_on(request, caller, Utc::now().date_naive())
            .await
    }

    pub(crate) async fn create_on(
        &self,
        request: CreateBookingRequest,
        caller: Option<&str>,
        today: NaiveDate,
    ) -> AppResult<BookingResponse> {
        let new = NewBooking::from_request(request, today)?;

        let venue = place::Entity::find_by_id(new.place_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Place not found".into()))?;
        if new.booking_type == VipBookingType::Vip && !venue.has_vip {
            return Err(AppError::ValidationError(
                "This place does not offer VIP tables".into(),
            ));
        }

        let minimum_spend = match new.booking_type {
            VipBookingType::Vip => venue.vip_min_spend,
            _ => None,
        };
        let sponsor_name = new
            .sponsor_name
            .clone()
            .or_else(|| venue.sponsor_name.clone().filter(|_| venue.is_sponsored));
        let user_email = new
            .user_email
            .clone()
            .or_else(|| caller.map(str::to_string));

        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = Utc::now();
            let row = booking::ActiveModel {
                id: Set(Uuid::new_v4()),
                place_id: Set(new.place_id),
                user_id: Set(new.user_id.clone()),
                user_email: Set(user_email.clone()),
                user_name: Set(new.user_name.clone()),
                booking_type: Set(new.booking_type),
                booking_date: Set(new.booking_date),
                booking_time: Set(new.booking_time.clone()),
                party_size: Set(new.party_size),
                status: Set(BookingStatus::Pending),
                special_request: Set(new.special_request.clone()),
                confirmation_code: Set(generate_confirmation_code()),
                table_number: Set(None),
                minimum_spend: Set(minimum_spend),
                sponsor_name: Set(sponsor_name.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                confirmed_at: Set(None),
                cancelled_at: Set(None),
            };

            match row.insert(self.pool.as_ref()).await {
                Ok(saved) => {
                    log::info!(
                        "Booking {} created for place {} on {}",
                        saved.confirmation_code,
                        saved.place_id,
                        saved.booking_date
                    );
                    return Ok(saved.into());
                }
                Err(e)
                    if attempt < CODE_ATTEMPTS
                        && matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                {
                    log::warn!("Confirmation code collision, retrying ({attempt})");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> AppResult<booking::Model> {
        booking::Entity::find()
            .filter(booking::Column::ConfirmationCode.eq(normalize_confirmation_code(code)))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))
    }

    pub async fn get_by_code(&self, code: &str) -> AppResult<BookingResponse> {
        Ok(self.find_by_code(code).await?.into())
    }

    /// Most recent booking date first.
    pub async fn list_for_email(&self, user_email: &str) -> AppResult<Vec<BookingResponse>> {
        let rows = booking::Entity::find()
            .filter(booking::Column::UserEmail.eq(user_email))
            .order_by_desc(booking::Column::BookingDate)
            .all(self.pool.as_ref())
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Cancelling twice is a no-op; a completed booking stays completed.
    pub async fn cancel(&self, code: &str) -> AppResult<BookingResponse> {
        let current = self.find_by_code(code).await?;
        match current.status {
            BookingStatus::Cancelled => return Ok(current.into()),
            BookingStatus::Completed => {
                return Err(AppError::ValidationError(
                    "Completed bookings cannot be cancelled".into(),
                ));
            }
            BookingStatus::Pending | BookingStatus::Confirmed => {}
        }

        let now = Utc::now();
        let mut row: booking::ActiveModel = current.into();
        row.status = Set(BookingStatus::Cancelled);
        row.cancelled_at = Set(Some(now));
        row.updated_at = Set(now);
        let saved = row.update(self.pool.as_ref()).await?;

        log::info!("Booking {} cancelled", saved.confirmation_code);
        Ok(saved.into())
    }
}
