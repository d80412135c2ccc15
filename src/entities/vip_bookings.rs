use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "vip_booking_type")]
#[serde(rename_all = "snake_case")]
pub enum VipBookingType {
    #[sea_orm(string_value = "guestlist")]
    Guestlist,
    #[sea_orm(string_value = "vip")]
    Vip,
    #[sea_orm(string_value = "event")]
    Event,
}

/// `pending` on creation; staff confirm, guests may cancel until the night
/// is `completed`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_status")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vip_bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub place_id: Uuid,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_name: String,
    pub booking_type: VipBookingType,
    pub booking_date: NaiveDate,
    /// `HH:MM`
    pub booking_time: Option<String>,
    pub party_size: i32,
    pub status: BookingStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub special_request: Option<String>,
    #[sea_orm(unique)]
    pub confirmation_code: String,
    pub table_number: Option<String>,
    pub minimum_spend: Option<f64>,
    pub sponsor_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::places::Entity",
        from = "Column::PlaceId",
        to = "super::places::Column::Id",
        on_delete = "Cascade"
    )]
    Place,
}

impl Related<super::places::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Place.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
