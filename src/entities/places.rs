use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "place_type")]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    #[sea_orm(string_value = "restaurant")]
    Restaurant,
    #[sea_orm(string_value = "nightlife")]
    Nightlife,
    #[sea_orm(string_value = "hotel")]
    Hotel,
    #[sea_orm(string_value = "event")]
    Event,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "city_type")]
pub enum City {
    #[sea_orm(string_value = "Montreal")]
    Montreal,
    #[sea_orm(string_value = "Quebec City")]
    #[serde(rename = "Quebec City")]
    QuebecCity,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// How a place takes bookings, shown on its card.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_type")]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    #[sea_orm(string_value = "reservation")]
    Reservation,
    #[sea_orm(string_value = "ticket")]
    Ticket,
    #[sea_orm(string_value = "guestlist")]
    Guestlist,
    #[sea_orm(string_value = "none")]
    #[serde(rename = "none")]
    NotBookable,
}

/// A venue or event listed in the guide. The `vip_contact_*` and
/// `vip_notes` columns are staff-only and never leave the service.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "places")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub place_type: PlaceType,
    pub city: City,
    pub location: String,
    pub region: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub website: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub google_maps_url: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub image: String,
    pub rating: f64,
    pub rating_count: i32,
    pub price: Option<String>,
    pub price_tier: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub tags: Vec<String>,
    pub is_hot: bool,
    pub exclusive: bool,
    pub booking_type: BookingType,
    pub vibe: Option<String>,
    pub event_lineup: Option<Vec<String>>,
    pub music_genre: Option<String>,
    pub party_type: Option<String>,
    pub dress_code: Option<String>,
    pub is_sponsored: bool,
    pub sponsor_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ad_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub opening_hours_json: Option<Json>,
    pub has_vip: bool,
    pub vip_min_spend: Option<f64>,
    pub vip_contact_name: Option<String>,
    pub vip_contact_phone: Option<String>,
    pub vip_contact_email: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub vip_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vip_bookings::Entity")]
    VipBookings,
}

impl Related<super::vip_bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VipBookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
