use crate::entities::{BookingType, City, PlaceType, place_entity as place};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const FEATURED_LIMIT: u64 = 8;

/// Listing filters; all optional and combined with AND.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PlaceFilters {
    #[serde(rename = "type")]
    pub place_type: Option<PlaceType>,
    pub city: Option<City>,
    pub has_vip: Option<bool>,
    pub is_hot: Option<bool>,
    pub exclusive: Option<bool>,
    pub booking_type: Option<BookingType>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
}

impl PlaceFilters {
    /// `LIKE` pattern for `search`, with wildcards in the input escaped.
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.to_lowercase().chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaceResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    pub city: City,
    pub location: String,
    pub region: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub google_maps_url: Option<String>,
    pub image: String,
    pub rating: f64,
    pub rating_count: i32,
    pub price: Option<String>,
    pub price_tier: Option<String>,
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
    pub ad_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub opening_hours_json: Option<serde_json::Value>,
    pub has_vip: bool,
    pub vip_min_spend: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<place::Model> for PlaceResponse {
    fn from(m: place::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            place_type: m.place_type,
            city: m.city,
            location: m.location,
            region: m.region,
            address: m.address,
            latitude: m.latitude,
            longitude: m.longitude,
            phone: m.phone,
            website: m.website,
            google_maps_url: m.google_maps_url,
            image: m.image,
            rating: m.rating,
            rating_count: m.rating_count,
            price: m.price,
            price_tier: m.price_tier,
            description: m.description,
            tags: m.tags,
            is_hot: m.is_hot,
            exclusive: m.exclusive,
            booking_type: m.booking_type,
            vibe: m.vibe,
            event_lineup: m.event_lineup,
            music_genre: m.music_genre,
            party_type: m.party_type,
            dress_code: m.dress_code,
            is_sponsored: m.is_sponsored,
            sponsor_name: m.sponsor_name,
            ad_url: m.ad_url,
            opening_hours_json: m.opening_hours_json,
            has_vip: m.has_vip,
            vip_min_spend: m.vip_min_spend,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
