use crate::entities::place_entity as place;
use crate::error::{AppError, AppResult};
use crate::models::{FEATURED_LIMIT, PlaceFilters, PlaceResponse};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};
use std::sync::Arc;
use uuid::Uuid;

/// Read side of the venue guide.
#[derive(Clone)]
pub struct PlaceService {
    pool: Arc<DatabaseConnection>,
}

fn lower_like(column: place::Column, pattern: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col((place::Entity, column)))).like(pattern)
}

/// Hot places first, then by rating.
pub(crate) fn filtered_query(filters: &PlaceFilters) -> Select<place::Entity> {
    let mut query = place::Entity::find();
    if let Some(place_type) = filters.place_type {
        query = query.filter(place::Column::PlaceType.eq(place_type));
    }
    if let Some(city) = filters.city {
        query = query.filter(place::Column::City.eq(city));
    }
    if let Some(has_vip) = filters.has_vip {
        query = query.filter(place::Column::HasVip.eq(has_vip));
    }
    if let Some(is_hot) = filters.is_hot {
        query = query.filter(place::Column::IsHot.eq(is_hot));
    }
    if let Some(exclusive) = filters.exclusive {
        query = query.filter(place::Column::Exclusive.eq(exclusive));
    }
    if let Some(booking_type) = filters.booking_type {
        query = query.filter(place::Column::BookingType.eq(booking_type));
    }
    if let Some(pattern) = filters.search_pattern() {
        query = query.filter(
            Condition::any()
                .add(lower_like(place::Column::Name, &pattern))
                .add(lower_like(place::Column::Description, &pattern)),
        );
    }
    query
        .order_by_desc(place::Column::IsHot)
        .order_by_desc(place::Column::Rating)
}

impl PlaceService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filters: &PlaceFilters) -> AppResult<Vec<PlaceResponse>> {
        let places = filtered_query(filters).all(self.pool.as_ref()).await?;
        Ok(places.into_iter().map(Into::into).collect())
    }

    /// Hot or exclusive places for the home page.
    pub async fn featured(&self) -> AppResult<Vec<PlaceResponse>> {
        let places = place::Entity::find()
            .filter(
                Condition::any()
                    .add(place::Column::IsHot.eq(true))
                    .add(place::Column::Exclusive.eq(true)),
            )
            .order_by_desc(place::Column::Rating)
            .limit(FEATURED_LIMIT)
            .all(self.pool.as_ref())
            .await?;
        Ok(places.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PlaceResponse> {
        place::Entity::find_by_id(id)
            .one(self.pool.as_ref())
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Place not found".into()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::{BookingType, City, PlaceType};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    pub(crate) fn sample_place(name: &str) -> place::Model {
        place::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            place_type: PlaceType::Nightlife,
            city: City::QuebecCity,
            location: "Saint-Roch".to_string(),
            region: None,
            address: Some("500 rue Saint-Joseph Est".to_string()),
            latitude: None,
            longitude: None,
            phone: None,
            website: None,
            google_maps_url: None,
            image: "https://cdn.example.com/lab.jpg".to_string(),
            rating: 4.6,
            rating_count: 212,
            price: None,
            price_tier: Some("$$".to_string()),
            description: "Cocktails and house music".to_string(),
            tags: vec!["cocktails".to_string()],
            is_hot: true,
            exclusive: false,
            booking_type: BookingType::Guestlist,
            vibe: Some("Underground".to_string()),
            event_lineup: None,
            music_genre: Some("House".to_string()),
            party_type: None,
            dress_code: None,
            is_sponsored: false,
            sponsor_name: None,
            ad_url: None,
            opening_hours_json: None,
            has_vip: true,
            vip_min_spend: Some(500.0),
            vip_contact_name: Some("Max".to_string()),
            vip_contact_phone: Some("418-555-0101".to_string()),
            vip_contact_email: Some("vip@lab.example".to_string()),
            vip_notes: Some("Ask for the mezzanine".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filters_and_ordering() {
        let filters = PlaceFilters {
            city: Some(City::Montreal),
            has_vip: Some(true),
            search: Some("Rooftop".to_string()),
            ..Default::default()
        };
        let sql = filtered_query(&filters)
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""has_vip" = TRUE"#), "{sql}");
        assert!(sql.contains("'Montreal'"), "{sql}");
        assert!(
            sql.contains(r#"LOWER("places"."name") LIKE '%rooftop%'"#),
            "{sql}"
        );
        assert!(sql.contains(" OR "), "{sql}");
        assert!(
            sql.ends_with(r#"ORDER BY "places"."is_hot" DESC, "places"."rating" DESC"#),
            "{sql}"
        );
    }

    #[test]
    fn test_no_filters_lists_everything() {
        let sql = filtered_query(&PlaceFilters::default())
            .build(DatabaseBackend::Postgres)
            .to_string();
        assert!(!sql.contains("WHERE"), "{sql}");
    }

    #[tokio::test]
    async fn test_list_hides_staff_only_fields() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_place("Le Lab")]])
            .into_connection();
        let svc = PlaceService::new(Arc::new(db));

        let places = svc.list(&PlaceFilters::default()).await.unwrap();
        assert_eq!(places.len(), 1);
        let json = serde_json::to_value(&places[0]).unwrap();
        assert_eq!(json["type"], "nightlife");
        assert_eq!(json["city"], "Quebec City");
        assert!(json.get("vip_contact_phone").is_none());
        assert!(json.get("vip_notes").is_none());
    }

    #[tokio::test]
    async fn test_unknown_place_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<place::Model>::new()])
            .into_connection();
        let svc = PlaceService::new(Arc::new(db));

        assert!(matches!(
            svc.get(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
