use crate::entities::email_subscriber_entity as subscriber;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewsletterPreferences, SubscribeRequest, SubscribeResponse, UpdatePreferencesRequest,
    normalize_email,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct NewsletterService {
    pool: Arc<DatabaseConnection>,
}

impl NewsletterService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// Signing up again is a success that leaves the stored preferences alone.
    pub async fn subscribe(&self, request: SubscribeRequest) -> AppResult<SubscribeResponse> {
        let email = normalize_email(&request.email)?;
        let preferences = serde_json::to_value(request.preferences.unwrap_or_default())?;
        let now = Utc::now();

        let result = subscriber::Entity::insert(subscriber::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.clone()),
            preferences: Set(preferences),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(subscriber::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec(self.pool.as_ref())
        .await;

        let already_subscribed = match result {
            Ok(_) => false,
            Err(DbErr::RecordNotInserted) => true,
            Err(e) => return Err(e.into()),
        };
        if !already_subscribed {
            log::info!("New newsletter subscriber");
        }
        Ok(SubscribeResponse {
            email,
            already_subscribed,
        })
    }

    pub async fn update_preferences(
        &self,
        request: UpdatePreferencesRequest,
    ) -> AppResult<NewsletterPreferences> {
        let email = normalize_email(&request.email)?;
        let res = subscriber::Entity::update_many()
            .col_expr(
                subscriber::Column::Preferences,
                Expr::value(serde_json::to_value(request.preferences)?),
            )
            .col_expr(subscriber::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(subscriber::Column::Email.eq(email))
            .exec(self.pool.as_ref())
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Subscriber not found".into()));
        }
        Ok(request.preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, RuntimeErr};

    fn affected(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn subscribe(email: &str) -> SubscribeRequest {
        SubscribeRequest {
            email: email.to_string(),
            preferences: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_signup_is_success() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([affected(1), affected(0)])
            .into_connection();
        let svc = NewsletterService::new(Arc::new(db));

        let first = svc.subscribe(subscribe("Marie@Example.ca")).await.unwrap();
        assert_eq!(first.email, "marie@example.ca");
        assert!(!first.already_subscribed);

        let again = svc.subscribe(subscribe("marie@example.ca")).await.unwrap();
        assert!(again.already_subscribed);
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = NewsletterService::new(Arc::new(db));

        assert!(matches!(
            svc.subscribe(subscribe("marie")).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_signup_database_error_is_reported() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Exec(RuntimeErr::Internal("timeout".into()))])
            .into_connection();
        let svc = NewsletterService::new(Arc::new(db));

        assert!(matches!(
            svc.subscribe(subscribe("marie@example.ca")).await,
            Err(AppError::DatabaseError(_))
        ));
    }

    #[tokio::test]
    async fn test_preferences_for_unknown_subscriber() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([affected(1), affected(0)])
            .into_connection();
        let svc = NewsletterService::new(Arc::new(db));
        let update = |email: &str| UpdatePreferencesRequest {
            email: email.to_string(),
            preferences: NewsletterPreferences {
                events: false,
                ..Default::default()
            },
        };

        let saved = svc.update_preferences(update("marie@example.ca")).await.unwrap();
        assert!(!saved.events);
        assert!(matches!(
            svc.update_preferences(update("nobody@example.ca")).await,
            Err(AppError::NotFound(_))
        ));
    }
}
