use super::{Subscription, SubscriptionStore};
use crate::entities::subscription_entity as sub;
use crate::error::{AppError, AppResult};
use crate::models::UsageKind;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, UpdateMany};
use std::sync::Arc;

/// Postgres-backed store. Increments are `SET col = col + 1` so concurrent
/// requests for one identity never lose an update.
#[derive(Clone)]
pub struct SeaOrmSubscriptionStore {
    pool: Arc<DatabaseConnection>,
}

impl SeaOrmSubscriptionStore {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }
}

fn to_active_model(record: &Subscription) -> sub::ActiveModel {
    sub::ActiveModel {
        id: Set(record.id),
        user_email: Set(record.user_email.clone()),
        stripe_customer_id: Set(record.stripe_customer_id.clone()),
        subscription_status: Set(record.subscription_status),
        trial_start_date: Set(record.trial_start_date),
        trial_end_date: Set(record.trial_end_date),
        subscription_start_date: Set(record.subscription_start_date),
        messages_used: Set(record.messages_used),
        images_used: Set(record.images_used),
        message_limit: Set(record.message_limit),
        image_limit: Set(record.image_limit),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
    }
}

#[async_trait]
impl SubscriptionStore for SeaOrmSubscriptionStore {
    async fn find(&self, identity: &str) -> AppResult<Option<Subscription>> {
        sub::Entity::find()
            .filter(sub::Column::UserEmail.eq(identity))
            .one(self.pool.as_ref())
            .await
            .map_err(AppError::storage)
    }

    async fn insert_if_absent(&self, record: Subscription) -> AppResult<Option<Subscription>> {
        let result = sub::Entity::insert(to_active_model(&record))
            .on_conflict(
                OnConflict::column(sub::Column::UserEmail)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(self.pool.as_ref())
            .await;

        match result {
            Ok(_) => Ok(Some(record)),
            // ON CONFLICT DO NOTHING matched an existing row
            Err(DbErr::RecordNotInserted) => Ok(None),
            Err(e) => Err(AppError::storage(e)),
        }
    }

    async fn increment_usage(&self, identity: &str, kind: UsageKind) -> AppResult<bool> {
        let column = kind.column();
        let res = sub::Entity::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .col_expr(sub::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(sub::Column::UserEmail.eq(identity))
            .exec(self.pool.as_ref())
            .await
            .map_err(AppError::storage)?;
        Ok(res.rows_affected > 0)
    }

    async fn raise_usage(&self, identity: &str, kind: UsageKind, value: i32) -> AppResult<bool> {
        let res = raise_usage_query(identity, kind, value)
            .exec(self.pool.as_ref())
            .await
            .map_err(AppError::storage)?;
        Ok(res.rows_affected > 0)
    }
}

/// `UPDATE ... SET col = value WHERE user_email = ? AND col < value`; the
/// guard keeps a stale read from ever lowering the counter.
fn raise_usage_query(identity: &str, kind: UsageKind, value: i32) -> UpdateMany<sub::Entity> {
    let column = kind.column();
    sub::Entity::update_many()
        .col_expr(column, Expr::value(value))
        .col_expr(sub::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(sub::Column::UserEmail.eq(identity))
        .filter(column.lt(value))
}
