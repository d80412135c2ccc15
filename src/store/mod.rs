//! Persistence seam for subscription records.
//!
//! The ledger only talks to [`SubscriptionStore`]; the process builds one
//! store at startup and hands it to [`crate::services::LedgerService`].

pub mod sea_orm_store;

#[cfg(test)]
pub mod memory;

pub use sea_orm_store::SeaOrmSubscriptionStore;

use crate::error::AppResult;
use crate::models::UsageKind;
use async_trait::async_trait;

pub use crate::entities::subscription_entity::Model as Subscription;

/// Keyed by identity (`user_email`). Implementations map every backend
/// failure to [`crate::error::AppError::StorageUnavailable`].
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find(&self, identity: &str) -> AppResult<Option<Subscription>>;

    /// Inserts `record` unless one already exists for its identity.
    /// Returns `None` when another writer created it first.
    async fn insert_if_absent(&self, record: Subscription) -> AppResult<Option<Subscription>>;

    /// Adds one to the counter in a single store-level operation.
    /// Returns `false` when no record exists for `identity`.
    async fn increment_usage(&self, identity: &str, kind: UsageKind) -> AppResult<bool>;

    /// Sets the counter to `value` only if that raises it.
    async fn raise_usage(&self, identity: &str, kind: UsageKind, value: i32) -> AppResult<bool>;
}
