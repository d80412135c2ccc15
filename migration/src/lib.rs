pub use sea_orm_migration::prelude::*;

mod m20251012_000001_create_subscriptions;
mod m20251012_000002_create_ai_generations;
mod m20251020_000003_create_places;
mod m20251020_000004_create_vip_bookings;
mod m20251020_000005_create_email_subscribers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251012_000001_create_subscriptions::Migration),
            Box::new(m20251012_000002_create_ai_generations::Migration),
            Box::new(m20251020_000003_create_places::Migration),
            Box::new(m20251020_000004_create_vip_bookings::Migration),
            Box::new(m20251020_000005_create_email_subscribers::Migration),
        ]
    }
}
