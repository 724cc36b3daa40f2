//! Database migrations for the Adsync service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_12_01_000001_create_tenants;
mod m2025_12_01_000100_create_platform_connections;
mod m2025_12_01_000200_create_ad_accounts;
mod m2025_12_01_000300_create_campaigns;
mod m2025_12_01_000400_create_campaign_insights;
mod m2025_12_01_000500_create_sync_jobs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_12_01_000001_create_tenants::Migration),
            Box::new(m2025_12_01_000100_create_platform_connections::Migration),
            Box::new(m2025_12_01_000200_create_ad_accounts::Migration),
            Box::new(m2025_12_01_000300_create_campaigns::Migration),
            Box::new(m2025_12_01_000400_create_campaign_insights::Migration),
            Box::new(m2025_12_01_000500_create_sync_jobs::Migration),
        ]
    }
}
