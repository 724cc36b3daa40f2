//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations applied, plus fixture helpers for tenants, accounts and
//! credentials.

use adsync::crypto::{self, CryptoKey};
use adsync::migration::{Migrator, MigratorTrait};
use adsync::models::{ad_account, tenant};
use adsync::repositories::ConnectionRepository;
use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool is capped at a single connection so every query observes the
/// same in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Fixed 32-byte key for sealing fixture credentials.
#[allow(dead_code)]
pub fn test_crypto_key() -> CryptoKey {
    CryptoKey::new(vec![42u8; 32]).expect("32-byte test key")
}

/// Creates a test tenant and returns its id.
#[allow(dead_code)]
pub async fn create_test_tenant(db: &DatabaseConnection) -> Result<Uuid> {
    let id = Uuid::new_v4();

    tenant::ActiveModel {
        id: Set(id),
        name: Set(Some("Test Tenant".to_string())),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await?;

    Ok(id)
}

/// Creates an imported ad account for the tenant and returns its row id.
#[allow(dead_code)]
pub async fn create_test_account(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    external_id: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now().fixed_offset();

    ad_account::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant_id),
        platform: Set("meta".to_string()),
        external_id: Set(external_id.to_string()),
        name: Set(Some("Test Account".to_string())),
        status: Set(Some("1".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(id)
}

/// Seals and stores a platform credential for the tenant.
#[allow(dead_code)]
pub async fn store_test_credential(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    access_token: &str,
) -> Result<()> {
    let key = test_crypto_key();
    let ciphertext = crypto::seal_access_token(&key, tenant_id, access_token)?;

    ConnectionRepository::new(db.clone())
        .upsert(tenant_id, "user-1", ciphertext, None)
        .await?;

    Ok(())
}
