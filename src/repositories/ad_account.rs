//! # Ad Account Repository
//!
//! Repository operations for the ad_accounts table. Accounts are imported
//! from the platform when a credential is registered; re-imports refresh
//! name and status through the (tenant, platform, external id) uniqueness
//! constraint while the external id itself stays immutable.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};
use uuid::Uuid;

use crate::models::ad_account::{ActiveModel, Column, Entity, Model};

/// One account as reported by the platform's account listing.
#[derive(Debug, Clone)]
pub struct ImportedAccount {
    pub external_id: String,
    pub name: Option<String>,
    pub status: Option<String>,
}

/// Repository for imported ad accounts
pub struct AdAccountRepository {
    db: DatabaseConnection,
}

impl AdAccountRepository {
    /// Create a new AdAccountRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upsert the accounts reported by the platform for this tenant.
    ///
    /// Returns the number of accounts written.
    pub async fn import(
        &self,
        tenant_id: Uuid,
        platform: &str,
        accounts: &[ImportedAccount],
    ) -> Result<u64, DbErr> {
        if accounts.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().fixed_offset();
        let models: Vec<ActiveModel> = accounts
            .iter()
            .map(|account| ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                platform: Set(platform.to_string()),
                external_id: Set(account.external_id.clone()),
                name: Set(account.name.clone()),
                status: Set(account.status.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();

        let written = models.len() as u64;

        Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([Column::TenantId, Column::Platform, Column::ExternalId])
                    .update_columns([Column::Name, Column::Status, Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        tracing::info!(
            tenant_id = %tenant_id,
            platform = %platform,
            imported = written,
            "Ad accounts imported"
        );

        Ok(written)
    }

    /// Find an account by its internal row id.
    pub async fn find(&self, account_id: Uuid) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(account_id).one(&self.db).await
    }
}
