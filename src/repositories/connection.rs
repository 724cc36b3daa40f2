//! # Platform Connection Repository
//!
//! Repository operations for the platform_connections table. The upsert
//! targets the unique tenant_id index, which is what keeps the invariant of
//! exactly one credential row per tenant: a second registration for the same
//! tenant overwrites the first, last-write-wins.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::models::platform_connection::{ActiveModel, Column, Entity, Model};

/// Repository for the tenant ads-platform credential
pub struct ConnectionRepository {
    db: DatabaseConnection,
}

impl ConnectionRepository {
    /// Create a new ConnectionRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upsert the tenant's credential, conflict target tenant_id.
    pub async fn upsert(
        &self,
        tenant_id: Uuid,
        platform_user_id: &str,
        access_token_ciphertext: Vec<u8>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbErr> {
        let now = Utc::now().fixed_offset();

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            platform_user_id: Set(platform_user_id.to_string()),
            access_token_ciphertext: Set(access_token_ciphertext),
            expires_at: Set(expires_at.map(|dt| dt.fixed_offset())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Entity::insert(model)
            .on_conflict(
                OnConflict::column(Column::TenantId)
                    .update_columns([
                        Column::PlatformUserId,
                        Column::AccessTokenCiphertext,
                        Column::ExpiresAt,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        tracing::info!(tenant_id = %tenant_id, "Platform credential stored");

        Ok(())
    }

    /// Load the tenant's credential.
    ///
    /// Ordered by updated_at descending as defensive ordering: the data
    /// model intends at most one row per tenant, but if more than one ever
    /// exists the most recently written credential wins.
    pub async fn latest_for_tenant(&self, tenant_id: Uuid) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::TenantId.eq(tenant_id))
            .order_by_desc(Column::UpdatedAt)
            .one(&self.db)
            .await
    }
}
