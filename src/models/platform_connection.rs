//! Platform connection entity model
//!
//! This module contains the SeaORM entity model for the platform_connections
//! table, which stores the single ads-platform credential a tenant holds.
//! The unique index on tenant_id makes the credential upsert last-write-wins.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Platform connection entity holding a tenant's ads-platform credential
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "platform_connections")]
pub struct Model {
    /// Unique identifier for the connection (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Tenant identifier; unique, one credential per tenant
    pub tenant_id: Uuid,

    /// Platform-side user identifier the token belongs to
    pub platform_user_id: String,

    /// Encrypted access token ciphertext (AES-256-GCM, AAD = tenant id)
    pub access_token_ciphertext: Vec<u8>,

    /// Token expiry reported by the platform, if any
    pub expires_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the connection was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the connection was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
