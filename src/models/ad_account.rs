//! Ad account entity model
//!
//! This module contains the SeaORM entity model for the ad_accounts table,
//! which stores external platform accounts imported into a tenant. The
//! external id never changes; name and status are refreshed on re-import.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Ad account entity, unique per (tenant, platform, external id)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_accounts")]
pub struct Model {
    /// Unique identifier for the account row (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Platform tag (currently always "meta")
    pub platform: String,

    /// Platform-side account identifier (e.g. "act_123")
    pub external_id: String,

    /// Display name reported by the platform
    pub name: Option<String>,

    /// Account status reported by the platform
    pub status: Option<String>,

    /// Timestamp when the account was first imported
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the account was last refreshed
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
