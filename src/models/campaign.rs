//! Campaign entity model
//!
//! Campaign dimension rows, unique per (tenant, external id). Created and
//! refreshed by the ingest writer; never deleted by the sync pipeline.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Campaign dimension entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    /// Unique identifier for the campaign row (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Platform-side campaign identifier
    pub external_id: String,

    /// Display name seen in the most recent fetch batch
    pub name: Option<String>,

    /// Timestamp when the campaign was first seen
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the campaign was last refreshed
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
    #[sea_orm(has_many = "super::campaign_insight::Entity")]
    CampaignInsight,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::campaign_insight::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CampaignInsight.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
