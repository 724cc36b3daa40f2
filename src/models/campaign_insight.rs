//! Daily campaign insight entity model
//!
//! The atomic unit of ingested data: one row per (tenant, campaign, day)
//! holding spend, impressions and clicks. A day is always written in full;
//! re-ingestion overwrites the three measures rather than accumulating them.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Daily fact row for one campaign
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaign_insights_daily")]
pub struct Model {
    /// Unique identifier for the fact row (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Internal campaign id resolved during the dimension phase
    pub campaign_id: Uuid,

    /// Calendar date the measures belong to
    pub day: Date,

    /// Spend in the platform's account currency
    #[sea_orm(column_type = "Double")]
    pub spend: f64,

    /// Impression count for the day
    pub impressions: i64,

    /// Click count for the day
    pub clicks: i64,

    /// Timestamp when the row was first written
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp of the most recent overwrite
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
