//! Migration to create the campaign_insights_daily table.
//!
//! One row per (tenant, campaign, day) holding the three ingested measures.
//! Re-ingestion of a day overwrites the full row through the uniqueness
//! constraint, which is what makes repeated syncs idempotent.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CampaignInsightsDaily::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::TenantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::CampaignId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CampaignInsightsDaily::Day).date().not_null())
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::Spend)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::Impressions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CampaignInsightsDaily::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_insights_daily_tenant_id")
                            .from(
                                CampaignInsightsDaily::Table,
                                CampaignInsightsDaily::TenantId,
                            )
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_insights_daily_campaign_id")
                            .from(
                                CampaignInsightsDaily::Table,
                                CampaignInsightsDaily::CampaignId,
                            )
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaign_insights_daily_tenant_campaign_day_unique")
                    .table(CampaignInsightsDaily::Table)
                    .col(CampaignInsightsDaily::TenantId)
                    .col(CampaignInsightsDaily::CampaignId)
                    .col(CampaignInsightsDaily::Day)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Read-side queries scan a tenant's rows across a day window
        manager
            .create_index(
                Index::create()
                    .name("idx_campaign_insights_daily_tenant_day")
                    .table(CampaignInsightsDaily::Table)
                    .col(CampaignInsightsDaily::TenantId)
                    .col(CampaignInsightsDaily::Day)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_campaign_insights_daily_tenant_day")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_campaign_insights_daily_tenant_campaign_day_unique")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(CampaignInsightsDaily::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CampaignInsightsDaily {
    Table,
    Id,
    TenantId,
    CampaignId,
    Day,
    Spend,
    Impressions,
    Clicks,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
}
