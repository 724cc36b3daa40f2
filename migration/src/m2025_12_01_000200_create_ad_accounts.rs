//! Migration to create the ad_accounts table.
//!
//! This migration creates the ad_accounts table holding external platform
//! accounts imported into a tenant. The external id is immutable; name and
//! status are refreshed on re-import through the uniqueness constraint on
//! (tenant_id, platform, external_id).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdAccounts::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(AdAccounts::Platform)
                            .text()
                            .not_null()
                            .default("meta"),
                    )
                    .col(ColumnDef::new(AdAccounts::ExternalId).text().not_null())
                    .col(ColumnDef::new(AdAccounts::Name).text().null())
                    .col(ColumnDef::new(AdAccounts::Status).text().null())
                    .col(
                        ColumnDef::new(AdAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AdAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ad_accounts_tenant_id")
                            .from(AdAccounts::Table, AdAccounts::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ad_accounts_tenant_platform_external_unique")
                    .table(AdAccounts::Table)
                    .col(AdAccounts::TenantId)
                    .col(AdAccounts::Platform)
                    .col(AdAccounts::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ad_accounts_tenant_platform_external_unique")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AdAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdAccounts {
    Table,
    Id,
    TenantId,
    Platform,
    ExternalId,
    Name,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
