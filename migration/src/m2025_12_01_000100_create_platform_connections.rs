//! Migration to create the platform_connections table.
//!
//! This migration creates the platform_connections table which stores the
//! tenant-scoped ads-platform credential. The unique index on tenant_id is
//! the conflict target that keeps the table at one credential per tenant.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlatformConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlatformConnections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlatformConnections::TenantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlatformConnections::PlatformUserId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlatformConnections::AccessTokenCiphertext)
                            .binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlatformConnections::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PlatformConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PlatformConnections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_platform_connections_tenant_id")
                            .from(PlatformConnections::Table, PlatformConnections::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_platform_connections_tenant_unique")
                    .table(PlatformConnections::Table)
                    .col(PlatformConnections::TenantId)
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
                    .name("idx_platform_connections_tenant_unique")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(PlatformConnections::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PlatformConnections {
    Table,
    Id,
    TenantId,
    PlatformUserId,
    AccessTokenCiphertext,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
