//! Migration to create the sync_jobs table.
//!
//! This migration creates the durable job queue. Rows move
//! pending -> processing -> {done, error}; the claim transition is a
//! conditional update guarded on the pending status, so the table needs no
//! other locking support beyond the status/created_at index used to find
//! the oldest pending row.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncJobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SyncJobs::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(SyncJobs::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(SyncJobs::JobType).text().not_null())
                    .col(ColumnDef::new(SyncJobs::Payload).json_binary().not_null())
                    .col(ColumnDef::new(SyncJobs::Result).json_binary().null())
                    .col(ColumnDef::new(SyncJobs::Error).json_binary().null())
                    .col(
                        ColumnDef::new(SyncJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SyncJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for picking the oldest pending job
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_jobs_status_created")
                    .table(SyncJobs::Table)
                    .col(SyncJobs::Status)
                    .col(SyncJobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sync_jobs_status_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SyncJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SyncJobs {
    Table,
    Id,
    Status,
    JobType,
    Payload,
    Result,
    Error,
    CreatedAt,
    UpdatedAt,
}
