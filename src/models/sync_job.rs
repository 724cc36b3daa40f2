//! SyncJob entity model
//!
//! This module contains the SeaORM entity model for the sync_jobs table —
//! the durable job queue — together with the typed payload and result
//! shapes for the job types the worker understands.
//!
//! Completion data lives in the dedicated `result` and `error` columns
//! instead of being merged back into `payload`, so the enqueue-time payload
//! stays immutable for the life of the job.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Job type handled by the worker: sync one ad account's lookback window.
pub const JOB_TYPE_ACCOUNT_SYNC: &str = "account_sync";

/// SyncJob entity representing one queued unit of work
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_jobs")]
pub struct Model {
    /// Unique identifier for the job (primary key)
    #[sea_orm(primary_key)]
    pub id: Uuid,

    /// Current status (pending, processing, done, error)
    pub status: String,

    /// Job type tag selecting the payload shape
    pub job_type: String,

    /// Enqueue-time payload, immutable after insert
    #[sea_orm(column_type = "JsonBinary")]
    pub payload: JsonValue,

    /// Success summary, set when the job transitions to done
    #[sea_orm(column_type = "JsonBinary")]
    pub result: Option<JsonValue>,

    /// Failure details, set when the job transitions to error
    #[sea_orm(column_type = "JsonBinary")]
    pub error: Option<JsonValue>,

    /// Timestamp when the job was enqueued; claim order key
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp of the last state transition
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle states of a queued job.
///
/// A job never regresses: retries are modeled by enqueueing a new job, not
/// by resetting a finished one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for an `account_sync` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountSyncPayload {
    /// Internal id of the ad account to sync (ad_accounts.id)
    pub account_id: Uuid,
    /// Inclusive lookback window length in days; worker default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_days: Option<u32>,
}

/// Success summary written to the `result` column of a finished sync job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncJobResult {
    /// Distinct campaigns touched by the dimension phase
    pub campaigns_touched: u64,
    /// Fact rows written by the fact phase
    pub facts_written: u64,
    /// Completion wall-clock timestamp
    pub finished_at: DateTimeWithTimeZone,
}
