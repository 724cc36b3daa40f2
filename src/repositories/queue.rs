//! # Job Queue Repository
//!
//! Durable queue operations over the sync_jobs table. The claim protocol is
//! deliberately a two-step select-then-conditional-update rather than a
//! single atomic dequeue: it is simple to express over a generic relational
//! store and still admits at most one successful claimant, because the
//! conditional update's `status = 'pending'` guard lets only one writer
//! observe and flip a given pending row. A claimant that loses the race gets
//! `None` and is expected to re-poll; the queue never retries internally.

use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::sync_job::{ActiveModel, Column, Entity, JobStatus, Model};

/// Repository for durable job queue operations
pub struct JobQueue {
    db: DatabaseConnection,
}

impl JobQueue {
    /// Create a new JobQueue backed by the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new job with status `pending`.
    ///
    /// Duplicate submissions are not suppressed here; callers own the
    /// decision of whether redundant work is acceptable.
    pub async fn enqueue(&self, job_type: &str, payload: JsonValue) -> Result<Model, DbErr> {
        let now = Utc::now().fixed_offset();

        let job = ActiveModel {
            id: Set(Uuid::new_v4()),
            status: Set(JobStatus::Pending.as_str().to_string()),
            job_type: Set(job_type.to_string()),
            payload: Set(payload),
            result: Set(None),
            error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = job.insert(&self.db).await?;

        tracing::info!(
            job_id = %inserted.id,
            job_type = %inserted.job_type,
            "Job enqueued"
        );

        Ok(inserted)
    }

    /// Claim the oldest pending job, if any.
    ///
    /// Selects the single oldest `pending` row, then attempts the
    /// pending -> processing transition with a conditional update. Zero
    /// affected rows means another claimant won the race; the call reports
    /// "no job" instead of retrying.
    pub async fn claim(&self) -> Result<Option<Model>, DbErr> {
        let Some(candidate) = Entity::find()
            .filter(Column::Status.eq(JobStatus::Pending.as_str()))
            .order_by_asc(Column::CreatedAt)
            .limit(1)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let now = Utc::now().fixed_offset();
        let update_result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(JobStatus::Processing.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(candidate.id))
            .filter(Column::Status.eq(JobStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;

        if update_result.rows_affected == 0 {
            tracing::debug!(job_id = %candidate.id, "Lost claim race, job taken by another worker");
            return Ok(None);
        }

        let claimed = Entity::find_by_id(candidate.id).one(&self.db).await?;

        if let Some(job) = &claimed {
            tracing::info!(job_id = %job.id, job_type = %job.job_type, "Job claimed");
        }

        Ok(claimed)
    }

    /// Mark a claimed job `done` and record its result summary.
    ///
    /// Only the claimant writes these columns post-claim, so the
    /// read-modify-write is not guarded against concurrent writers.
    pub async fn complete(&self, job_id: Uuid, result: JsonValue) -> Result<Model, DbErr> {
        let job = self.require(job_id).await?;

        let mut active: ActiveModel = job.into();
        active.status = Set(JobStatus::Done.as_str().to_string());
        active.result = Set(Some(result));
        active.updated_at = Set(Utc::now().fixed_offset());

        let updated = active.update(&self.db).await?;
        tracing::info!(job_id = %updated.id, "Job completed");
        Ok(updated)
    }

    /// Mark a claimed job `error`, preserving the failure message verbatim.
    pub async fn fail(&self, job_id: Uuid, message: &str) -> Result<Model, DbErr> {
        let job = self.require(job_id).await?;

        let now = Utc::now();
        let mut active: ActiveModel = job.into();
        active.status = Set(JobStatus::Error.as_str().to_string());
        active.error = Set(Some(serde_json::json!({
            "message": message,
            "failed_at": now.to_rfc3339(),
        })));
        active.updated_at = Set(now.fixed_offset());

        let updated = active.update(&self.db).await?;
        tracing::warn!(job_id = %updated.id, error = %message, "Job failed");
        Ok(updated)
    }

    /// Find a job by id.
    pub async fn find(&self, job_id: Uuid) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(job_id).one(&self.db).await
    }

    async fn require(&self, job_id: Uuid) -> Result<Model, DbErr> {
        self.find(job_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("sync_jobs.id = {job_id}")))
    }
}
