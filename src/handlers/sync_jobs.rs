//! # Sync Job Handlers
//!
//! Thin glue over the job queue: enqueue an account sync and poll a job's
//! state. Job visibility is deliberately pull-based — the worker records
//! outcomes on the queue row and external tooling polls the status
//! endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::{ApiError, not_found, validation_error};
use crate::models::sync_job::{self, AccountSyncPayload, JOB_TYPE_ACCOUNT_SYNC};
use crate::repositories::{AdAccountRepository, JobQueue};
use crate::server::AppState;

/// Request body for enqueueing an account sync
#[derive(Debug, Deserialize, ToSchema)]
pub struct EnqueueSyncRequest {
    /// Internal id of the ad account to sync
    pub account_id: Uuid,
    /// Inclusive lookback window in days; service default when omitted
    pub lookback_days: Option<u32>,
}

/// Response for a successfully enqueued job
#[derive(Debug, Serialize, ToSchema)]
pub struct EnqueueSyncResponse {
    /// Identifier of the queued job
    pub job_id: Uuid,
}

/// Job state view returned by the status endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct JobInfo {
    /// Unique identifier for the job
    pub id: Uuid,
    /// Current status (pending, processing, done, error)
    pub status: String,
    /// Job type tag
    pub job_type: String,
    /// Enqueue-time payload
    pub payload: JsonValue,
    /// Success summary, present once the job is done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Failure details, present once the job has errored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonValue>,
    /// Timestamp when the job was enqueued
    pub created_at: String,
    /// Timestamp of the last state transition
    pub updated_at: String,
}

impl From<sync_job::Model> for JobInfo {
    fn from(model: sync_job::Model) -> Self {
        Self {
            id: model.id,
            status: model.status,
            job_type: model.job_type,
            payload: model.payload,
            result: model.result,
            error: model.error,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Enqueue a sync job for one ad account
#[utoipa::path(
    post,
    path = "/v1/sync/jobs",
    request_body = EnqueueSyncRequest,
    params(crate::auth::TenantHeader),
    responses(
        (status = 202, description = "Job enqueued", body = EnqueueSyncResponse),
        (status = 400, description = "Invalid lookback window"),
        (status = 404, description = "Account not found for tenant")
    ),
    tag = "sync",
    security(("bearer_auth" = []))
)]
pub async fn enqueue(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(body): Json<EnqueueSyncRequest>,
) -> Result<(StatusCode, Json<EnqueueSyncResponse>), ApiError> {
    let max_days = state.config.sync.max_lookback_days;
    if let Some(days) = body.lookback_days
        && (days == 0 || days > max_days)
    {
        return Err(validation_error(
            "Invalid lookback window",
            serde_json::json!({
                "lookback_days": format!("must be between 1 and {}", max_days)
            }),
        ));
    }

    // Explicit tenant scoping: the account must belong to the caller's tenant
    let accounts = AdAccountRepository::new(state.db.clone());
    let account = accounts
        .find(body.account_id)
        .await?
        .filter(|account| account.tenant_id == tenant.0)
        .ok_or_else(|| not_found("Ad account not found"))?;

    let payload = AccountSyncPayload {
        account_id: account.id,
        lookback_days: body.lookback_days,
    };
    let payload_json = serde_json::to_value(&payload)
        .map_err(|err| anyhow::anyhow!("failed to serialize job payload: {err}"))?;

    let queue = JobQueue::new(state.db.clone());
    let job = queue.enqueue(JOB_TYPE_ACCOUNT_SYNC, payload_json).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueSyncResponse { job_id: job.id }),
    ))
}

/// Fetch the current state of a job
#[utoipa::path(
    get,
    path = "/v1/sync/jobs/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job identifier"),
        crate::auth::TenantHeader
    ),
    responses(
        (status = 200, description = "Job state", body = JobInfo),
        (status = 404, description = "Job not found")
    ),
    tag = "sync",
    security(("bearer_auth" = []))
)]
pub async fn status(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobInfo>, ApiError> {
    let queue = JobQueue::new(state.db.clone());
    let job = queue
        .find(job_id)
        .await?
        .ok_or_else(|| not_found("Job not found"))?;

    Ok(Json(job.into()))
}
