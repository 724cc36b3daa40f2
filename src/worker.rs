//! Queue worker loop
//!
//! A long-lived, single-flight loop: claim one job, dispatch it by type,
//! sleep the fixed poll interval, repeat. Everything raised while
//! processing a claimed job is converted into a `fail` transition on that
//! job; errors while polling the queue itself are logged and the loop
//! carries on after the same sleep. The loop only exits when the shutdown
//! token fires.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DbErr};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::meta::InsightsSource;
use crate::models::sync_job::{
    AccountSyncPayload, JOB_TYPE_ACCOUNT_SYNC, Model as JobModel, SyncJobResult,
};
use crate::repositories::JobQueue;
use crate::sync::SyncRunner;

/// Background worker that drains the sync job queue.
pub struct Worker {
    queue: JobQueue,
    runner: SyncRunner,
    poll_interval: Duration,
}

impl Worker {
    /// Build a worker from application configuration.
    pub fn new(
        db: DatabaseConnection,
        insights: Arc<dyn InsightsSource>,
        crypto_key: CryptoKey,
        config: &AppConfig,
    ) -> Self {
        let runner = SyncRunner::new(
            db.clone(),
            insights,
            crypto_key,
            config.sync.default_lookback_days,
        );

        Self {
            queue: JobQueue::new(db),
            runner,
            poll_interval: Duration::from_millis(config.worker.poll_interval_ms),
        }
    }

    /// Run the worker loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Starting sync worker"
        );

        loop {
            match self.tick().await {
                Ok(true) => {}
                Ok(false) => {
                    counter!("sync_worker_empty_polls_total").increment(1);
                }
                Err(err) => {
                    // Transport-level failure reaching the queue; nothing to
                    // fail, re-poll after the usual sleep
                    counter!("sync_worker_poll_errors_total").increment(1);
                    error!(error = %err, "Worker poll failed");
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sync worker shutdown requested");
                    break;
                }
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!("Sync worker stopped");
    }

    /// Claim and process at most one job. Returns whether a job was claimed.
    pub async fn tick(&self) -> Result<bool, DbErr> {
        let Some(job) = self.queue.claim().await? else {
            debug!("No pending jobs");
            return Ok(false);
        };

        self.dispatch(job).await;
        Ok(true)
    }

    /// Dispatch one claimed job by its type and record the outcome on the
    /// queue row. Never propagates job-scoped errors to the loop.
    async fn dispatch(&self, job: JobModel) {
        let started = std::time::Instant::now();

        let outcome = match job.job_type.as_str() {
            JOB_TYPE_ACCOUNT_SYNC => {
                match serde_json::from_value::<AccountSyncPayload>(job.payload.clone()) {
                    Ok(payload) => self
                        .runner
                        .run(&payload)
                        .await
                        .map_err(|err| err.to_string()),
                    Err(err) => Err(format!("invalid {} payload: {}", JOB_TYPE_ACCOUNT_SYNC, err)),
                }
            }
            other => Err(format!("unknown job type: {}", other)),
        };

        histogram!("sync_worker_job_duration_ms")
            .record(started.elapsed().as_secs_f64() * 1_000.0);

        match outcome {
            Ok(counts) => {
                let result = SyncJobResult {
                    campaigns_touched: counts.campaigns_touched,
                    facts_written: counts.facts_written,
                    finished_at: Utc::now().fixed_offset(),
                };
                let result_json = match serde_json::to_value(&result) {
                    Ok(value) => value,
                    Err(err) => {
                        // Fall back to an empty object rather than orphan
                        // the job on a serialization failure
                        warn!(job_id = %job.id, error = %err, "Failed to serialize job result");
                        serde_json::json!({})
                    }
                };

                if let Err(err) = self.queue.complete(job.id, result_json).await {
                    // The job stays `processing`; recovering it requires a
                    // manual re-enqueue, there is no automatic reaper
                    counter!("sync_worker_finalize_errors_total").increment(1);
                    error!(job_id = %job.id, error = %err, "Failed to mark job done");
                } else {
                    counter!("sync_worker_jobs_processed_total").increment(1);
                }
            }
            Err(message) => {
                if let Err(err) = self.queue.fail(job.id, &message).await {
                    counter!("sync_worker_finalize_errors_total").increment(1);
                    error!(job_id = %job.id, error = %err, "Failed to mark job errored");
                } else {
                    counter!("sync_worker_jobs_failed_total").increment(1);
                }
            }
        }
    }
}
