//! Account sync orchestration
//!
//! The handler behind `account_sync` jobs. One invocation is strictly
//! linear: resolve the account, resolve the tenant's credential, compute
//! the lookback window, fetch, write, report counts. There is no partial
//! success state — chunk upserts already committed stay committed, and
//! because every write is a keyed upsert a re-run of the same window
//! converges on the same state.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::crypto::{self, CryptoError, CryptoKey};
use crate::ingest::{IngestCounts, write_daily_insights};
use crate::meta::{FetchError, InsightsSource};
use crate::models::sync_job::AccountSyncPayload;
use crate::repositories::{AdAccountRepository, ConnectionRepository};

/// Terminal errors for a single sync job. Each variant maps to one class of
/// the failure taxonomy: not-found, upstream, persistence. The rendered
/// message is what lands verbatim in the job's error field.
#[derive(Debug, Error)]
pub enum SyncTaskError {
    #[error("ad account {0} not found")]
    AccountNotFound(Uuid),

    #[error("no platform connection for tenant {0}; connect the ads platform first")]
    CredentialMissing(Uuid),

    #[error("stored credential could not be opened: {0}")]
    Credential(#[from] CryptoError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to persist insights: {0}")]
    Persistence(#[from] DbErr),
}

/// Compute the inclusive lookback window ending today.
///
/// `days = 7` yields exactly 7 calendar dates, today included. Dates are
/// naive wall-clock dates; no timezone conversion beyond date truncation.
pub fn lookback_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let days = days.max(1);
    let since = today - Duration::days(i64::from(days) - 1);
    (since, today)
}

/// Orchestrates one account sync from credential lookup to written counts.
pub struct SyncRunner {
    db: DatabaseConnection,
    insights: Arc<dyn InsightsSource>,
    crypto_key: CryptoKey,
    default_lookback_days: u32,
}

impl SyncRunner {
    pub fn new(
        db: DatabaseConnection,
        insights: Arc<dyn InsightsSource>,
        crypto_key: CryptoKey,
        default_lookback_days: u32,
    ) -> Self {
        Self {
            db,
            insights,
            crypto_key,
            default_lookback_days,
        }
    }

    /// Run one sync to completion.
    #[instrument(skip(self), fields(account_id = %payload.account_id))]
    pub async fn run(&self, payload: &AccountSyncPayload) -> Result<IngestCounts, SyncTaskError> {
        let accounts = AdAccountRepository::new(self.db.clone());
        let account = accounts
            .find(payload.account_id)
            .await?
            .ok_or(SyncTaskError::AccountNotFound(payload.account_id))?;

        let connections = ConnectionRepository::new(self.db.clone());
        let credential = connections
            .latest_for_tenant(account.tenant_id)
            .await?
            .ok_or(SyncTaskError::CredentialMissing(account.tenant_id))?;

        let access_token = crypto::open_access_token(
            &self.crypto_key,
            account.tenant_id,
            &credential.access_token_ciphertext,
        )?;

        let days = payload
            .lookback_days
            .unwrap_or(self.default_lookback_days)
            .max(1);
        let (since, until) = lookback_window(Utc::now().date_naive(), days);

        let records = self
            .insights
            .fetch_daily_insights(&account.external_id, &access_token, since, until)
            .await?;

        let counts = write_daily_insights(&self.db, account.tenant_id, &records).await?;

        info!(
            account = %account.external_id,
            tenant_id = %account.tenant_id,
            since = %since,
            until = %until,
            campaigns = counts.campaigns_touched,
            facts = counts.facts_written,
            "Account sync finished"
        );

        Ok(counts)
    }
}
