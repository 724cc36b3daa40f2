//! Insights ingest writer
//!
//! Two-phase idempotent persistence of a fetched record batch: campaign
//! dimension rows first, then daily fact rows keyed by the internal ids the
//! dimension phase produced. Every write is a keyed upsert, so re-running
//! the same batch converges on identical table state.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::meta::InsightRecord;
use crate::models::{campaign, campaign_insight};

/// Rows per campaign upsert statement; the mapping re-read uses the same
/// chunking so both round trips stay under backend parameter limits.
const CAMPAIGN_CHUNK: usize = 200;

/// Rows per fact upsert statement.
const FACT_CHUNK: usize = 500;

/// Counts returned to the orchestrator for the job's completion payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IngestCounts {
    /// Distinct campaigns seen in the batch
    pub campaigns_touched: u64,
    /// Fact rows written
    pub facts_written: u64,
}

/// Upsert one fetched batch for a tenant.
///
/// Phase 1 upserts the unique (campaign external id -> name) set and then
/// re-reads the external->internal id mapping; conflicting rows do not
/// return generated ids in all backends, so the second round trip is the
/// only portable way to resolve them. Phase 2 maps each record through the
/// mapping and upserts fact rows. Records whose campaign id fails to
/// resolve are dropped rather than aborting the batch.
///
/// An empty batch is a valid, non-error outcome with zero counts.
pub async fn write_daily_insights<C: ConnectionTrait>(
    db: &C,
    tenant_id: Uuid,
    records: &[InsightRecord],
) -> Result<IngestCounts, DbErr> {
    if records.is_empty() {
        return Ok(IngestCounts::default());
    }

    let now = Utc::now().fixed_offset();

    // Unique set of campaigns seen in this batch; a later record's name wins
    let mut campaign_names: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for record in records {
        let entry = campaign_names
            .entry(record.campaign_external_id.as_str())
            .or_insert(None);
        if record.campaign_name.is_some() {
            *entry = record.campaign_name.as_deref();
        }
    }

    let external_ids: Vec<&str> = campaign_names.keys().copied().collect();

    // Dimension phase: chunked upsert against (tenant_id, external_id)
    for chunk in external_ids.chunks(CAMPAIGN_CHUNK) {
        let models: Vec<campaign::ActiveModel> = chunk
            .iter()
            .map(|external_id| campaign::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                external_id: Set((*external_id).to_string()),
                name: Set(campaign_names[*external_id].map(str::to_string)),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();

        campaign::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([campaign::Column::TenantId, campaign::Column::ExternalId])
                    .update_columns([campaign::Column::Name, campaign::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    // Re-read the external -> internal mapping, chunked identically
    let mut id_mapping: HashMap<String, Uuid> = HashMap::with_capacity(external_ids.len());
    for chunk in external_ids.chunks(CAMPAIGN_CHUNK) {
        let rows = campaign::Entity::find()
            .filter(campaign::Column::TenantId.eq(tenant_id))
            .filter(campaign::Column::ExternalId.is_in(chunk.iter().copied()))
            .all(db)
            .await?;
        for row in rows {
            id_mapping.insert(row.external_id, row.id);
        }
    }

    // Fact phase: dedup (campaign, day) within the batch, last record wins,
    // so one statement never touches the same conflict key twice
    let mut facts: BTreeMap<(Uuid, NaiveDate), campaign_insight::ActiveModel> = BTreeMap::new();
    for record in records {
        let Some(&campaign_id) = id_mapping.get(&record.campaign_external_id) else {
            warn!(
                tenant_id = %tenant_id,
                campaign = %record.campaign_external_id,
                "Dropping record with unresolved campaign id"
            );
            continue;
        };

        facts.insert(
            (campaign_id, record.day),
            campaign_insight::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                campaign_id: Set(campaign_id),
                day: Set(record.day),
                spend: Set(record.spend),
                impressions: Set(record.impressions),
                clicks: Set(record.clicks),
                created_at: Set(now),
                updated_at: Set(now),
            },
        );
    }

    let fact_models: Vec<campaign_insight::ActiveModel> = facts.into_values().collect();
    let facts_written = fact_models.len() as u64;

    for chunk in fact_models.chunks(FACT_CHUNK) {
        campaign_insight::Entity::insert_many(chunk.to_vec())
            .on_conflict(
                OnConflict::columns([
                    campaign_insight::Column::TenantId,
                    campaign_insight::Column::CampaignId,
                    campaign_insight::Column::Day,
                ])
                .update_columns([
                    campaign_insight::Column::Spend,
                    campaign_insight::Column::Impressions,
                    campaign_insight::Column::Clicks,
                    campaign_insight::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    let counts = IngestCounts {
        campaigns_touched: external_ids.len() as u64,
        facts_written,
    };

    debug!(
        tenant_id = %tenant_id,
        campaigns = counts.campaigns_touched,
        facts = counts.facts_written,
        "Insights batch written"
    );

    Ok(counts)
}
