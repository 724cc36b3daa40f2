//! # Insights Read Handlers
//!
//! Read-side reporting over the daily fact table: a zero-filled daily
//! series with window totals, and per-campaign aggregates. All aggregation
//! math lives in `aggregate`; these handlers only load rows and shape the
//! response.

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::aggregate::{self, CampaignSummary, DailyPoint, FactRow};
use crate::auth::{OperatorAuth, TenantExtension};
use crate::error::ApiError;
use crate::models::{campaign, campaign_insight};
use crate::server::AppState;
use crate::sync::lookback_window;

/// Query parameters for the insights read endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct InsightsQuery {
    /// Inclusive lookback window in days; service default when omitted
    pub days: Option<u32>,
}

/// Window totals with derived ratios
#[derive(Debug, Serialize, ToSchema)]
pub struct TotalsView {
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
}

/// Response for the daily series endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyInsightsResponse {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub totals: TotalsView,
    pub series: Vec<DailyPoint>,
}

/// Response for the per-campaign summary endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct CampaignInsightsResponse {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub campaigns: Vec<CampaignSummary>,
}

/// Daily spend/impressions/clicks series for the tenant
#[utoipa::path(
    get,
    path = "/v1/insights/daily",
    params(
        ("days" = Option<u32>, Query, description = "Lookback window in days"),
        crate::auth::TenantHeader
    ),
    responses(
        (status = 200, description = "Daily series with totals", body = DailyInsightsResponse)
    ),
    tag = "insights",
    security(("bearer_auth" = []))
)]
pub async fn daily(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    TenantExtension(tenant_id): TenantExtension,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<DailyInsightsResponse>, ApiError> {
    let (since, until) = window_from_query(&state, &query);
    let rows = load_fact_rows(&state, tenant_id.0, since, until).await?;

    let totals = aggregate::window_totals(&rows);
    let series = aggregate::daily_series(&rows, since, until);

    Ok(Json(DailyInsightsResponse {
        since,
        until,
        totals: TotalsView {
            spend: totals.spend,
            impressions: totals.impressions,
            clicks: totals.clicks,
            ctr: totals.ctr(),
            cpc: totals.cpc(),
            cpm: totals.cpm(),
        },
        series,
    }))
}

/// Per-campaign aggregates for the tenant, sorted by spend
#[utoipa::path(
    get,
    path = "/v1/insights/campaigns",
    params(
        ("days" = Option<u32>, Query, description = "Lookback window in days"),
        crate::auth::TenantHeader
    ),
    responses(
        (status = 200, description = "Per-campaign aggregates", body = CampaignInsightsResponse)
    ),
    tag = "insights",
    security(("bearer_auth" = []))
)]
pub async fn campaigns(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    TenantExtension(tenant_id): TenantExtension,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<CampaignInsightsResponse>, ApiError> {
    let (since, until) = window_from_query(&state, &query);
    let rows = load_fact_rows(&state, tenant_id.0, since, until).await?;

    Ok(Json(CampaignInsightsResponse {
        since,
        until,
        campaigns: aggregate::campaign_summaries(&rows),
    }))
}

fn window_from_query(state: &AppState, query: &InsightsQuery) -> (NaiveDate, NaiveDate) {
    let days = query
        .days
        .unwrap_or(state.config.sync.default_lookback_days)
        .clamp(1, state.config.sync.max_lookback_days);
    lookback_window(Utc::now().date_naive(), days)
}

async fn load_fact_rows(
    state: &AppState,
    tenant_id: Uuid,
    since: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<FactRow>, ApiError> {
    let rows = campaign_insight::Entity::find()
        .filter(campaign_insight::Column::TenantId.eq(tenant_id))
        .filter(campaign_insight::Column::Day.gte(since))
        .filter(campaign_insight::Column::Day.lte(until))
        .find_also_related(campaign::Entity)
        .all(&state.db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(insight, campaign)| FactRow {
            campaign_external_id: campaign
                .as_ref()
                .map(|c| c.external_id.clone())
                .unwrap_or_else(|| insight.campaign_id.to_string()),
            campaign_name: campaign.and_then(|c| c.name),
            day: insight.day,
            spend: insight.spend,
            impressions: insight.impressions,
            clicks: insight.clicks,
        })
        .collect())
}
