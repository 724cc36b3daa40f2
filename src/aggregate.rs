//! Insight aggregation
//!
//! Pure aggregation over daily fact rows: window totals with derived
//! ratios, a zero-filled daily series, and per-campaign summaries. No I/O;
//! the read-side handlers map entity rows into the input structs and feed
//! them through here.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

/// Input row for aggregation: one (campaign, day) measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub campaign_external_id: String,
    pub campaign_name: Option<String>,
    pub day: NaiveDate,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
}

/// Accumulated measures with zero-denominator-safe derived ratios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct MeasureTotals {
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
}

impl MeasureTotals {
    /// Fold one row's measures into the totals.
    pub fn absorb(&mut self, spend: f64, impressions: i64, clicks: i64) {
        self.spend += spend;
        self.impressions += impressions;
        self.clicks += clicks;
    }

    /// Click-through rate in percent; 0 when there are no impressions.
    pub fn ctr(&self) -> f64 {
        if self.impressions > 0 {
            self.clicks as f64 / self.impressions as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Cost per click; 0 when there are no clicks.
    pub fn cpc(&self) -> f64 {
        if self.clicks > 0 {
            self.spend / self.clicks as f64
        } else {
            0.0
        }
    }

    /// Cost per mille impressions; 0 when there are no impressions.
    pub fn cpm(&self) -> f64 {
        if self.impressions > 0 {
            self.spend / self.impressions as f64 * 1000.0
        } else {
            0.0
        }
    }
}

/// One point of the daily series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyPoint {
    pub day: NaiveDate,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
}

/// Aggregate rows into a per-day series over the inclusive window, filling
/// days without data with zero measures so charts always see the full
/// window.
pub fn daily_series(rows: &[FactRow], since: NaiveDate, until: NaiveDate) -> Vec<DailyPoint> {
    let mut by_day: BTreeMap<NaiveDate, MeasureTotals> = BTreeMap::new();

    for row in rows {
        by_day
            .entry(row.day)
            .or_default()
            .absorb(row.spend, row.impressions, row.clicks);
    }

    let mut series = Vec::new();
    let mut day = since;
    while day <= until {
        let totals = by_day.get(&day).copied().unwrap_or_default();
        series.push(DailyPoint {
            day,
            spend: totals.spend,
            impressions: totals.impressions,
            clicks: totals.clicks,
        });
        day += Duration::days(1);
    }

    series
}

/// Per-campaign aggregate with derived ratios.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
}

/// Aggregate rows by campaign, sorted by spend descending. The first
/// non-null name seen for a campaign is carried onto the summary.
pub fn campaign_summaries(rows: &[FactRow]) -> Vec<CampaignSummary> {
    let mut by_campaign: BTreeMap<&str, (Option<&str>, MeasureTotals)> = BTreeMap::new();

    for row in rows {
        let entry = by_campaign
            .entry(row.campaign_external_id.as_str())
            .or_insert((None, MeasureTotals::default()));
        if entry.0.is_none() {
            entry.0 = row.campaign_name.as_deref();
        }
        entry.1.absorb(row.spend, row.impressions, row.clicks);
    }

    let mut summaries: Vec<CampaignSummary> = by_campaign
        .into_iter()
        .map(|(campaign_id, (name, totals))| CampaignSummary {
            campaign_id: campaign_id.to_string(),
            campaign_name: name.map(str::to_string),
            spend: totals.spend,
            impressions: totals.impressions,
            clicks: totals.clicks,
            ctr: totals.ctr(),
            cpc: totals.cpc(),
            cpm: totals.cpm(),
        })
        .collect();

    summaries.sort_by(|a, b| b.spend.partial_cmp(&a.spend).unwrap_or(std::cmp::Ordering::Equal));
    summaries
}

/// Total the whole window.
pub fn window_totals(rows: &[FactRow]) -> MeasureTotals {
    let mut totals = MeasureTotals::default();
    for row in rows {
        totals.absorb(row.spend, row.impressions, row.clicks);
    }
    totals
}
