//! Meta Graph API client
//!
//! Walks the cursor-paginated insights reporting endpoint for a date range
//! and returns the flattened per-(campaign, day) record list, and lists the
//! ad accounts a token can see. Pagination follows `paging.next` URLs until
//! the cursor disappears or a fixed page guard trips; the guard bounds
//! worst-case work against a misbehaving upstream rather than expressing an
//! expected page count.
//!
//! Upstream figures often arrive as strings. Coercion to numeric types
//! happens here at the wire boundary, treating non-numeric or missing
//! values as zero so a single malformed record cannot abort ingestion of
//! the rest of the window.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::MetaApiConfig;

/// Insights fields requested per campaign-day cell.
const INSIGHTS_FIELDS: &str = "campaign_id,campaign_name,spend,impressions,clicks";

/// Fields requested when listing the token's ad accounts.
const ADACCOUNT_FIELDS: &str = "id,name,account_status";

/// Errors produced by the Graph API client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success response; the upstream-reported message is preserved
    /// verbatim for the job's error field.
    #[error("Meta API error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Meta API request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid Meta API url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// One flattened per-(campaign, day) insights record.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightRecord {
    pub campaign_external_id: String,
    pub campaign_name: Option<String>,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub day: NaiveDate,
}

/// One ad account as reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountListing {
    pub external_id: String,
    pub name: Option<String>,
    pub status: Option<String>,
}

/// Seam between the sync pipeline and the Graph API transport.
#[async_trait]
pub trait InsightsSource: Send + Sync {
    /// Fetch all per-(campaign, day) records for the inclusive date range.
    async fn fetch_daily_insights(
        &self,
        account_external_id: &str,
        access_token: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<InsightRecord>, FetchError>;

    /// List the ad accounts visible to the token.
    async fn list_ad_accounts(&self, access_token: &str) -> Result<Vec<AccountListing>, FetchError>;
}

/// Graph API insights client.
#[derive(Debug, Clone)]
pub struct InsightsClient {
    http: reqwest::Client,
    api_base: String,
    api_version: String,
    page_size: u32,
    max_pages: u32,
}

impl InsightsClient {
    /// Create a client from the Graph API configuration.
    pub fn new(config: &MetaApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            page_size: config.page_size,
            max_pages: config.max_pages,
        }
    }

    fn insights_url(
        &self,
        account_external_id: &str,
        access_token: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/{}/{}/insights",
            self.api_base, self.api_version, account_external_id
        ))?;
        url.query_pairs_mut()
            .append_pair("level", "campaign")
            .append_pair("fields", INSIGHTS_FIELDS)
            .append_pair("time_increment", "1")
            .append_pair(
                "time_range",
                &format!("{{\"since\":\"{}\",\"until\":\"{}\"}}", since, until),
            )
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("access_token", access_token);
        Ok(url)
    }

    async fn get_page(&self, url: Url) -> Result<InsightsPage, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = upstream_message(&response.text().await.unwrap_or_default(), status);
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<InsightsPage>().await?)
    }
}

#[async_trait]
impl InsightsSource for InsightsClient {
    async fn fetch_daily_insights(
        &self,
        account_external_id: &str,
        access_token: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<InsightRecord>, FetchError> {
        let mut records = Vec::new();
        let mut next_url = Some(self.insights_url(account_external_id, access_token, since, until)?);
        let mut pages_fetched = 0u32;

        while let Some(url) = next_url.take() {
            if pages_fetched >= self.max_pages {
                warn!(
                    account = %account_external_id,
                    pages = pages_fetched,
                    "Insights pagination guard tripped; truncating fetch"
                );
                break;
            }

            let page = self.get_page(url).await?;
            pages_fetched += 1;

            for row in &page.data {
                if let Some(record) = row.to_record() {
                    records.push(record);
                }
            }

            next_url = match page.paging.and_then(|paging| paging.next) {
                Some(next) => Some(Url::parse(&next)?),
                None => None,
            };
        }

        debug!(
            account = %account_external_id,
            pages = pages_fetched,
            records = records.len(),
            "Insights fetch finished"
        );

        Ok(records)
    }

    async fn list_ad_accounts(&self, access_token: &str) -> Result<Vec<AccountListing>, FetchError> {
        let mut url = Url::parse(&format!(
            "{}/{}/me/adaccounts",
            self.api_base, self.api_version
        ))?;
        url.query_pairs_mut()
            .append_pair("fields", ADACCOUNT_FIELDS)
            .append_pair("access_token", access_token);

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = upstream_message(&response.text().await.unwrap_or_default(), status);
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let page = response.json::<AdAccountsPage>().await?;
        Ok(page
            .data
            .into_iter()
            .filter_map(|row| {
                let external_id = row.id?;
                Some(AccountListing {
                    external_id,
                    name: row.name,
                    status: row.account_status.map(|v| coerce_string(&v)),
                })
            })
            .collect())
    }
}

/// Extract the upstream error message from a Graph error body, falling back
/// to the HTTP status line when the body is not the documented envelope.
fn upstream_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[derive(Debug, Deserialize)]
struct InsightsPage {
    #[serde(default)]
    data: Vec<WireInsightRow>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdAccountsPage {
    #[serde(default)]
    data: Vec<WireAdAccountRow>,
}

#[derive(Debug, Deserialize)]
struct WireAdAccountRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    account_status: Option<JsonValue>,
}

/// Raw insights cell as it appears on the wire; measures are kept as JSON
/// values because the API serializes them inconsistently.
#[derive(Debug, Deserialize)]
struct WireInsightRow {
    #[serde(default)]
    campaign_id: Option<String>,
    #[serde(default)]
    campaign_name: Option<String>,
    #[serde(default)]
    spend: Option<JsonValue>,
    #[serde(default)]
    impressions: Option<JsonValue>,
    #[serde(default)]
    clicks: Option<JsonValue>,
    #[serde(default)]
    date_start: Option<String>,
}

impl WireInsightRow {
    /// Convert a wire row to a typed record; rows without a campaign id or
    /// a parseable date carry nothing a fact row could be keyed on and are
    /// dropped.
    fn to_record(&self) -> Option<InsightRecord> {
        let campaign_external_id = match self.campaign_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                warn!("Dropping insights row without campaign_id");
                return None;
            }
        };

        let day = match self
            .date_start
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        {
            Some(day) => day,
            None => {
                warn!(
                    campaign = %campaign_external_id,
                    date = ?self.date_start,
                    "Dropping insights row without parseable date_start"
                );
                return None;
            }
        };

        Some(InsightRecord {
            campaign_external_id,
            campaign_name: self.campaign_name.clone(),
            spend: coerce_f64(self.spend.as_ref()),
            impressions: coerce_i64(self.impressions.as_ref()),
            clicks: coerce_i64(self.clicks.as_ref()),
            day,
        })
    }
}

/// Render a wire value as a plain string; the API serializes account
/// statuses as either numbers or strings.
fn coerce_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Coerce a wire measure to f64; non-numeric or missing values become 0.
fn coerce_f64(value: Option<&JsonValue>) -> f64 {
    match value {
        Some(JsonValue::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(JsonValue::String(text)) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Coerce a wire measure to i64; non-numeric or missing values become 0.
fn coerce_i64(value: Option<&JsonValue>) -> i64 {
    match value {
        Some(JsonValue::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(JsonValue::String(text)) => text
            .trim()
            .parse::<i64>()
            .or_else(|_| text.trim().parse::<f64>().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}
