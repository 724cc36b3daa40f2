//! HTTP-level tests over the axum router: auth, enqueue glue, credential
//! registration with account import, and the insights read side.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use adsync::config::{AppConfig, MetaApiConfig};
use adsync::ingest::write_daily_insights;
use adsync::meta::{InsightRecord, InsightsClient, InsightsSource};
use adsync::models::platform_connection;
use adsync::models::sync_job::{Entity as SyncJob, JobStatus};
use adsync::server::{AppState, create_app};
use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::{Value, json};
use test_utils::{create_test_account, create_test_tenant, setup_test_db, test_crypto_key};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPERATOR_TOKEN: &str = "test-operator-token";

fn test_state(db: DatabaseConnection, mock_uri: &str) -> AppState {
    let config = AppConfig {
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        crypto_key: Some(vec![42u8; 32]),
        meta: MetaApiConfig {
            api_base: mock_uri.to_string(),
            ..MetaApiConfig::default()
        },
        ..AppConfig::default()
    };

    let insights: Arc<dyn InsightsSource> = Arc::new(InsightsClient::new(&config.meta));

    AppState {
        config: Arc::new(config),
        db,
        crypto_key: test_crypto_key(),
        insights,
    }
}

fn post_json(uri: &str, tenant_id: Uuid, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {OPERATOR_TOKEN}"))
        .header("X-Tenant-Id", tenant_id.to_string())
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, tenant_id: Uuid) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {OPERATOR_TOKEN}"))
        .header("X-Tenant-Id", tenant_id.to_string())
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn protected_routes_require_operator_auth() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let app = create_app(test_state(db, &mock_server.uri()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/sync/jobs")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let app = create_app(test_state(db, &mock_server.uri()));

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await?;
    assert_eq!(health.status(), StatusCode::OK);

    let root = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await?;
    assert_eq!(root.status(), StatusCode::OK);
    let info = body_json(root).await?;
    assert_eq!(info["service"], "adsync");

    Ok(())
}

#[tokio::test]
async fn enqueue_creates_a_pending_job_for_the_tenants_account() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;

    let app = create_app(test_state(db.clone(), &mock_server.uri()));

    let response = app
        .oneshot(post_json(
            "/v1/sync/jobs",
            tenant_id,
            json!({ "account_id": account_id, "lookback_days": 7 }),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await?;
    let job_id: Uuid = body["job_id"].as_str().unwrap().parse()?;

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Pending.as_str());
    assert_eq!(job.payload["account_id"], json!(account_id));
    assert_eq!(job.payload["lookback_days"], 7);

    Ok(())
}

#[tokio::test]
async fn enqueue_rejects_accounts_of_other_tenants() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let tenant_a = create_test_tenant(&db).await?;
    let tenant_b = create_test_tenant(&db).await?;
    let foreign_account = create_test_account(&db, tenant_b, "act_b").await?;

    let app = create_app(test_state(db, &mock_server.uri()));

    let response = app
        .oneshot(post_json(
            "/v1/sync/jobs",
            tenant_a,
            json!({ "account_id": foreign_account }),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn enqueue_rejects_out_of_bounds_lookback() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;

    let app = create_app(test_state(db, &mock_server.uri()));

    let response = app
        .oneshot(post_json(
            "/v1/sync/jobs",
            tenant_id,
            json!({ "account_id": account_id, "lookback_days": 0 }),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn job_status_endpoint_reflects_queue_state() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;

    let app = create_app(test_state(db.clone(), &mock_server.uri()));

    let enqueue_response = app
        .clone()
        .oneshot(post_json(
            "/v1/sync/jobs",
            tenant_id,
            json!({ "account_id": account_id }),
        ))
        .await?;
    let job_id = body_json(enqueue_response).await?["job_id"]
        .as_str()
        .unwrap()
        .to_string();

    let status_response = app
        .oneshot(get(&format!("/v1/sync/jobs/{job_id}"), tenant_id))
        .await?;
    assert_eq!(status_response.status(), StatusCode::OK);

    let body = body_json(status_response).await?;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["job_type"], "account_sync");
    assert!(body.get("result").is_none());

    Ok(())
}

#[tokio::test]
async fn connect_stores_one_credential_and_imports_accounts() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db).await?;

    Mock::given(method("GET"))
        .and(path("/v20.0/me/adaccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "act_1", "name": "Main", "account_status": 1 },
                { "id": "act_2", "name": "Secondary", "account_status": "2" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let app = create_app(test_state(db.clone(), &mock_server.uri()));

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/connections",
            tenant_id,
            json!({ "access_token": "tok-1", "platform_user_id": "u-1", "expires_in": 3600 }),
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?["imported_accounts"], 2);

    // A second registration overwrites rather than duplicates
    let response = app
        .oneshot(post_json(
            "/v1/connections",
            tenant_id,
            json!({ "access_token": "tok-2", "platform_user_id": "u-1" }),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let credentials = platform_connection::Entity::find().all(&db).await?;
    assert_eq!(credentials.len(), 1, "one credential row per tenant");

    Ok(())
}

#[tokio::test]
async fn daily_insights_return_a_zero_filled_window() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db).await?;

    // One day of data inside a 7-day window
    let today = Utc::now().date_naive();
    write_daily_insights(
        &db,
        tenant_id,
        &[InsightRecord {
            campaign_external_id: "c1".to_string(),
            campaign_name: Some("Camp".to_string()),
            spend: 10.0,
            impressions: 1000,
            clicks: 50,
            day: today,
        }],
    )
    .await?;

    let app = create_app(test_state(db, &mock_server.uri()));

    let response = app
        .oneshot(get("/v1/insights/daily?days=7", tenant_id))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    assert_eq!(body["series"].as_array().unwrap().len(), 7);
    assert_eq!(body["totals"]["spend"], 10.0);
    assert_eq!(body["totals"]["ctr"], 5.0);
    assert_eq!(body["totals"]["cpc"], 0.2);
    assert_eq!(body["totals"]["cpm"], 10.0);

    Ok(())
}

#[tokio::test]
async fn campaign_insights_aggregate_by_campaign() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;
    let tenant_id = create_test_tenant(&db).await?;

    let today = Utc::now().date_naive();
    let mk = |campaign: &str, spend: f64| InsightRecord {
        campaign_external_id: campaign.to_string(),
        campaign_name: Some(campaign.to_uppercase()),
        spend,
        impressions: 100,
        clicks: 10,
        day: today,
    };
    write_daily_insights(&db, tenant_id, &[mk("small", 1.0), mk("big", 9.0)]).await?;

    let app = create_app(test_state(db, &mock_server.uri()));

    let response = app
        .oneshot(get("/v1/insights/campaigns?days=7", tenant_id))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await?;
    let campaigns = body["campaigns"].as_array().unwrap();
    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[0]["campaign_id"], "big");
    assert_eq!(campaigns[0]["campaign_name"], "BIG");
    assert_eq!(campaigns[0]["spend"], 9.0);

    Ok(())
}
