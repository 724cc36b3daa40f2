//! End-to-end sync pipeline tests: enqueue -> claim -> fetch (stubbed Graph
//! API) -> ingest -> queue outcome, driven through the worker's tick.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use adsync::config::{AppConfig, MetaApiConfig};
use adsync::meta::{InsightsClient, InsightsSource};
use adsync::models::sync_job::{
    AccountSyncPayload, Entity as SyncJob, JOB_TYPE_ACCOUNT_SYNC, JobStatus,
};
use adsync::models::{campaign, campaign_insight};
use adsync::repositories::JobQueue;
use adsync::worker::Worker;
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;
use test_utils::{create_test_account, create_test_tenant, setup_test_db, store_test_credential, test_crypto_key};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_app_config(mock_uri: &str) -> AppConfig {
    AppConfig {
        meta: MetaApiConfig {
            api_base: mock_uri.to_string(),
            api_version: "v20.0".to_string(),
            page_size: 100,
            max_pages: 50,
        },
        ..AppConfig::default()
    }
}

fn build_worker(db: &DatabaseConnection, config: &AppConfig) -> Worker {
    let insights: Arc<dyn InsightsSource> = Arc::new(InsightsClient::new(&config.meta));
    Worker::new(db.clone(), insights, test_crypto_key(), config)
}

async fn enqueue_sync(
    db: &DatabaseConnection,
    account_id: Uuid,
    lookback_days: Option<u32>,
) -> Result<Uuid> {
    let queue = JobQueue::new(db.clone());
    let payload = AccountSyncPayload {
        account_id,
        lookback_days,
    };
    let job = queue
        .enqueue(JOB_TYPE_ACCOUNT_SYNC, serde_json::to_value(&payload)?)
        .await?;
    Ok(job.id)
}

#[tokio::test]
async fn single_record_sync_writes_one_campaign_and_one_fact() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;
    store_test_credential(&db, tenant_id, "token-1").await?;

    Mock::given(method("GET"))
        .and(path("/v20.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "campaign_id": "c1",
                "campaign_name": "Camp",
                "spend": "10.50",
                "impressions": "100",
                "clicks": "5",
                "date_start": "2024-01-01"
            }],
            "paging": {}
        })))
        .mount(&mock_server)
        .await;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    let job_id = enqueue_sync(&db, account_id, Some(1)).await?;
    assert!(worker.tick().await?, "job claimed and processed");

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Done.as_str());
    let result = job.result.expect("result recorded");
    assert_eq!(result["campaigns_touched"], 1);
    assert_eq!(result["facts_written"], 1);

    let campaigns = campaign::Entity::find().all(&db).await?;
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].external_id, "c1");
    assert_eq!(campaigns[0].name.as_deref(), Some("Camp"));

    let facts = campaign_insight::Entity::find().all(&db).await?;
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].spend, 10.5);
    assert_eq!(facts[0].impressions, 100);
    assert_eq!(facts[0].clicks, 5);

    Ok(())
}

#[tokio::test]
async fn empty_fetch_completes_with_zero_counts() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;
    store_test_credential(&db, tenant_id, "token-1").await?;

    Mock::given(method("GET"))
        .and(path("/v20.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&mock_server)
        .await;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    let job_id = enqueue_sync(&db, account_id, Some(7)).await?;
    worker.tick().await?;

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Done.as_str());
    let result = job.result.expect("result recorded");
    assert_eq!(result["campaigns_touched"], 0);
    assert_eq!(result["facts_written"], 0);
    assert!(job.error.is_none());

    Ok(())
}

#[tokio::test]
async fn paginated_fetch_flattens_all_pages() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;
    store_test_credential(&db, tenant_id, "token-1").await?;

    let next_url = format!("{}/v20.0/act_1/insights?after=page2", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/v20.0/act_1/insights"))
        .and(query_param_is_missing("after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "campaign_id": "c1",
                "campaign_name": "Camp One",
                "spend": "1.00",
                "impressions": "10",
                "clicks": "1",
                "date_start": "2024-01-01"
            }],
            "paging": { "next": next_url }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v20.0/act_1/insights"))
        .and(query_param("after", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "campaign_id": "c2",
                "campaign_name": "Camp Two",
                "spend": "2.00",
                "impressions": "20",
                "clicks": "2",
                "date_start": "2024-01-01"
            }],
            "paging": {}
        })))
        .mount(&mock_server)
        .await;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    let job_id = enqueue_sync(&db, account_id, Some(1)).await?;
    worker.tick().await?;

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Done.as_str());
    let result = job.result.expect("result recorded");
    assert_eq!(result["campaigns_touched"], 2);
    assert_eq!(result["facts_written"], 2);

    Ok(())
}

#[tokio::test]
async fn malformed_measures_coerce_to_zero_without_failing_the_batch() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;
    store_test_credential(&db, tenant_id, "token-1").await?;

    Mock::given(method("GET"))
        .and(path("/v20.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "campaign_id": "bad",
                    "spend": "not-a-number",
                    "impressions": "100",
                    "clicks": "5",
                    "date_start": "2024-01-01"
                },
                {
                    "campaign_id": "good",
                    "spend": "4.00",
                    "impressions": "200",
                    "clicks": "20",
                    "date_start": "2024-01-01"
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    let job_id = enqueue_sync(&db, account_id, Some(1)).await?;
    worker.tick().await?;

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Done.as_str());
    assert_eq!(job.result.expect("result")["facts_written"], 2);

    let facts = campaign_insight::Entity::find().all(&db).await?;
    let total_spend: f64 = facts.iter().map(|f| f.spend).sum();
    assert_eq!(total_spend, 4.0, "malformed spend became 0, good row intact");

    Ok(())
}

#[tokio::test]
async fn upstream_error_fails_the_job_with_the_platform_message() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;
    store_test_credential(&db, tenant_id, "token-1").await?;

    Mock::given(method("GET"))
        .and(path("/v20.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid OAuth access token" }
        })))
        .mount(&mock_server)
        .await;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    let job_id = enqueue_sync(&db, account_id, Some(1)).await?;
    worker.tick().await?;

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Error.as_str());
    let error = job.error.expect("error recorded");
    let message = error["message"].as_str().unwrap();
    assert!(message.contains("Invalid OAuth access token"));

    // Nothing was written for the failed window
    assert_eq!(campaign_insight::Entity::find().all(&db).await?.len(), 0);

    Ok(())
}

#[tokio::test]
async fn missing_account_is_terminal_for_the_job_only() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    let job_id = enqueue_sync(&db, Uuid::new_v4(), None).await?;
    worker.tick().await?;

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Error.as_str());
    let message = job.error.expect("error")["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(message.contains("not found"));

    // The loop stays healthy afterwards
    assert!(!worker.tick().await?, "queue drained");

    Ok(())
}

#[tokio::test]
async fn missing_credential_asks_for_a_platform_connection() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;
    // No credential stored for this tenant

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    let job_id = enqueue_sync(&db, account_id, None).await?;
    worker.tick().await?;

    let job = SyncJob::find_by_id(job_id).one(&db).await?.unwrap();
    assert_eq!(job.status, JobStatus::Error.as_str());
    let message = job.error.expect("error")["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(message.contains("connect the ads platform first"));

    Ok(())
}

#[tokio::test]
async fn unknown_job_type_is_failed_without_crashing_the_worker() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let queue = JobQueue::new(db.clone());
    let job = queue.enqueue("mystery", json!({})).await?;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    assert!(worker.tick().await?);

    let failed = SyncJob::find_by_id(job.id).one(&db).await?.unwrap();
    assert_eq!(failed.status, JobStatus::Error.as_str());
    let message = failed.error.expect("error")["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(message.contains("unknown job type: mystery"));

    // Subsequent polls keep working
    assert!(!worker.tick().await?);

    Ok(())
}

#[tokio::test]
async fn rerunning_the_same_window_converges() -> Result<()> {
    let mock_server = MockServer::start().await;
    let db = setup_test_db().await?;

    let tenant_id = create_test_tenant(&db).await?;
    let account_id = create_test_account(&db, tenant_id, "act_1").await?;
    store_test_credential(&db, tenant_id, "token-1").await?;

    Mock::given(method("GET"))
        .and(path("/v20.0/act_1/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "campaign_id": "c1",
                "campaign_name": "Camp",
                "spend": "10.50",
                "impressions": "100",
                "clicks": "5",
                "date_start": "2024-01-01"
            }]
        })))
        .mount(&mock_server)
        .await;

    let config = test_app_config(&mock_server.uri());
    let worker = build_worker(&db, &config);

    enqueue_sync(&db, account_id, Some(1)).await?;
    worker.tick().await?;
    enqueue_sync(&db, account_id, Some(1)).await?;
    worker.tick().await?;

    // A fresh job for the same account and window is safe and convergent
    assert_eq!(campaign::Entity::find().all(&db).await?.len(), 1);
    let facts = campaign_insight::Entity::find().all(&db).await?;
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].spend, 10.5);

    Ok(())
}
