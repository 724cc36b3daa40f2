//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Adsync
//! HTTP surface: shared state, router construction, request trace context,
//! and OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRef, Request},
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::auth;
use crate::config::AppConfig;
use crate::crypto::CryptoKey;
use crate::handlers;
use crate::meta::InsightsSource;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub crypto_key: CryptoKey,
    pub insights: Arc<dyn InsightsSource>,
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Middleware that attaches a correlation id to every request and exposes
/// it through the task-local trace context for error responses.
pub async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = format!("req-{}", &Uuid::new_v4().to_string()[..8]);
    let context = TraceContext {
        trace_id: trace_id.clone(),
    };

    request.extensions_mut().insert(context.clone());
    telemetry::with_trace_context(context, next.run(request)).await
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/connections", post(handlers::connections::connect))
        .route("/v1/sync/jobs", post(handlers::sync_jobs::enqueue))
        .route("/v1/sync/jobs/{job_id}", get(handlers::sync_jobs::status))
        .route("/v1/insights/daily", get(handlers::insights::daily))
        .route("/v1/insights/campaigns", get(handlers::insights::campaigns))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(trace_context_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given state
pub async fn run_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::clone(&state.config);
    let app = create_app(state);

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::connections::connect,
        crate::handlers::sync_jobs::enqueue,
        crate::handlers::sync_jobs::status,
        crate::handlers::insights::daily,
        crate::handlers::insights::campaigns,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::sync_job::JobStatus,
            crate::models::sync_job::AccountSyncPayload,
            crate::models::sync_job::SyncJobResult,
            crate::handlers::connections::ConnectRequest,
            crate::handlers::connections::ConnectResponse,
            crate::handlers::sync_jobs::EnqueueSyncRequest,
            crate::handlers::sync_jobs::EnqueueSyncResponse,
            crate::handlers::sync_jobs::JobInfo,
            crate::handlers::insights::TotalsView,
            crate::handlers::insights::DailyInsightsResponse,
            crate::handlers::insights::CampaignInsightsResponse,
            crate::aggregate::DailyPoint,
            crate::aggregate::CampaignSummary,
        )
    ),
    info(
        title = "Adsync API",
        description = "Ads performance ingestion and reporting service",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
