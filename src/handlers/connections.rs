//! # Platform Connection Handlers
//!
//! Registers an ads-platform credential for a tenant and imports the ad
//! accounts the token can see. The OAuth dance that produces the token
//! happens elsewhere; this endpoint only receives its result.

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{Duration, Utc};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{OperatorAuth, TenantExtension};
use crate::crypto;
use crate::error::{ApiError, not_found, validation_error};
use crate::meta::{FetchError, InsightsSource};
use crate::models::tenant;
use crate::repositories::{AdAccountRepository, ConnectionRepository, ad_account::ImportedAccount};
use crate::server::AppState;

const PLATFORM_META: &str = "meta";

/// Request body for registering a platform credential
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectRequest {
    /// Long-lived access token obtained from the platform
    pub access_token: String,
    /// Platform-side user id the token belongs to
    pub platform_user_id: String,
    /// Token lifetime in seconds, when the platform reports one
    pub expires_in: Option<u64>,
}

/// Response for a successful credential registration
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectResponse {
    /// Number of ad accounts imported for the tenant
    pub imported_accounts: u64,
}

/// Register the tenant's platform credential and import its ad accounts
#[utoipa::path(
    post,
    path = "/v1/connections",
    request_body = ConnectRequest,
    params(crate::auth::TenantHeader),
    responses(
        (status = 200, description = "Credential stored, accounts imported", body = ConnectResponse),
        (status = 400, description = "Missing token or user id"),
        (status = 404, description = "Tenant not found"),
        (status = 502, description = "Platform rejected the account listing")
    ),
    tag = "connections",
    security(("bearer_auth" = []))
)]
pub async fn connect(
    State(state): State<AppState>,
    _auth: OperatorAuth,
    TenantExtension(tenant_id): TenantExtension,
    Json(body): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ApiError> {
    if body.access_token.is_empty() || body.platform_user_id.is_empty() {
        return Err(validation_error(
            "Missing platform token or user id",
            serde_json::json!({
                "access_token": "required",
                "platform_user_id": "required"
            }),
        ));
    }

    let tenant_id = tenant_id.0;
    tenant::Entity::find_by_id(tenant_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("Tenant not found"))?;

    let ciphertext = crypto::seal_access_token(&state.crypto_key, tenant_id, &body.access_token)
        .map_err(|err| anyhow::anyhow!("failed to seal access token: {err}"))?;

    let expires_at = body
        .expires_in
        .filter(|seconds| *seconds > 0)
        .map(|seconds| Utc::now() + Duration::seconds(seconds as i64));

    let connections = ConnectionRepository::new(state.db.clone());
    connections
        .upsert(tenant_id, &body.platform_user_id, ciphertext, expires_at)
        .await?;

    // Import the accounts visible to the freshly stored token
    let listings = state
        .insights
        .list_ad_accounts(&body.access_token)
        .await
        .map_err(map_fetch_error)?;

    let imported: Vec<ImportedAccount> = listings
        .into_iter()
        .map(|listing| ImportedAccount {
            external_id: listing.external_id,
            name: listing.name,
            status: listing.status,
        })
        .collect();

    let accounts = AdAccountRepository::new(state.db.clone());
    let imported_accounts = accounts.import(tenant_id, PLATFORM_META, &imported).await?;

    Ok(Json(ConnectResponse { imported_accounts }))
}

fn map_fetch_error(err: FetchError) -> ApiError {
    match err {
        FetchError::Upstream { status, message } => ApiError::new(
            StatusCode::BAD_GATEWAY,
            "PROVIDER_ERROR",
            &format!("Platform returned status {}: {}", status, message),
        ),
        other => {
            tracing::error!(error = %other, "Account listing failed");
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "PROVIDER_ERROR",
                "Failed to reach the ads platform",
            )
        }
    }
}
