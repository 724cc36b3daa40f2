//! # Data Models
//!
//! This module contains all the data models used throughout the Adsync service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod ad_account;
pub mod campaign;
pub mod campaign_insight;
pub mod platform_connection;
pub mod sync_job;
pub mod tenant;

pub use ad_account::Entity as AdAccount;
pub use campaign::Entity as Campaign;
pub use campaign_insight::Entity as CampaignInsight;
pub use platform_connection::Entity as PlatformConnection;
pub use sync_job::Entity as SyncJob;
pub use tenant::Entity as Tenant;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "adsync".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
