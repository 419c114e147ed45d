pub mod redis;
pub mod memory;
pub mod lighthouse_api;
pub mod llm;

pub use self::redis::*;
pub use memory::*;
pub use lighthouse_api::*;
pub use llm::*;

use async_trait::async_trait;
use std::time::Duration;

use crate::models::Result;
use crate::tenant::TenantId;

/// Remote key-value store shared by every server instance.
///
/// `set_if_absent` must be atomic on the store side: it is the only
/// synchronization primitive the leases rely on.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Returns true iff this call created the key.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    async fn delete(&self, keys: &[String]) -> Result<()>;
}

/// Source of scans completed in the last 24 hours.
#[async_trait]
pub trait ScanInventory: Send + Sync {
    async fn completed_scans_last_24h(&self, tenant: &TenantId) -> Result<Vec<String>>;
}

/// Turns a batch of scans into readable text. `None` means nothing to summarize.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, tenant: &TenantId, scan_ids: &[String]) -> Result<Option<String>>;
}

/// Produces a recommendation from a scan summary. May be slow and may return "".
#[async_trait]
pub trait RecommendationGenerator: Send + Sync {
    async fn generate_recommendation(&self, tenant: &TenantId, summary: &str) -> Result<String>;
}
