use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::KeyValueBackend;
use crate::metrics;
use crate::models::Result;
use crate::tenant::{KeySpace, TenantId, LOCK_KEY_SEGMENT};

/// Well-known data keys under a tenant's namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKey {
    ProcessedScanIds,
    ScanSummary,
    Recommendations,
}

impl DataKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKey::ProcessedScanIds => "processed_scan_ids",
            DataKey::ScanSummary => "scan-summary",
            DataKey::Recommendations => "recommendations",
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant-namespaced string cache.
///
/// Absence and backend failure look the same to callers; failures are logged and
/// counted instead of propagated.
#[derive(Clone)]
pub struct TenantCache {
    backend: Arc<dyn KeyValueBackend>,
    keys: KeySpace,
}

impl TenantCache {
    pub fn new(backend: Arc<dyn KeyValueBackend>, keys: KeySpace) -> Self {
        Self { backend, keys }
    }

    /// Like [`TenantCache::get`] but surfaces backend failures.
    pub async fn try_get(&self, tenant: &TenantId, key: &str) -> Result<Option<String>> {
        let full_key = self.keys.data_key(tenant, key);
        let value = self.backend.get(&full_key).await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    /// Empty values read as absent.
    pub async fn get(&self, tenant: &TenantId, key: &str) -> Option<String> {
        match self.try_get(tenant, key).await {
            Ok(value) => value,
            Err(e) => {
                metrics::record_suppressed_backend_error();
                tracing::warn!(tenant = %tenant, key = key, error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Lease keys share the namespace but are owned by the lease manager; writes
    /// under `lock:` are refused.
    pub async fn set(&self, tenant: &TenantId, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        if key.starts_with(LOCK_KEY_SEGMENT) {
            tracing::warn!(tenant = %tenant, key = key, "Refusing cache write to a lease key");
            return false;
        }
        let full_key = self.keys.data_key(tenant, key);
        match self.backend.set(&full_key, value, ttl).await {
            Ok(()) => {
                tracing::debug!(tenant = %tenant, key = key, ttl = ?ttl, "Cache SET");
                true
            }
            Err(e) => {
                metrics::record_suppressed_backend_error();
                tracing::warn!(tenant = %tenant, key = key, error = %e, "Cache write failed");
                false
            }
        }
    }

    pub async fn get_data(&self, tenant: &TenantId, key: DataKey) -> Option<String> {
        self.get(tenant, key.as_str()).await
    }

    pub async fn set_data(&self, tenant: &TenantId, key: DataKey, value: &str) -> bool {
        self.set(tenant, key.as_str(), value, None).await
    }
}
