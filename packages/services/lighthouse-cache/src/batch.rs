use std::collections::HashSet;

use crate::cache::{DataKey, TenantCache};
use crate::tenant::TenantId;

pub const SCAN_ID_SEPARATOR: char = ',';

/// True when the candidate batch differs from the processed one as a set.
/// Order and duplicates are ignored.
pub fn has_changed<A, B>(candidate: &[A], processed: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let candidate: HashSet<&str> = candidate.iter().map(|id| id.as_ref()).collect();
    let processed: HashSet<&str> = processed.iter().map(|id| id.as_ref()).collect();
    candidate != processed
}

pub fn encode_scan_ids(ids: &[String]) -> String {
    ids.join(",")
}

pub fn decode_scan_ids(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(SCAN_ID_SEPARATOR)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remembers the last batch of scans the pipeline handled for each tenant.
#[derive(Clone)]
pub struct BatchTracker {
    cache: TenantCache,
}

impl BatchTracker {
    pub fn new(cache: TenantCache) -> Self {
        Self { cache }
    }

    pub async fn get_processed_ids(&self, tenant: &TenantId) -> Vec<String> {
        self.cache
            .get_data(tenant, DataKey::ProcessedScanIds)
            .await
            .map(|raw| decode_scan_ids(&raw))
            .unwrap_or_default()
    }

    /// Refuses empty ids and ids containing the separator, since neither round-trips.
    pub async fn set_processed_ids(&self, tenant: &TenantId, ids: &[String]) -> bool {
        if let Some(bad) = ids.iter().find(|id| id.is_empty() || id.contains(SCAN_ID_SEPARATOR)) {
            tracing::warn!(tenant = %tenant, scan_id = %bad, "Scan id is empty or contains the separator; not recording batch");
            return false;
        }
        self.cache
            .set_data(tenant, DataKey::ProcessedScanIds, &encode_scan_ids(ids))
            .await
    }
}
