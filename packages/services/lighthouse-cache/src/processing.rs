use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

use crate::batch::{has_changed, BatchTracker};
use crate::cache::{DataKey, TenantCache};
use crate::clients::{ScanInventory, Summarizer};
use crate::lease::{LeaseManager, LockName};
use crate::metrics;
use crate::models::*;
use crate::recommendations::RecommendationCoordinator;
use crate::tenant::TenantId;

/// Decides whether a tenant has a new batch of completed scans and, if so, runs the
/// summary pipeline under the scan-processing lease.
#[derive(Clone)]
pub struct ScanProcessor {
    cache: TenantCache,
    batches: BatchTracker,
    leases: LeaseManager,
    inventory: Arc<dyn ScanInventory>,
    summarizer: Arc<dyn Summarizer>,
    recommendations: RecommendationCoordinator,
    lock_ttl: Duration,
    background: TaskTracker,
}

impl ScanProcessor {
    pub fn new(
        cache: TenantCache,
        batches: BatchTracker,
        leases: LeaseManager,
        inventory: Arc<dyn ScanInventory>,
        summarizer: Arc<dyn Summarizer>,
        recommendations: RecommendationCoordinator,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            batches,
            leases,
            inventory,
            summarizer,
            recommendations,
            lock_ttl,
            background: TaskTracker::new(),
        }
    }

    /// "What should this tenant see right now?" Never blocks on recommendation
    /// generation.
    pub async fn initialize(&self, tenant: &TenantId) -> InitializeOutcome {
        let candidate = match self.inventory.completed_scans_last_24h(tenant).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(tenant = %tenant, error = %e, "Failed to fetch completed scans");
                return InitializeOutcome::failed();
            }
        };

        if candidate.is_empty() {
            return self.cached_summary_outcome(tenant).await;
        }

        let processed = self.batches.get_processed_ids(tenant).await;
        if !has_changed(&candidate, &processed) {
            tracing::debug!(tenant = %tenant, scan_count = candidate.len(), "Batch already processed");
            return self.cached_summary_outcome(tenant).await;
        }

        tracing::info!(
            tenant = %tenant,
            scan_count = candidate.len(),
            previously_processed = processed.len(),
            "New completed scans found"
        );
        self.process_scans_with_lock(tenant, &candidate).await.into()
    }

    async fn cached_summary_outcome(&self, tenant: &TenantId) -> InitializeOutcome {
        let existing = self.cache.get_data(tenant, DataKey::ScanSummary).await;
        InitializeOutcome {
            success: true,
            data: existing.clone(),
            scan_summary: existing,
        }
    }

    /// Lease contention is not an error: it yields `pending()` and the caller retries
    /// later.
    pub async fn process_scans_with_lock(&self, tenant: &TenantId, scan_ids: &[String]) -> CacheResponse {
        let Some(lease) = self
            .leases
            .try_lease(tenant, LockName::ScanProcessing, self.lock_ttl)
            .await
        else {
            tracing::debug!(tenant = %tenant, "Scan processing already running elsewhere");
            return CacheResponse::pending();
        };

        let outcome = self.run_pipeline(tenant, scan_ids).await;
        lease.release().await;

        match outcome {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(tenant = %tenant, error = %e, "Error processing scans with lock");
                CacheResponse::failed()
            }
        }
    }

    async fn run_pipeline(&self, tenant: &TenantId, scan_ids: &[String]) -> Result<CacheResponse> {
        let summary = self
            .summarizer
            .summarize(tenant, scan_ids)
            .await?
            .filter(|s| !s.is_empty());

        match summary {
            Some(summary) => {
                metrics::record_summary_generated();
                self.cache.set_data(tenant, DataKey::ScanSummary, &summary).await;
                self.batches.set_processed_ids(tenant, scan_ids).await;
                self.spawn_recommendation(tenant.clone(), summary.clone());
                tracing::info!(tenant = %tenant, scan_count = scan_ids.len(), "Scan summary cached");
                Ok(CacheResponse::ready(summary))
            }
            None => {
                // Recorded anyway so an empty batch is not retried on every request
                self.batches.set_processed_ids(tenant, scan_ids).await;
                tracing::info!(tenant = %tenant, scan_count = scan_ids.len(), "Nothing to summarize for batch");
                Ok(CacheResponse::pending())
            }
        }
    }

    fn spawn_recommendation(&self, tenant: TenantId, summary: String) {
        let coordinator = self.recommendations.clone();
        self.background.spawn(async move {
            let run = AssertUnwindSafe(coordinator.generate_and_cache(&tenant, &summary)).catch_unwind();
            match run.await {
                Ok(resp) if !resp.success => {
                    metrics::record_background_failure();
                    tracing::error!(tenant = %tenant, "Background recommendation generation failed");
                }
                Ok(resp) => {
                    if resp.data.is_some() {
                        tracing::info!(tenant = %tenant, "Background recommendation generated");
                    }
                }
                Err(_) => {
                    metrics::record_background_failure();
                    tracing::error!(tenant = %tenant, "Background recommendation task panicked");
                }
            }
        });
    }

    /// Waits for every background recommendation task spawned so far.
    ///
    /// Not safe to call concurrently: one caller's reopen can leave another's wait
    /// pending. Only the shutdown path and tests call it.
    pub async fn wait_for_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }
}
