use std::sync::Arc;
use std::time::Duration;

use crate::banner::BannerState;
use crate::batch::BatchTracker;
use crate::cache::{DataKey, TenantCache};
use crate::clients::{KeyValueBackend, RecommendationGenerator, ScanInventory, Summarizer};
use crate::config::Config;
use crate::lease::LeaseManager;
use crate::metrics;
use crate::models::*;
use crate::processing::ScanProcessor;
use crate::recommendations::RecommendationCoordinator;
use crate::tenant::{KeySpace, TenantId};

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub key_prefix: String,
    pub scan_lock_ttl: Duration,
    pub recommendation_lock_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            key_prefix: "_lighthouse".to_string(),
            scan_lock_ttl: Duration::from_secs(1200),
            recommendation_lock_ttl: Duration::from_secs(600),
        }
    }
}

impl From<&Config> for CacheSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            key_prefix: cfg.key_prefix.clone(),
            scan_lock_ttl: cfg.scan_lock_ttl(),
            recommendation_lock_ttl: cfg.recommendation_lock_ttl(),
        }
    }
}

/// External services the pipeline schedules but does not implement.
#[derive(Clone)]
pub struct Collaborators {
    pub inventory: Arc<dyn ScanInventory>,
    pub summarizer: Arc<dyn Summarizer>,
    pub generator: Arc<dyn RecommendationGenerator>,
}

/// Tenant-facing entry point. Every operation takes the resolved tenant; without one
/// it returns its neutral value and never touches the backend.
#[derive(Clone)]
pub struct LighthouseCache {
    cache: TenantCache,
    batches: BatchTracker,
    leases: LeaseManager,
    processor: ScanProcessor,
    recommendations: RecommendationCoordinator,
}

impl LighthouseCache {
    pub fn new(backend: Arc<dyn KeyValueBackend>, collaborators: Collaborators, settings: CacheSettings) -> Self {
        let keys = KeySpace::new(settings.key_prefix);
        let cache = TenantCache::new(backend.clone(), keys.clone());
        let leases = LeaseManager::new(backend, keys);
        let batches = BatchTracker::new(cache.clone());
        let recommendations = RecommendationCoordinator::new(
            cache.clone(),
            leases.clone(),
            collaborators.generator,
            settings.recommendation_lock_ttl,
        );
        let processor = ScanProcessor::new(
            cache.clone(),
            batches.clone(),
            leases.clone(),
            collaborators.inventory,
            collaborators.summarizer,
            recommendations.clone(),
            settings.scan_lock_ttl,
        );

        Self { cache, batches, leases, processor, recommendations }
    }

    pub fn leases(&self) -> &LeaseManager {
        &self.leases
    }

    pub async fn initialize(&self, tenant: Option<&TenantId>) -> InitializeOutcome {
        match tenant {
            Some(tenant) => self.processor.initialize(tenant).await,
            None => InitializeOutcome::failed(),
        }
    }

    pub async fn process_scans_with_lock(&self, tenant: Option<&TenantId>, scan_ids: &[String]) -> CacheResponse {
        match tenant {
            Some(tenant) => self.processor.process_scans_with_lock(tenant, scan_ids).await,
            None => CacheResponse::failed(),
        }
    }

    pub async fn generate_and_cache_recommendations(&self, tenant: Option<&TenantId>, summary: &str) -> CacheResponse {
        match tenant {
            Some(tenant) => self.recommendations.generate_and_cache(tenant, summary).await,
            None => CacheResponse::failed(),
        }
    }

    pub async fn is_recommendation_processing(&self, tenant: Option<&TenantId>) -> bool {
        match tenant {
            Some(tenant) => self.recommendations.is_processing(tenant).await,
            None => false,
        }
    }

    pub async fn get(&self, tenant: Option<&TenantId>, key: &str) -> Option<String> {
        let tenant = tenant?;
        self.cache.get(tenant, key).await
    }

    pub async fn set(&self, tenant: Option<&TenantId>, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        match tenant {
            Some(tenant) => self.cache.set(tenant, key, value, ttl).await,
            None => false,
        }
    }

    pub async fn get_cached_message(&self, tenant: Option<&TenantId>) -> Option<String> {
        self.get(tenant, DataKey::ScanSummary.as_str()).await
    }

    /// Unlike the plain getters, a backend failure here reports `success = false`.
    pub async fn get_recommendations(&self, tenant: Option<&TenantId>) -> CacheResponse {
        let Some(tenant) = tenant else {
            return CacheResponse::failed();
        };
        match self.cache.try_get(tenant, DataKey::Recommendations.as_str()).await {
            Ok(Some(data)) => CacheResponse::ready(data),
            Ok(None) => CacheResponse::pending(),
            Err(e) => {
                metrics::record_suppressed_backend_error();
                tracing::warn!(tenant = %tenant, error = %e, "Failed to read recommendations");
                CacheResponse::failed()
            }
        }
    }

    pub async fn get_processed_scan_ids(&self, tenant: Option<&TenantId>) -> Vec<String> {
        match tenant {
            Some(tenant) => self.batches.get_processed_ids(tenant).await,
            None => Vec::new(),
        }
    }

    pub async fn set_processed_scan_ids(&self, tenant: Option<&TenantId>, scan_ids: &[String]) -> bool {
        match tenant {
            Some(tenant) => self.batches.set_processed_ids(tenant, scan_ids).await,
            None => false,
        }
    }

    /// Banner decision for the dashboard. `configured` comes from the tenant's
    /// Lighthouse configuration, which lives outside this service.
    pub async fn banner_state(&self, tenant: Option<&TenantId>, configured: bool) -> BannerState {
        if !configured {
            return BannerState::Enable;
        }
        let recommendation = self.get_recommendations(tenant).await;
        if recommendation.success {
            if let Some(text) = recommendation.data.as_deref() {
                if !text.trim().is_empty() {
                    return BannerState::resolve(true, Some(text), false);
                }
            }
        }
        let processing = self.is_recommendation_processing(tenant).await;
        BannerState::resolve(true, None, processing)
    }

    /// Waits for background recommendation tasks; used at shutdown and in tests.
    pub async fn wait_for_background(&self) {
        self.processor.wait_for_background().await;
    }
}
