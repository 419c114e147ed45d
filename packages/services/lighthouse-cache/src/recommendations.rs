use std::sync::Arc;
use std::time::Duration;

use crate::cache::{DataKey, TenantCache};
use crate::clients::RecommendationGenerator;
use crate::lease::{LeaseManager, LockName};
use crate::metrics;
use crate::models::*;
use crate::tenant::TenantId;

/// Lease-guarded, double-checked generation of the tenant's recommendation.
///
/// Every writer of the recommendations key must go through
/// [`RecommendationCoordinator::generate_and_cache`]; the lease only deduplicates
/// generation among callers that take it.
#[derive(Clone)]
pub struct RecommendationCoordinator {
    cache: TenantCache,
    leases: LeaseManager,
    generator: Arc<dyn RecommendationGenerator>,
    lock_ttl: Duration,
}

impl RecommendationCoordinator {
    pub fn new(
        cache: TenantCache,
        leases: LeaseManager,
        generator: Arc<dyn RecommendationGenerator>,
        lock_ttl: Duration,
    ) -> Self {
        Self { cache, leases, generator, lock_ttl }
    }

    pub async fn generate_and_cache(&self, tenant: &TenantId, summary: &str) -> CacheResponse {
        if let Some(existing) = self.cache.get_data(tenant, DataKey::Recommendations).await {
            return CacheResponse::ready(existing);
        }

        let Some(lease) = self
            .leases
            .try_lease(tenant, LockName::RecommendationsProcessing, self.lock_ttl)
            .await
        else {
            return CacheResponse::pending();
        };

        let outcome = self.generate_locked(tenant, summary).await;
        lease.release().await;

        match outcome {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(tenant = %tenant, error = %e, "Recommendation generation failed");
                CacheResponse::failed()
            }
        }
    }

    async fn generate_locked(&self, tenant: &TenantId, summary: &str) -> Result<CacheResponse> {
        // Another holder may have finished between the first read and our acquisition
        if let Some(existing) = self.cache.get_data(tenant, DataKey::Recommendations).await {
            return Ok(CacheResponse::ready(existing));
        }

        let recommendation = self.generator.generate_recommendation(tenant, summary).await?;
        metrics::record_recommendation_generated();

        // Blank output is returned but not cached, so "none yet" stays distinguishable
        if !recommendation.trim().is_empty() {
            self.cache
                .set_data(tenant, DataKey::Recommendations, &recommendation)
                .await;
        } else {
            tracing::info!(tenant = %tenant, "Generator returned an empty recommendation; not caching");
        }

        Ok(CacheResponse::ready(recommendation))
    }

    pub async fn is_processing(&self, tenant: &TenantId) -> bool {
        self.leases.is_held(tenant, LockName::RecommendationsProcessing).await
    }
}
