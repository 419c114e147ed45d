use async_graphql::{Context, EmptySubscription, Object, Result as GraphQLResult, Schema};

use crate::banner::BannerView;
use crate::models::*;
use crate::service::LighthouseCache;
use crate::tenant::TenantId;

pub type LighthouseSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Tenant resolved from the session for the current request. Absent means the
/// request is anonymous and every field resolves to its neutral value.
#[derive(Debug, Clone, Default)]
pub struct RequestTenant(pub Option<TenantId>);

fn request_tenant<'ctx>(ctx: &Context<'ctx>) -> Option<&'ctx TenantId> {
    ctx.data_opt::<RequestTenant>().and_then(|t| t.0.as_ref())
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Cached summary of the tenant's latest processed scan batch
    async fn scan_summary(&self, ctx: &Context<'_>) -> GraphQLResult<Option<String>> {
        let cache = ctx.data::<LighthouseCache>()?;
        Ok(cache.get_cached_message(request_tenant(ctx)).await)
    }

    async fn recommendations(&self, ctx: &Context<'_>) -> GraphQLResult<CacheResponse> {
        let cache = ctx.data::<LighthouseCache>()?;
        Ok(cache.get_recommendations(request_tenant(ctx)).await)
    }

    /// True while another request holds the recommendation lease
    async fn recommendation_processing(&self, ctx: &Context<'_>) -> GraphQLResult<bool> {
        let cache = ctx.data::<LighthouseCache>()?;
        Ok(cache.is_recommendation_processing(request_tenant(ctx)).await)
    }

    async fn processed_scan_ids(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<String>> {
        let cache = ctx.data::<LighthouseCache>()?;
        Ok(cache.get_processed_scan_ids(request_tenant(ctx)).await)
    }

    async fn banner_state(&self, ctx: &Context<'_>, configured: bool) -> GraphQLResult<BannerView> {
        let cache = ctx.data::<LighthouseCache>()?;
        Ok(cache.banner_state(request_tenant(ctx), configured).await.into())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Processes newly completed scans if needed and returns the summary to show.
    /// Recommendation generation continues in the background.
    async fn initialize_tenant_cache(&self, ctx: &Context<'_>) -> GraphQLResult<InitializeOutcome> {
        let cache = ctx.data::<LighthouseCache>()?;
        Ok(cache.initialize(request_tenant(ctx)).await)
    }

    async fn generate_recommendations(&self, ctx: &Context<'_>, summary: String) -> GraphQLResult<CacheResponse> {
        let cache = ctx.data::<LighthouseCache>()?;
        Ok(cache.generate_and_cache_recommendations(request_tenant(ctx), &summary).await)
    }
}

pub fn build_schema(cache: LighthouseCache) -> LighthouseSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(cache)
        .finish()
}
