use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{http::HeaderMap, response::Html, routing::get, Extension, Json, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, EnvFilter};

use lighthouse_cache_service::clients::*;
use lighthouse_cache_service::config::{BackendKind, Config};
use lighthouse_cache_service::metrics;
use lighthouse_cache_service::schema::{build_schema, LighthouseSchema, RequestTenant};
use lighthouse_cache_service::service::{CacheSettings, Collaborators, LighthouseCache};
use lighthouse_cache_service::tenant::{HeaderSession, SessionLookup};

// How long shutdown waits for detached recommendation tasks
const BACKGROUND_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load this crate's .env regardless of current working directory, and override any pre-set envs
    let _ = dotenvy::from_filename_override(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(true)
        .init();

    let cfg = Config::from_env();
    tracing::info!(
        backend = ?cfg.backend,
        key_prefix = %cfg.key_prefix,
        scan_lock_ttl_secs = cfg.scan_lock_ttl_secs,
        recommendation_lock_ttl_secs = cfg.recommendation_lock_ttl_secs,
        "Loaded configuration"
    );

    // One backend for the process; the Redis connection opens on first use
    let backend: Arc<dyn KeyValueBackend> = match cfg.backend {
        BackendKind::Redis => Arc::new(RedisBackend::new(
            &cfg.redis_url,
            Duration::from_millis(cfg.redis_connect_timeout_ms),
        )?),
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; leases are not shared across instances");
            Arc::new(MemoryBackend::new())
        }
    };

    let scans_api = Arc::new(ScansApiClient::new(
        cfg.scans_api_url.clone(),
        cfg.http_timeout_ms,
        cfg.http_user_agent.clone(),
    )?);
    let llm = Arc::new(LlmClient::new(
        cfg.llm_base_url.clone(),
        cfg.llm_api_key.clone(),
        cfg.llm_model.clone(),
        cfg.http_timeout_ms,
    )?);
    let collaborators = Collaborators {
        inventory: scans_api.clone(),
        summarizer: scans_api,
        generator: llm,
    };

    let cache = LighthouseCache::new(backend, collaborators, CacheSettings::from(&cfg));
    let schema = build_schema(cache.clone());

    let app = Router::new()
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(Extension(schema))
        .layer(Extension(Arc::new(cfg.clone())))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(port = cfg.port, "Port is already in use. Try changing PORT env var or stop the other process.");
            }
            return Err(e.into());
        }
    };
    tracing::info!(port = cfg.port, "Lighthouse cache service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if tokio::time::timeout(BACKGROUND_DRAIN_TIMEOUT, cache.wait_for_background()).await.is_err() {
        tracing::warn!("Background recommendation tasks still running at shutdown; leases will expire by TTL");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

async fn graphql_playground() -> Html<String> {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
    ))
}

async fn graphql_handler(
    Extension(schema): Extension<LighthouseSchema>,
    Extension(cfg): Extension<Arc<Config>>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let session = HeaderSession::from_headers(&headers, &cfg.tenant_header);
    let tenant = session.current_tenant().await;
    schema
        .execute(req.into_inner().data(RequestTenant(tenant)))
        .await
        .into()
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_handler() -> Json<serde_json::Value> {
    Json(metrics::export_metrics_json())
}
