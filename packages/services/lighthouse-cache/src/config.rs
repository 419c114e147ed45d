use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub backend: BackendKind,
    pub redis_url: String,
    pub redis_connect_timeout_ms: u64,
    // Shared by every instance; changing it partitions the lease space
    pub key_prefix: String,
    pub scan_lock_ttl_secs: u64,
    pub recommendation_lock_ttl_secs: u64,
    pub tenant_header: String,
    pub scans_api_url: String,
    pub http_timeout_ms: u64,
    pub http_user_agent: String,
    // OpenAI-compatible endpoint used for recommendations
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8091,
            backend: BackendKind::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            redis_connect_timeout_ms: 5000,
            key_prefix: "_lighthouse".to_string(),
            scan_lock_ttl_secs: 1200,
            recommendation_lock_ttl_secs: 600,
            tenant_header: "x-tenant-id".to_string(),
            scans_api_url: "http://localhost:8080/api/v1".to_string(),
            http_timeout_ms: 60000,
            http_user_agent: "lighthouse-cache-service/0.1".to_string(),
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(defaults.port);
        let backend = match get("LIGHTHOUSE_BACKEND").map(|s| s.to_lowercase()) {
            Some(ref s) if s == "memory" => BackendKind::Memory,
            _ => BackendKind::Redis,
        };
        // REDIS_URL wins; otherwise build one from the Valkey host/port pair
        let redis_url = get("REDIS_URL")
            .or_else(|| {
                get("VALKEY_HOST").map(|host| {
                    let port = get("VALKEY_PORT").unwrap_or_else(|| "6379".to_string());
                    format!("redis://{}:{}", host, port)
                })
            })
            .unwrap_or(defaults.redis_url);
        let redis_connect_timeout_ms: u64 = get("REDIS_CONNECT_TIMEOUT_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.redis_connect_timeout_ms);
        let key_prefix = get("LIGHTHOUSE_KEY_PREFIX")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.key_prefix);
        let scan_lock_ttl_secs: u64 = get("SCAN_LOCK_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.scan_lock_ttl_secs);
        let recommendation_lock_ttl_secs: u64 = get("RECOMMENDATION_LOCK_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.recommendation_lock_ttl_secs);
        let tenant_header = get("TENANT_HEADER")
            .map(|s| s.to_lowercase())
            .unwrap_or(defaults.tenant_header);
        let scans_api_url = get("SCANS_API_URL").unwrap_or(defaults.scans_api_url);
        let http_timeout_ms: u64 = get("HTTP_TIMEOUT_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.http_timeout_ms);
        let http_user_agent = get("HTTP_USER_AGENT").unwrap_or(defaults.http_user_agent);
        let llm_base_url = get("LLM_BASE_URL").unwrap_or(defaults.llm_base_url);
        let llm_api_key = get("LLM_API_KEY").filter(|s| !s.is_empty());
        let llm_model = get("LLM_MODEL").unwrap_or(defaults.llm_model);

        Self {
            port,
            backend,
            redis_url,
            redis_connect_timeout_ms,
            key_prefix,
            scan_lock_ttl_secs,
            recommendation_lock_ttl_secs,
            tenant_header,
            scans_api_url,
            http_timeout_ms,
            http_user_agent,
            llm_base_url,
            llm_api_key,
            llm_model,
        }
    }

    pub fn scan_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.scan_lock_ttl_secs)
    }

    pub fn recommendation_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.recommendation_lock_ttl_secs)
    }
}
