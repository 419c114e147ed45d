use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lease::LockName;

/// Isolation boundary for every cached value, lease and processed batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    /// Blank identifiers are treated as "no tenant".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the tenant of the current caller.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    async fn current_tenant(&self) -> Option<TenantId>;
}

/// Session lookup backed by a request header set by the auth proxy.
#[derive(Debug, Clone)]
pub struct HeaderSession {
    tenant: Option<TenantId>,
}

impl HeaderSession {
    pub fn from_headers(headers: &HeaderMap, header_name: &str) -> Self {
        let tenant = headers
            .get(header_name)
            .and_then(|v| v.to_str().ok())
            .and_then(TenantId::parse);
        Self { tenant }
    }
}

#[async_trait]
impl SessionLookup for HeaderSession {
    async fn current_tenant(&self) -> Option<TenantId> {
        self.tenant.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<TenantId>);

#[async_trait]
impl SessionLookup for StaticSession {
    async fn current_tenant(&self) -> Option<TenantId> {
        self.0.clone()
    }
}

/// Suffix segment that marks a lease key inside a tenant's namespace.
pub const LOCK_KEY_SEGMENT: &str = "lock:";

/// Builds backend keys. Every instance must derive identical keys for the same
/// tenant, so construction is pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("_lighthouse")
    }
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn data_key(&self, tenant: &TenantId, suffix: &str) -> String {
        format!("{}:{}:{}", self.prefix, tenant, suffix)
    }

    pub fn lock_key(&self, tenant: &TenantId, lock: LockName) -> String {
        format!("{}:{}:{}{}", self.prefix, tenant, LOCK_KEY_SEGMENT, lock.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn keys_are_namespaced_by_tenant() {
        let keys = KeySpace::default();
        let tenant = TenantId::parse("acme").unwrap();
        assert_eq!(keys.data_key(&tenant, "scan-summary"), "_lighthouse:acme:scan-summary");
        assert_eq!(keys.lock_key(&tenant, LockName::ScanProcessing), "_lighthouse:acme:lock:scan-processing");
        assert_eq!(
            keys.lock_key(&tenant, LockName::RecommendationsProcessing),
            "_lighthouse:acme:lock:recommendations-processing"
        );
    }

    #[test]
    fn blank_tenant_is_none() {
        assert!(TenantId::parse("   ").is_none());
        assert_eq!(TenantId::parse(" t1 ").unwrap().as_str(), "t1");
    }

    #[tokio::test]
    async fn header_session_reads_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant-id", HeaderValue::from_static("tenant-a"));
        let session = HeaderSession::from_headers(&headers, "x-tenant-id");
        assert_eq!(session.current_tenant().await, TenantId::parse("tenant-a"));

        let session = HeaderSession::from_headers(&headers, "x-other");
        assert!(session.current_tenant().await.is_none());
    }
}
