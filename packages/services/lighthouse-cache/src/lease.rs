use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::KeyValueBackend;
use crate::metrics;
use crate::tenant::{KeySpace, TenantId};

/// Named mutual-exclusion scopes. At most one live lease exists per tenant and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockName {
    ScanProcessing,
    RecommendationsProcessing,
}

impl LockName {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockName::ScanProcessing => "scan-processing",
            LockName::RecommendationsProcessing => "recommendations-processing",
        }
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TTL-bounded leases stored as keys in the shared backend.
///
/// The key's presence is the lease. Its value (acquisition time in epoch millis) is
/// diagnostic only; the backend's expiry is authoritative, so a holder that stalls
/// past its TTL silently loses exclusivity.
#[derive(Clone)]
pub struct LeaseManager {
    backend: Arc<dyn KeyValueBackend>,
    keys: KeySpace,
}

impl LeaseManager {
    pub fn new(backend: Arc<dyn KeyValueBackend>, keys: KeySpace) -> Self {
        Self { backend, keys }
    }

    /// Non-blocking. Fails closed: a backend error never counts as acquired.
    pub async fn acquire(&self, tenant: &TenantId, lock: LockName, ttl: Duration) -> bool {
        let key = self.keys.lock_key(tenant, lock);
        let stamp = chrono::Utc::now().timestamp_millis().to_string();

        match self.backend.set_if_absent(&key, &stamp, ttl).await {
            Ok(true) => {
                metrics::record_lease_acquired();
                tracing::debug!(tenant = %tenant, lock = %lock, ttl_secs = ttl.as_secs(), "Lease acquired");
                true
            }
            Ok(false) => {
                metrics::record_lease_contended();
                tracing::debug!(tenant = %tenant, lock = %lock, "Lease held elsewhere");
                false
            }
            Err(e) => {
                metrics::record_suppressed_backend_error();
                tracing::warn!(tenant = %tenant, lock = %lock, error = %e, "Lease acquisition failed; treating as not acquired");
                false
            }
        }
    }

    /// Unconditional delete. Failures are swallowed; the TTL reclaims the lease.
    pub async fn release(&self, tenant: &TenantId, lock: LockName) {
        let key = self.keys.lock_key(tenant, lock);
        if let Err(e) = self.backend.delete(&[key]).await {
            metrics::record_lease_release_failure();
            tracing::warn!(tenant = %tenant, lock = %lock, error = %e, "Lease release failed; relying on TTL");
        } else {
            tracing::debug!(tenant = %tenant, lock = %lock, "Lease released");
        }
    }

    /// "Work in progress" signal for presentation. Not a mutual-exclusion check.
    pub async fn is_held(&self, tenant: &TenantId, lock: LockName) -> bool {
        let key = self.keys.lock_key(tenant, lock);
        match self.backend.get(&key).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                metrics::record_suppressed_backend_error();
                tracing::warn!(tenant = %tenant, lock = %lock, error = %e, "Lease lookup failed");
                false
            }
        }
    }

    /// Scoped acquisition. The returned guard should be released with
    /// [`LeaseGuard::release`]; if it is dropped instead (panic or cancellation),
    /// release is scheduled on the current runtime.
    pub async fn try_lease(&self, tenant: &TenantId, lock: LockName, ttl: Duration) -> Option<LeaseGuard> {
        if self.acquire(tenant, lock, ttl).await {
            Some(LeaseGuard {
                manager: self.clone(),
                tenant: tenant.clone(),
                lock,
                released: false,
            })
        } else {
            None
        }
    }
}

#[must_use = "dropping the guard releases the lease in the background"]
pub struct LeaseGuard {
    manager: LeaseManager,
    tenant: TenantId,
    lock: LockName,
    released: bool,
}

impl LeaseGuard {
    pub async fn release(mut self) {
        self.released = true;
        self.manager.release(&self.tenant, self.lock).await;
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let manager = self.manager.clone();
        let tenant = self.tenant.clone();
        let lock = self.lock;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(tenant = %tenant, lock = %lock, "Lease guard dropped without release; releasing in background");
                handle.spawn(async move {
                    manager.release(&tenant, lock).await;
                });
            }
            Err(_) => {
                tracing::warn!(tenant = %tenant, lock = %lock, "No runtime to release lease; it will expire by TTL");
            }
        }
    }
}
