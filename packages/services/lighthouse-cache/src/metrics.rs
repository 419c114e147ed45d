use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

// Errors the cache swallows to keep callers on the degraded path
pub static SUPPRESSED_BACKEND_ERRORS: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static LEASE_RELEASE_FAILURES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

// Lease contention
pub static LEASES_ACQUIRED: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static LEASES_CONTENDED: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

// Pipeline
pub static SUMMARIES_GENERATED: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static RECOMMENDATIONS_GENERATED: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));
pub static BACKGROUND_FAILURES: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(0));

pub fn record_suppressed_backend_error() { SUPPRESSED_BACKEND_ERRORS.fetch_add(1, Ordering::Relaxed); }
pub fn record_lease_release_failure() { LEASE_RELEASE_FAILURES.fetch_add(1, Ordering::Relaxed); }
pub fn record_lease_acquired() { LEASES_ACQUIRED.fetch_add(1, Ordering::Relaxed); }
pub fn record_lease_contended() { LEASES_CONTENDED.fetch_add(1, Ordering::Relaxed); }
pub fn record_summary_generated() { SUMMARIES_GENERATED.fetch_add(1, Ordering::Relaxed); }
pub fn record_recommendation_generated() { RECOMMENDATIONS_GENERATED.fetch_add(1, Ordering::Relaxed); }
pub fn record_background_failure() { BACKGROUND_FAILURES.fetch_add(1, Ordering::Relaxed); }

pub fn export_metrics_json() -> serde_json::Value {
    serde_json::json!({
        "backend": {
            "suppressed_errors": SUPPRESSED_BACKEND_ERRORS.load(Ordering::Relaxed),
            "lease_release_failures": LEASE_RELEASE_FAILURES.load(Ordering::Relaxed)
        },
        "leases": {
            "acquired": LEASES_ACQUIRED.load(Ordering::Relaxed),
            "contended": LEASES_CONTENDED.load(Ordering::Relaxed)
        },
        "pipeline": {
            "summaries_generated": SUMMARIES_GENERATED.load(Ordering::Relaxed),
            "recommendations_generated": RECOMMENDATIONS_GENERATED.load(Ordering::Relaxed),
            "background_failures": BACKGROUND_FAILURES.load(Ordering::Relaxed)
        }
    })
}
