use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use super::KeyValueBackend;
use crate::models::*;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process backend with the same contract as Redis. Used for local runs and tests.
///
/// Expiry follows the tokio clock, so paused-time tests can advance past a lease TTL.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    unavailable: Arc<AtomicBool>,
    operations: Arc<AtomicU64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the network were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of calls that reached the backend, failed ones included.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    /// Raw read that bypasses availability and counters.
    pub fn peek(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entries = self.entries.lock().ok()?;
        entries.get(key).filter(|e| e.is_live(now)).map(|e| e.value.clone())
    }

    fn begin(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LighthouseError::BackendUnavailable("memory backend switched off".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| LighthouseError::BackendUnavailable("memory backend poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let mut entries = self.begin()?;
        match entries.get(key) {
            Some(e) if e.is_live(now) => Ok(Some(e.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.begin()?;
        entries.insert(
            key.to_string(),
            Entry { value: value.to_string(), expires_at: ttl.map(|t| now + t) },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.begin()?;
        if entries.get(key).map_or(false, |e| e.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry { value: value.to_string(), expires_at: Some(now + ttl) },
        );
        Ok(true)
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.begin()?;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn set_if_absent_respects_expiry() {
        let backend = MemoryBackend::new();
        assert!(backend.set_if_absent("k", "1", Duration::from_secs(10)).await.unwrap());
        assert!(!backend.set_if_absent("k", "2", Duration::from_secs(10)).await.unwrap());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(backend.get("k").await.unwrap().is_none());
        assert!(backend.set_if_absent("k", "3", Duration::from_secs(10)).await.unwrap());
        assert_eq!(backend.peek("k").as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn unavailable_backend_errors_and_counts() {
        let backend = MemoryBackend::new();
        backend.set_unavailable(true);
        assert!(matches!(backend.get("k").await, Err(LighthouseError::BackendUnavailable(_))));
        assert_eq!(backend.operation_count(), 1);
    }
}
