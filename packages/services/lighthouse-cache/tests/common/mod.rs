#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use lighthouse_cache_service::{
    CacheSettings, Collaborators, LighthouseCache, LighthouseError, MemoryBackend, RecommendationGenerator,
    Result, ScanInventory, Summarizer, TenantId,
};

pub fn tenant(id: &str) -> TenantId {
    TenantId::parse(id).expect("non-blank tenant")
}

pub fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Lets a test hold a fake collaborator mid-call.
#[derive(Default)]
pub struct Gate {
    pub started: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeInventory {
    pub scan_ids: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeInventory {
    pub fn set_scans(&self, scans: &[&str]) {
        *self.scan_ids.lock().unwrap() = ids(scans);
    }
}

#[async_trait]
impl ScanInventory for FakeInventory {
    async fn completed_scans_last_24h(&self, _tenant: &TenantId) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(LighthouseError::ExternalService("inventory down".into()));
        }
        Ok(self.scan_ids.lock().unwrap().clone())
    }
}

pub struct FakeSummarizer {
    pub summary: Mutex<Option<String>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<String>>>,
}

impl Default for FakeSummarizer {
    fn default() -> Self {
        Self {
            summary: Mutex::new(Some("3 critical findings across 2 scans".to_string())),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl FakeSummarizer {
    pub fn set_summary(&self, summary: Option<&str>) {
        *self.summary.lock().unwrap() = summary.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, _tenant: &TenantId, scan_ids: &[String]) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(scan_ids.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(LighthouseError::ExternalService("summarizer exploded".into()));
        }
        Ok(self.summary.lock().unwrap().clone())
    }
}

pub struct FakeGenerator {
    pub recommendation: Mutex<String>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub gate: Option<Arc<Gate>>,
}

impl FakeGenerator {
    pub fn new(recommendation: &str) -> Self {
        Self {
            recommendation: Mutex::new(recommendation.to_string()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated(recommendation: &str, gate: Arc<Gate>) -> Self {
        Self { gate: Some(gate), ..Self::new(recommendation) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecommendationGenerator for FakeGenerator {
    async fn generate_recommendation(&self, _tenant: &TenantId, _summary: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(LighthouseError::ExternalService("llm timeout".into()));
        }
        Ok(self.recommendation.lock().unwrap().clone())
    }
}

pub struct Harness {
    pub backend: MemoryBackend,
    pub inventory: Arc<FakeInventory>,
    pub summarizer: Arc<FakeSummarizer>,
    pub generator: Arc<FakeGenerator>,
    pub cache: LighthouseCache,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_generator(FakeGenerator::new("Rotate the exposed access keys"))
    }

    pub fn with_generator(generator: FakeGenerator) -> Self {
        let backend = MemoryBackend::new();
        let inventory = Arc::new(FakeInventory::default());
        let summarizer = Arc::new(FakeSummarizer::default());
        let generator = Arc::new(generator);
        let collaborators = Collaborators {
            inventory: inventory.clone(),
            summarizer: summarizer.clone(),
            generator: generator.clone(),
        };
        let cache = LighthouseCache::new(Arc::new(backend.clone()), collaborators, CacheSettings::default());
        Self { backend, inventory, summarizer, generator, cache }
    }
}
