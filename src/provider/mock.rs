//! Deterministic provider for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ImageProvider, ProviderOutcome, ProviderRequest};

/// Replays queued outcomes in order, then repeats the fallback outcome.
pub struct ScriptedProvider {
    queued: Mutex<VecDeque<ProviderOutcome>>,
    fallback: ProviderOutcome,
    latency: Duration,
    calls: AtomicUsize,
    last_request: Mutex<Option<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(fallback: ProviderOutcome) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn succeeding(image: Vec<u8>) -> Self {
        Self::new(ProviderOutcome::Success(image))
    }

    pub fn then(self, outcome: ProviderOutcome) -> Self {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(outcome);
        }
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn generate(&self, request: &ProviderRequest) -> ProviderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.queued
            .lock()
            .ok()
            .and_then(|mut queued| queued.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
