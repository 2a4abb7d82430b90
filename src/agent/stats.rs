//! Turn-level accounting counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters for one agent instance. Atomics, so reading never
/// contends with a running turn.
#[derive(Debug, Default)]
pub struct AgentStats {
    llm_calls: AtomicU64,
    latency_ms: AtomicU64,
    tokens_used: AtomicU64,
}

impl AgentStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one physical model call attempt. Retried attempts count
    /// individually.
    pub(crate) fn record_llm_attempt(&self, latency_ms: u64) {
        self.llm_calls.fetch_add(1, Ordering::Relaxed);
        self.latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub(crate) fn record_tokens(&self, tokens: u32) {
        self.tokens_used.fetch_add(u64::from(tokens), Ordering::Relaxed);
    }

    pub fn total_llm_calls(&self) -> u64 {
        self.llm_calls.load(Ordering::Relaxed)
    }

    pub fn total_latency_ms(&self) -> u64 {
        self.latency_ms.load(Ordering::Relaxed)
    }

    pub fn total_tokens_used(&self) -> u64 {
        self.tokens_used.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.llm_calls.store(0, Ordering::Relaxed);
        self.latency_ms.store(0, Ordering::Relaxed);
        self.tokens_used.store(0, Ordering::Relaxed);
    }
}
