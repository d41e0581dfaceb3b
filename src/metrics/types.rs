use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a single detection tick ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TickOutcome {
    /// Frame source or locator not ready; nothing happened.
    NotReady,
    NoFace,
    Labeled,
    /// Service answered without probabilities; dropped quietly.
    Incomplete,
    /// Encoding, transport, or response failure; tick abandoned.
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickMetrics {
    pub timestamp: DateTime<Utc>,
    pub tick: u64,
    pub outcome: TickOutcome,
    pub locate_ms: Option<u64>,
    pub encode_ms: Option<u64>,
    pub payload_bytes: Option<usize>,
    pub classify_ms: Option<u64>,
    pub failure: Option<String>,
    pub total_ms: u64,
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

impl TickMetrics {
    pub fn new(tick: u64, outcome: TickOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            tick,
            outcome,
            locate_ms: None,
            encode_ms: None,
            payload_bytes: None,
            classify_ms: None,
            failure: None,
            total_ms: 0,
            cpu_percent: 0.0,
            memory_mb: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_ticks: Vec<TickMetrics>,
    pub tick_count: u64,
    pub labeled_count: u64,
    pub no_face_count: u64,
    pub not_ready_count: u64,
    pub incomplete_count: u64,
    pub failure_count: u64,
    /// Results that reached the aggregator but were not applied.
    pub discarded_count: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_ticks: Vec::new(),
            tick_count: 0,
            labeled_count: 0,
            no_face_count: 0,
            not_ready_count: 0,
            incomplete_count: 0,
            failure_count: 0,
            discarded_count: 0,
        }
    }
}
