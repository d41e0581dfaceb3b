mod types;

pub use types::{MetricsSnapshot, SystemMetrics, TickMetrics, TickOutcome};

use std::collections::VecDeque;
use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

const MAX_RECENT_TICKS: usize = 20;

/// Observability channel for the detection pipeline.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_ticks: VecDeque<TickMetrics>,
    tick_count: u64,
    labeled_count: u64,
    no_face_count: u64,
    not_ready_count: u64,
    incomplete_count: u64,
    failure_count: u64,
    discarded_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // CPU usage is a delta between refreshes; take the baseline now
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_ticks: VecDeque::with_capacity(MAX_RECENT_TICKS),
                tick_count: 0,
                labeled_count: 0,
                no_face_count: 0,
                not_ready_count: 0,
                incomplete_count: 0,
                failure_count: 0,
                discarded_count: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_tick(&self, mut metrics: TickMetrics) {
        let mut state = self.inner.lock().await;

        let (cpu_percent, memory_mb) = state.sample_process();
        metrics.cpu_percent = cpu_percent;
        metrics.memory_mb = memory_mb;

        state.tick_count += 1;
        match metrics.outcome {
            TickOutcome::NotReady => state.not_ready_count += 1,
            TickOutcome::NoFace => state.no_face_count += 1,
            TickOutcome::Labeled => state.labeled_count += 1,
            TickOutcome::Incomplete => state.incomplete_count += 1,
            TickOutcome::Failed => state.failure_count += 1,
        }

        state.recent_ticks.push_back(metrics);
        while state.recent_ticks.len() > MAX_RECENT_TICKS {
            state.recent_ticks.pop_front();
        }
    }

    pub async fn record_discarded(&self) {
        self.inner.lock().await.discarded_count += 1;
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let (cpu_percent, memory_mb) = state.sample_process();

        MetricsSnapshot {
            system: SystemMetrics {
                cpu_percent,
                memory_mb,
            },
            recent_ticks: state.recent_ticks.iter().cloned().collect(),
            tick_count: state.tick_count,
            labeled_count: state.labeled_count,
            no_face_count: state.no_face_count,
            not_ready_count: state.not_ready_count,
            incomplete_count: state.incomplete_count,
            failure_count: state.failure_count,
            discarded_count: state.discarded_count,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_ticks.clear();
        state.tick_count = 0;
        state.labeled_count = 0;
        state.no_face_count = 0;
        state.not_ready_count = 0;
        state.incomplete_count = 0;
        state.failure_count = 0;
        state.discarded_count = 0;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl MetricsState {
    fn sample_process(&mut self) -> (f32, f64) {
        let pid = self.pid;
        self.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        match self.system.process(pid) {
            Some(process) => (
                process.cpu_usage(),
                process.memory() as f64 / 1024.0 / 1024.0,
            ),
            None => (0.0, 0.0),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_ticks_by_outcome() {
        let metrics = MetricsCollector::new();
        metrics.record_tick(TickMetrics::new(1, TickOutcome::Labeled)).await;
        metrics.record_tick(TickMetrics::new(2, TickOutcome::NoFace)).await;
        metrics.record_tick(TickMetrics::new(3, TickOutcome::Failed)).await;
        metrics.record_discarded().await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.tick_count, 3);
        assert_eq!(snapshot.labeled_count, 1);
        assert_eq!(snapshot.no_face_count, 1);
        assert_eq!(snapshot.failure_count, 1);
        assert_eq!(snapshot.discarded_count, 1);
        assert_eq!(snapshot.recent_ticks.len(), 3);
    }

    #[tokio::test]
    async fn keeps_only_recent_ticks() {
        let metrics = MetricsCollector::new();
        for tick in 1..=(MAX_RECENT_TICKS as u64 + 5) {
            metrics.record_tick(TickMetrics::new(tick, TickOutcome::NotReady)).await;
        }

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.recent_ticks.len(), MAX_RECENT_TICKS);
        assert_eq!(snapshot.recent_ticks[0].tick, 6);
        assert_eq!(snapshot.not_ready_count, MAX_RECENT_TICKS as u64 + 5);

        metrics.reset().await;
        assert_eq!(metrics.get_snapshot().await.tick_count, 0);
    }
}
