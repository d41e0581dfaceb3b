use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    distribution_projection, time_series_projection, AggregatorState, CurrentSnapshot,
    DistributionProjection, MergeOutcome, TimeSeriesProjection,
};
use crate::classifier::ClassificationResult;
use crate::metrics::MetricsCollector;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

enum AggregatorEvent {
    Merge {
        tick: u64,
        result: ClassificationResult,
    },
    NoFace {
        tick: u64,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the single-writer merge task.
///
/// Ticks enqueue results here in whatever order their classification
/// resolves; the merge task applies them one at a time. Readers get cloned
/// snapshots and never observe a half-applied merge.
#[derive(Clone)]
pub struct Aggregator {
    tx: mpsc::UnboundedSender<AggregatorEvent>,
    state: Arc<Mutex<AggregatorState>>,
}

impl Aggregator {
    pub fn spawn(
        state: AggregatorState,
        metrics: MetricsCollector,
        cancel_token: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(state));
        let handle = tokio::spawn(merge_loop(rx, Arc::clone(&state), metrics, cancel_token));
        (Self { tx, state }, handle)
    }

    /// Queue a classification result. Returns `false` once torn down.
    pub fn merge(&self, tick: u64, result: ClassificationResult) -> bool {
        self.send(AggregatorEvent::Merge { tick, result })
    }

    /// Queue a detection miss. Returns `false` once torn down.
    pub fn no_face(&self, tick: u64) -> bool {
        self.send(AggregatorEvent::NoFace { tick })
    }

    /// Wait until every event queued before this call has been applied.
    pub async fn flush(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if !self.send(AggregatorEvent::Flush(ack_tx)) {
            return false;
        }
        ack_rx.await.is_ok()
    }

    pub async fn state(&self) -> AggregatorState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> CurrentSnapshot {
        self.state.lock().await.snapshot().clone()
    }

    /// Both projections read under one lock, so they describe the same moment.
    pub async fn projections(&self) -> (CurrentSnapshot, TimeSeriesProjection, DistributionProjection) {
        let state = self.state.lock().await;
        (
            state.snapshot().clone(),
            time_series_projection(&state),
            distribution_projection(state.snapshot()),
        )
    }

    pub async fn is_torn_down(&self) -> bool {
        self.state.lock().await.is_torn_down()
    }

    fn send(&self, event: AggregatorEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

async fn merge_loop(
    mut rx: mpsc::UnboundedReceiver<AggregatorEvent>,
    state: Arc<Mutex<AggregatorState>>,
    metrics: MetricsCollector,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                apply(event, &state, &metrics).await;
            }
        }
    }

    rx.close();
    state.lock().await.teardown();

    // Events queued before the close were accepted by their senders; count them as discarded.
    while let Ok(event) = rx.try_recv() {
        apply(event, &state, &metrics).await;
    }
    log_info!("aggregator torn down; late results will be discarded");
}

async fn apply(event: AggregatorEvent, state: &Mutex<AggregatorState>, metrics: &MetricsCollector) {
    match event {
        AggregatorEvent::Merge { tick, result } => {
            let outcome = state.lock().await.merge(tick, result);
            match outcome {
                MergeOutcome::Applied => log_debug!("merged result of tick {}", tick),
                MergeOutcome::Stale | MergeOutcome::TornDown => {
                    log_info!("discarded result of tick {} ({:?})", tick, outcome);
                    metrics.record_discarded().await;
                }
            }
        }
        AggregatorEvent::NoFace { tick } => {
            let outcome = state.lock().await.mark_no_face(tick);
            if outcome != MergeOutcome::Applied {
                log_debug!("ignored no-face of tick {} ({:?})", tick, outcome);
            }
        }
        AggregatorEvent::Flush(ack) => {
            let _ = ack.send(());
        }
    }
}
