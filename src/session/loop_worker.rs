use std::sync::Arc;
use chrono::Utc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;
use crate::chart::{ChartFrame, ChartSink};
use crate::classifier::Classifier;
use crate::vision::{FaceLocator, FrameSource};

use super::clock::SessionClock;
use super::pipeline::Pipeline;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Start one pipeline tick per `interval`. Ticks are not awaited, so a slow
/// classification never delays the next one.
pub async fn detection_loop<S, L, C>(
    pipeline: Pipeline<S, L, C>,
    interval: Duration,
    cancel_token: CancellationToken,
) where
    S: FrameSource,
    L: FaceLocator,
    C: Classifier,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut next_tick: u64 = 1;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("detection loop shutting down after {} ticks", next_tick - 1);
                break;
            }
            _ = ticker.tick() => {
                log_debug!("starting detection tick {}", next_tick);
                drop(pipeline.spawn_tick(next_tick));
                next_tick += 1;
            }
        }
    }
}

/// Advance the session clock once per `interval`.
pub async fn clock_loop(clock: SessionClock, interval: Duration, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("session clock stopped at {}s", clock.elapsed_secs());
                break;
            }
            _ = ticker.tick() => {
                clock.tick();
            }
        }
    }
}

/// Hand fresh projections to `sink` once per `interval`, starting immediately.
pub async fn render_loop<K: ChartSink>(
    aggregator: Aggregator,
    clock: SessionClock,
    sink: Arc<K>,
    session_id: String,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("render loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let (snapshot, time_series, distribution) = aggregator.projections().await;
                let frame = ChartFrame {
                    rendered_at: Utc::now(),
                    session_id: session_id.clone(),
                    elapsed_secs: clock.elapsed_secs(),
                    status: snapshot.status,
                    headline: snapshot.headline(),
                    time_series,
                    distribution,
                };
                sink.render(&frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{AggregatorState, SnapshotStatus};
    use crate::classifier::{ClassificationResult, ClassifyError, FacePayload};
    use crate::metrics::MetricsCollector;
    use crate::overlay::OverlayRenderer;
    use crate::vision::{Frame, Region, StillFrameSource};
    use image::RgbImage;
    use std::future::Future;
    use std::sync::Mutex;

    struct WarmingLocator;

    impl FaceLocator for WarmingLocator {
        fn is_ready(&self) -> bool {
            false
        }

        fn locate(&self, _frame: &Frame) -> Option<Region> {
            None
        }
    }

    struct OfflineClassifier;

    impl Classifier for OfflineClassifier {
        fn classify(
            &self,
            _payload: FacePayload,
        ) -> impl Future<Output = Result<ClassificationResult, ClassifyError>> + Send {
            async { Err(ClassifyError::Status(503)) }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<ChartFrame>>,
    }

    impl ChartSink for RecordingSink {
        fn render(&self, frame: &ChartFrame) {
            self.frames.lock().unwrap().push(frame.clone());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clock_counts_whole_seconds_until_cancelled() {
        let clock = SessionClock::new();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(clock_loop(clock.clone(), Duration::from_secs(1), cancel_token.clone()));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(clock.elapsed_secs(), 3);

        cancel_token.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(clock.elapsed_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn detection_loop_starts_one_tick_per_interval() {
        let metrics = MetricsCollector::new();
        let cancel_token = CancellationToken::new();
        let (aggregator, merge_task) =
            Aggregator::spawn(AggregatorState::new(30, false), metrics.clone(), cancel_token.clone());
        let pipeline = Pipeline::new(
            Arc::new(StillFrameSource::from_images(vec![RgbImage::new(8, 8)])),
            Arc::new(WarmingLocator),
            Arc::new(OfflineClassifier),
            aggregator.clone(),
            OverlayRenderer::new(),
            metrics.clone(),
            Duration::from_secs(10),
        );
        let handle = tokio::spawn(detection_loop(pipeline, Duration::from_secs(1), cancel_token.clone()));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        cancel_token.cancel();
        handle.await.unwrap();
        merge_task.await.unwrap();

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.tick_count, 3);
        assert_eq!(snapshot.not_ready_count, 3);
        let mut ticks: Vec<u64> = snapshot.recent_ticks.iter().map(|t| t.tick).collect();
        ticks.sort_unstable();
        assert_eq!(ticks, vec![1, 2, 3]);
        assert_eq!(aggregator.snapshot().await.status, SnapshotStatus::Detecting);
    }

    #[tokio::test(start_paused = true)]
    async fn render_loop_publishes_projections() {
        let cancel_token = CancellationToken::new();
        let (aggregator, _merge_task) = Aggregator::spawn(
            AggregatorState::new(30, false),
            MetricsCollector::new(),
            cancel_token.clone(),
        );
        let clock = SessionClock::new();
        clock.tick();
        let sink = Arc::new(RecordingSink::default());
        let handle = tokio::spawn(render_loop(
            aggregator,
            clock,
            Arc::clone(&sink),
            "session-1".into(),
            Duration::from_secs(1),
            cancel_token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        cancel_token.cancel();
        handle.await.unwrap();

        let frames = sink.frames.lock().unwrap();
        assert_eq!(frames.len(), 3);
        let frame = &frames[0];
        assert_eq!(frame.session_id, "session-1");
        assert_eq!(frame.elapsed_secs, 1);
        assert_eq!(frame.headline, "Initializing... (0%)");
        assert_eq!(frame.time_series.labels.len(), 30);
        assert_eq!(frame.time_series.series.len(), 7);
        assert!(frame.distribution.slices.iter().all(|slice| slice.value == 0.0));
    }
}
