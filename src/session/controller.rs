use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::aggregator::{Aggregator, AggregatorState};
use crate::chart::ChartSink;
use crate::classifier::Classifier;
use crate::metrics::MetricsCollector;
use crate::overlay::OverlayRenderer;
use crate::settings::Settings;
use crate::vision::{FaceLocator, FrameSource};

use super::clock::SessionClock;
use super::loop_worker::{clock_loop, detection_loop, render_loop};
use super::pipeline::Pipeline;

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Read side of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub aggregator: Aggregator,
    pub clock: SessionClock,
    pub overlay: OverlayRenderer,
    pub metrics: MetricsCollector,
}

/// Owns the background tasks of at most one session.
pub struct SessionController {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    cancel_token: Option<CancellationToken>,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel_token.is_some()
    }

    pub async fn start_session<S, L, C, K>(
        &mut self,
        settings: &Settings,
        source: Arc<S>,
        locator: Arc<L>,
        classifier: Arc<C>,
        sink: Arc<K>,
    ) -> Result<SessionHandle>
    where
        S: FrameSource,
        L: FaceLocator,
        C: Classifier,
        K: ChartSink,
    {
        if self.is_active() {
            bail!("session already active");
        }

        let session_id = Uuid::new_v4().to_string();
        let cancel_token = CancellationToken::new();
        let metrics = MetricsCollector::new();
        let clock = SessionClock::new();
        let overlay = OverlayRenderer::new();

        let (aggregator, merge_handle) = Aggregator::spawn(
            AggregatorState::new(settings.history_window, settings.discard_stale_results),
            metrics.clone(),
            cancel_token.clone(),
        );

        let pipeline = Pipeline::new(
            source,
            locator,
            classifier,
            aggregator.clone(),
            overlay.clone(),
            metrics.clone(),
            settings.tick_timeout(),
        );

        self.handles = vec![
            (
                "detection loop",
                tokio::spawn(detection_loop(
                    pipeline,
                    settings.detection_interval(),
                    cancel_token.clone(),
                )),
            ),
            (
                "clock loop",
                tokio::spawn(clock_loop(
                    clock.clone(),
                    settings.clock_interval(),
                    cancel_token.clone(),
                )),
            ),
            (
                "render loop",
                tokio::spawn(render_loop(
                    aggregator.clone(),
                    clock.clone(),
                    sink,
                    session_id.clone(),
                    settings.render_interval(),
                    cancel_token.clone(),
                )),
            ),
            ("merge task", merge_handle),
        ];
        self.cancel_token = Some(cancel_token);

        log_info!("session {} started (endpoint {})", session_id, settings.endpoint);

        Ok(SessionHandle {
            session_id,
            aggregator,
            clock,
            overlay,
            metrics,
        })
    }

    /// Cancel every session task and wait for them. Ticks still in flight
    /// finish on their own; their results are discarded by the torn-down
    /// aggregator.
    pub async fn stop_session(&mut self) -> Result<()> {
        let Some(token) = self.cancel_token.take() else {
            return Ok(());
        };
        token.cancel();

        for (name, handle) in self.handles.drain(..) {
            handle
                .await
                .with_context(|| format!("{name} task failed to join"))?;
        }
        log_info!("session stopped");
        Ok(())
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SnapshotStatus;
    use crate::chart::ChartFrame;
    use crate::classifier::{ClassificationResult, ClassifyError, FacePayload};
    use crate::emotion::Emotion;
    use crate::vision::{FixedRegionLocator, StillFrameSource};
    use image::RgbImage;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Duration;

    struct HappyClassifier {
        calls: AtomicUsize,
    }

    impl Classifier for HappyClassifier {
        fn classify(
            &self,
            _payload: FacePayload,
        ) -> impl Future<Output = Result<ClassificationResult, ClassifyError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async {
                Ok(ClassificationResult {
                    label: Emotion::Happy,
                    confidence: 0.8,
                    distribution: HashMap::from([(Emotion::Happy, 0.8), (Emotion::Neutral, 0.2)]),
                })
            }
        }
    }

    struct NullSink;

    impl ChartSink for NullSink {
        fn render(&self, _frame: &ChartFrame) {}
    }

    fn settings() -> Settings {
        Settings {
            detection_interval_ms: 20,
            clock_interval_ms: 20,
            render_interval_ms: 20,
            ..Settings::default()
        }
    }

    async fn start(controller: &mut SessionController, classifier: Arc<HappyClassifier>) -> Result<SessionHandle> {
        controller
            .start_session(
                &settings(),
                Arc::new(StillFrameSource::from_images(vec![RgbImage::new(32, 32)])),
                Arc::new(FixedRegionLocator::new(None)),
                classifier,
                Arc::new(NullSink),
            )
            .await
    }

    #[tokio::test]
    async fn stopping_idle_controller_is_ok() {
        let mut controller = SessionController::new();
        assert!(!controller.is_active());
        controller.stop_session().await.unwrap();
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let classifier = Arc::new(HappyClassifier { calls: AtomicUsize::new(0) });
        let mut controller = SessionController::new();
        start(&mut controller, Arc::clone(&classifier)).await.unwrap();

        let err = start(&mut controller, classifier).await.err().unwrap();
        assert!(err.to_string().contains("already active"));
        controller.stop_session().await.unwrap();
    }

    #[tokio::test]
    async fn session_runs_until_stopped_then_tears_down() {
        let classifier = Arc::new(HappyClassifier { calls: AtomicUsize::new(0) });
        let mut controller = SessionController::new();
        let session = start(&mut controller, Arc::clone(&classifier)).await.unwrap();

        while session.aggregator.state().await.history_len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let snapshot = session.aggregator.snapshot().await;
        assert_eq!(snapshot.status, SnapshotStatus::Labeled);
        assert_eq!(snapshot.headline(), "Happy (80.0%)");
        assert_eq!(session.overlay.current().label.unwrap().text, "Happy (80.0%)");

        controller.stop_session().await.unwrap();
        assert!(!controller.is_active());
        assert!(session.aggregator.is_torn_down().await);

        let frozen_clock = session.clock.elapsed_secs();
        let frozen_len = session.aggregator.state().await.history_len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.clock.elapsed_secs(), frozen_clock);
        assert_eq!(session.aggregator.state().await.history_len(), frozen_len);
    }

    #[tokio::test]
    async fn controller_can_start_again_after_stop() {
        let classifier = Arc::new(HappyClassifier { calls: AtomicUsize::new(0) });
        let mut controller = SessionController::new();

        let first = start(&mut controller, Arc::clone(&classifier)).await.unwrap();
        controller.stop_session().await.unwrap();
        let second = start(&mut controller, classifier).await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert!(!second.aggregator.is_torn_down().await);
        controller.stop_session().await.unwrap();
    }
}
