use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::aggregator::Aggregator;
use crate::classifier::{encode_crop, Classifier, ClassifyError};
use crate::metrics::{MetricsCollector, TickMetrics, TickOutcome};
use crate::overlay::OverlayRenderer;
use crate::vision::{FaceLocator, FrameSource};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// One detection-and-classification pass, shared by every tick.
pub struct Pipeline<S, L, C> {
    source: Arc<S>,
    locator: Arc<L>,
    classifier: Arc<C>,
    aggregator: Aggregator,
    overlay: OverlayRenderer,
    metrics: MetricsCollector,
    tick_timeout: Duration,
}

impl<S, L, C> Clone for Pipeline<S, L, C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            locator: Arc::clone(&self.locator),
            classifier: Arc::clone(&self.classifier),
            aggregator: self.aggregator.clone(),
            overlay: self.overlay.clone(),
            metrics: self.metrics.clone(),
            tick_timeout: self.tick_timeout,
        }
    }
}

impl<S, L, C> Pipeline<S, L, C>
where
    S: FrameSource,
    L: FaceLocator,
    C: Classifier,
{
    pub fn new(
        source: Arc<S>,
        locator: Arc<L>,
        classifier: Arc<C>,
        aggregator: Aggregator,
        overlay: OverlayRenderer,
        metrics: MetricsCollector,
        tick_timeout: Duration,
    ) -> Self {
        Self {
            source,
            locator,
            classifier,
            aggregator,
            overlay,
            metrics,
            tick_timeout,
        }
    }

    /// Run `tick` on its own task; the caller does not wait for it.
    pub fn spawn_tick(&self, tick: u64) -> JoinHandle<TickOutcome> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run_tick(tick).await })
    }

    /// Run one tick to completion. Never fails; problems end up in the
    /// returned outcome, the log, and the metrics collector.
    pub async fn run_tick(&self, tick: u64) -> TickOutcome {
        let tick_start = Instant::now();
        let mut metrics = TickMetrics::new(tick, TickOutcome::NotReady);

        let result = match tokio::time::timeout(self.tick_timeout, self.process(tick, &mut metrics)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifyError::Timeout(self.tick_timeout)),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) if err.is_incomplete() => {
                log_debug!("tick {} dropped: {}", tick, err);
                TickOutcome::Incomplete
            }
            Err(err) => {
                log_warn!("tick {} abandoned: {}", tick, err);
                metrics.failure = Some(err.to_string());
                TickOutcome::Failed
            }
        };

        metrics.outcome = outcome;
        metrics.total_ms = tick_start.elapsed().as_millis() as u64;
        self.metrics.record_tick(metrics).await;
        outcome
    }

    async fn process(&self, tick: u64, metrics: &mut TickMetrics) -> Result<TickOutcome, ClassifyError> {
        if !self.locator.is_ready() {
            log_debug!("tick {}: face locator not ready", tick);
            return Ok(TickOutcome::NotReady);
        }
        let Some(frame) = self.source.current_frame() else {
            log_debug!("tick {}: no frame available yet", tick);
            return Ok(TickOutcome::NotReady);
        };
        let (width, height) = (frame.width(), frame.height());

        let locate_start = Instant::now();
        let located = tokio::task::spawn_blocking({
            let locator = Arc::clone(&self.locator);
            let frame = frame.clone();
            move || locator.locate(&frame)
        })
        .await
        .map_err(|err| ClassifyError::Worker(format!("locator worker join failed: {err}")))?;
        metrics.locate_ms = Some(locate_start.elapsed().as_millis() as u64);

        let face = located.and_then(|region| region.clamp_to(width, height).map(|rect| (region, rect)));
        let Some((region, rect)) = face else {
            self.overlay.begin_tick(tick, width, height, None);
            if !self.aggregator.no_face(tick) {
                self.metrics.record_discarded().await;
            }
            return Ok(TickOutcome::NoFace);
        };
        self.overlay.begin_tick(tick, width, height, Some(region));

        let encode_start = Instant::now();
        let payload = tokio::task::spawn_blocking({
            let image = Arc::clone(&frame.image);
            move || encode_crop(&image, rect)
        })
        .await
        .map_err(|err| ClassifyError::Worker(format!("encode worker join failed: {err}")))??;
        metrics.encode_ms = Some(encode_start.elapsed().as_millis() as u64);
        metrics.payload_bytes = Some(payload.len());

        let classify_start = Instant::now();
        let result = self.classifier.classify(payload).await;
        metrics.classify_ms = Some(classify_start.elapsed().as_millis() as u64);
        let result = result?;

        self.overlay.attach_label(tick, &result);
        if !self.aggregator.merge(tick, result) {
            log_debug!("tick {}: session already torn down, result discarded", tick);
            self.metrics.record_discarded().await;
        }
        Ok(TickOutcome::Labeled)
    }
}
