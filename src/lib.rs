pub mod aggregator;
pub mod chart;
pub mod classifier;
pub mod emotion;
pub mod metrics;
pub mod overlay;
pub mod session;
pub mod settings;
pub mod utils;
pub mod vision;

use anyhow::{Context, Result};
use std::sync::Arc;

use chart::LogChartSink;
use classifier::HttpClassifier;
use session::SessionController;
use settings::{Settings, FRAMES_DIR_VAR};
use vision::{FixedRegionLocator, StillFrameSource};

/// Run a session against the configured frames and classifier until Ctrl-C.
pub async fn run() -> Result<()> {
    utils::init_logging();

    log::info!("EmoLens starting up...");

    let settings = Settings::load()?;
    let frames_dir = settings.frames_dir.clone().with_context(|| {
        format!("no frame source configured; set {FRAMES_DIR_VAR} or frames_dir in the settings file")
    })?;

    let source = Arc::new(StillFrameSource::from_dir(&frames_dir)?);
    let locator = Arc::new(FixedRegionLocator::new(settings.face_region));
    let classifier = Arc::new(HttpClassifier::new(
        &settings.endpoint,
        &settings.upload_field,
        settings.request_timeout(),
    )?);

    let mut controller = SessionController::new();
    let session = controller
        .start_session(&settings, source, locator, classifier, Arc::new(LogChartSink))
        .await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    log::info!("shutdown requested");

    controller.stop_session().await?;

    let metrics = session.metrics.get_snapshot().await;
    log::info!(
        "session {} ended after {}s: {} ticks, {} labeled, {} no face, {} not ready, {} incomplete, {} failed, {} discarded",
        session.session_id,
        session.clock.elapsed_secs(),
        metrics.tick_count,
        metrics.labeled_count,
        metrics.no_face_count,
        metrics.not_ready_count,
        metrics.incomplete_count,
        metrics.failure_count,
        metrics.discarded_count
    );
    Ok(())
}
