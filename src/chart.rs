use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregator::{DistributionProjection, SnapshotStatus, TimeSeriesProjection};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Everything a dashboard needs for one render cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFrame {
    pub rendered_at: DateTime<Utc>,
    pub session_id: String,
    pub elapsed_secs: u64,
    pub status: SnapshotStatus,
    pub headline: String,
    pub time_series: TimeSeriesProjection,
    pub distribution: DistributionProjection,
}

/// Consumer of the projections, called once per render cycle.
pub trait ChartSink: Send + Sync + 'static {
    fn render(&self, frame: &ChartFrame);
}

/// Writes each frame to the log: a one-line summary at info, the full JSON at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChartSink;

impl ChartSink for LogChartSink {
    fn render(&self, frame: &ChartFrame) {
        log_info!(
            "[{}s] {} | {}",
            frame.elapsed_secs,
            frame.headline,
            frame
                .distribution
                .slices
                .iter()
                .map(|slice| format!("{}={:.2}", slice.emotion, slice.value))
                .collect::<Vec<_>>()
                .join(" ")
        );

        match serde_json::to_string(frame) {
            Ok(json) => log_debug!("chart frame {}", json),
            Err(err) => log_warn!("failed to serialize chart frame: {err}"),
        }
    }
}
