pub mod actor;
pub mod projection;
pub mod state;

pub use actor::Aggregator;
pub use projection::{
    distribution_projection, time_series_projection, DistributionProjection, DistributionSlice,
    EmotionSeries, TimeSeriesProjection,
};
pub use state::{
    AggregatorState, CurrentSnapshot, HistoryBuffer, MergeOutcome, SnapshotStatus,
    DEFAULT_HISTORY_WINDOW,
};
