use serde::Serialize;

use super::{AggregatorState, CurrentSnapshot};
use crate::emotion::Emotion;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmotionSeries {
    pub emotion: Emotion,
    pub color: &'static str,
    /// Oldest first; shorter than the axis until the window fills.
    pub samples: Vec<f64>,
}

/// Per-category trend over the last `W` samples.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesProjection {
    /// Axis labels `1..=W`.
    pub labels: Vec<usize>,
    pub series: Vec<EmotionSeries>,
}

impl TimeSeriesProjection {
    pub fn series(&self, emotion: Emotion) -> Option<&EmotionSeries> {
        self.series.iter().find(|series| series.emotion == emotion)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSlice {
    pub emotion: Emotion,
    pub color: &'static str,
    pub value: f64,
}

/// Category distribution of the latest result.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionProjection {
    pub slices: Vec<DistributionSlice>,
}

impl DistributionProjection {
    pub fn value(&self, emotion: Emotion) -> Option<f64> {
        self.slices
            .iter()
            .find(|slice| slice.emotion == emotion)
            .map(|slice| slice.value)
    }
}

pub fn time_series_projection(state: &AggregatorState) -> TimeSeriesProjection {
    let series = Emotion::ALL
        .iter()
        .map(|emotion| EmotionSeries {
            emotion: *emotion,
            color: emotion.color(),
            samples: state.samples(*emotion),
        })
        .collect();

    TimeSeriesProjection {
        labels: (1..=state.window()).collect(),
        series,
    }
}

pub fn distribution_projection(snapshot: &CurrentSnapshot) -> DistributionProjection {
    let slices = Emotion::ALL
        .iter()
        .map(|emotion| DistributionSlice {
            emotion: *emotion,
            color: emotion.color(),
            value: snapshot.probability(*emotion),
        })
        .collect();

    DistributionProjection { slices }
}
