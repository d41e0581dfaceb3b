use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::classifier::types::format_percent;
use crate::classifier::ClassificationResult;
use crate::emotion::Emotion;

/// Samples kept per category for the trend chart.
pub const DEFAULT_HISTORY_WINDOW: usize = 30;

/// Sliding window of probability samples, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append at the tail, evicting from the head past capacity.
    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotStatus {
    #[default]
    Detecting,
    NoFace,
    Labeled,
}

/// Latest known classification, overwritten wholesale per completed tick.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSnapshot {
    pub status: SnapshotStatus,
    pub label: Option<Emotion>,
    pub confidence: f64,
    pub distribution: HashMap<Emotion, f64>,
    /// Tick whose result is on display.
    pub tick: Option<u64>,
}

impl CurrentSnapshot {
    /// Probability for `emotion` in the latest result, 0 when absent.
    pub fn probability(&self, emotion: Emotion) -> f64 {
        self.distribution.get(&emotion).copied().unwrap_or(0.0)
    }

    /// Text for the emotion display.
    pub fn headline(&self) -> String {
        match (self.status, self.label) {
            (SnapshotStatus::Labeled, Some(label)) => {
                format!("{} ({})", label, format_percent(self.confidence))
            }
            (SnapshotStatus::NoFace, _) => "No face detected (0%)".to_string(),
            _ => "Initializing... (0%)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// Older than the last applied tick while stale results are discarded.
    Stale,
    /// Session already torn down; nothing changed.
    TornDown,
}

/// Rolling per-category history plus the current snapshot.
///
/// All writes go through `merge` and `mark_no_face`; every buffer advances
/// together so they always have the same length.
#[derive(Debug, Clone)]
pub struct AggregatorState {
    history: BTreeMap<Emotion, HistoryBuffer>,
    snapshot: CurrentSnapshot,
    window: usize,
    discard_stale: bool,
    last_applied_tick: Option<u64>,
    torn_down: bool,
}

impl AggregatorState {
    pub fn new(window: usize, discard_stale: bool) -> Self {
        let history = Emotion::ALL
            .iter()
            .map(|emotion| (*emotion, HistoryBuffer::new(window)))
            .collect();

        Self {
            history,
            snapshot: CurrentSnapshot::default(),
            window: window.max(1),
            discard_stale,
            last_applied_tick: None,
            torn_down: false,
        }
    }

    pub fn merge(&mut self, tick: u64, result: ClassificationResult) -> MergeOutcome {
        if let Some(outcome) = self.reject(tick) {
            return outcome;
        }

        for (emotion, buffer) in self.history.iter_mut() {
            buffer.push(result.probability(*emotion));
        }

        self.snapshot = CurrentSnapshot {
            status: SnapshotStatus::Labeled,
            label: Some(result.label),
            confidence: result.confidence,
            distribution: result.distribution,
            tick: Some(tick),
        };
        self.note_applied(tick);
        MergeOutcome::Applied
    }

    /// Record a detection miss. History and the last distribution are kept.
    pub fn mark_no_face(&mut self, tick: u64) -> MergeOutcome {
        if let Some(outcome) = self.reject(tick) {
            return outcome;
        }

        self.snapshot.status = SnapshotStatus::NoFace;
        self.snapshot.confidence = 0.0;
        self.note_applied(tick);
        MergeOutcome::Applied
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn snapshot(&self) -> &CurrentSnapshot {
        &self.snapshot
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn history(&self, emotion: Emotion) -> Option<&HistoryBuffer> {
        self.history.get(&emotion)
    }

    pub fn samples(&self, emotion: Emotion) -> Vec<f64> {
        self.history
            .get(&emotion)
            .map(HistoryBuffer::to_vec)
            .unwrap_or_default()
    }

    /// Current length shared by every category buffer.
    pub fn history_len(&self) -> usize {
        self.history.values().map(HistoryBuffer::len).max().unwrap_or(0)
    }

    pub fn last_applied_tick(&self) -> Option<u64> {
        self.last_applied_tick
    }

    fn reject(&self, tick: u64) -> Option<MergeOutcome> {
        if self.torn_down {
            return Some(MergeOutcome::TornDown);
        }
        match self.last_applied_tick {
            Some(last) if self.discard_stale && tick < last => Some(MergeOutcome::Stale),
            _ => None,
        }
    }

    fn note_applied(&mut self, tick: u64) {
        self.last_applied_tick = Some(self.last_applied_tick.map_or(tick, |last| last.max(tick)));
    }
}
