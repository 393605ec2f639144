use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::dimension::{ByteSummary, Dimension, ValueFormat};
use super::group::{Aggregate, TrackedKey};
use crate::system::snapshot::Liveness;

/// Fixed-length, oldest-first sample window, pre-filled with zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
}

impl HistoryBuffer {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        let mut samples = VecDeque::with_capacity(window);
        samples.resize(window, 0.0);
        Self { samples }
    }

    /// Appends a sample and drops the oldest one; the length never changes.
    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        self.samples.pop_front();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    pub fn last(&self) -> f64 {
        self.samples.back().copied().unwrap_or(0.0)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

/// Display metadata from the most recent cycle a key was present.
#[derive(Debug, Clone)]
struct EntryMeta {
    pid: u32,
    name: String,
    cmdline: Option<String>,
    process_count: usize,
}

impl EntryMeta {
    fn from_aggregate(agg: &Aggregate) -> Self {
        EntryMeta {
            pid: agg.usage.pid,
            name: agg.usage.name.clone(),
            cmdline: agg.usage.cmdline.clone(),
            process_count: agg.usage.process_count,
        }
    }
}

#[derive(Debug, Clone)]
struct Tracked {
    history: HistoryBuffer,
    /// Bytes per interval, in step with `history`; byte-based dimensions only.
    bytes: Option<HistoryBuffer>,
    meta: EntryMeta,
    idle_cycles: usize,
}

impl Tracked {
    fn byte_summary(&self) -> Option<ByteSummary> {
        self.bytes.as_ref().map(|b| ByteSummary {
            last: b.last() as u64,
            total: b.sum() as u64,
        })
    }
}

/// One row of a dimension's leaderboard, with its history copied out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub key: TrackedKey,
    pub pid: u32,
    pub name: String,
    pub cmdline: Option<String>,
    pub process_count: usize,
    pub alive: bool,
    pub current: f64,
    pub history: Vec<f64>,
    pub scale: f64,
    pub value_label: String,
    pub tooltip: String,
}

/// Rolling top-K leaderboard for one dimension.
///
/// Every cycle the instantaneous top K get their value appended, every other
/// tracked key gets a zero, and the published ranking is by the sum of each
/// key's whole window so a single spike cannot dominate it.
pub struct TopKTracker {
    dimension: Dimension,
    window: usize,
    top_k: usize,
    format: Box<dyn ValueFormat + Send>,
    entries: HashMap<TrackedKey, Tracked>,
}

impl TopKTracker {
    pub fn new(dimension: Dimension, window: usize, top_k: usize, core_count: usize) -> Self {
        Self {
            dimension,
            window: window.max(1),
            top_k,
            format: dimension.format(core_count),
            entries: HashMap::new(),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn tracked_len(&self) -> usize {
        self.entries.len()
    }

    pub fn history(&self, key: &TrackedKey) -> Option<&HistoryBuffer> {
        self.entries.get(key).map(|t| &t.history)
    }

    pub fn update(&mut self, aggregates: &[Aggregate], liveness: &Liveness) -> Vec<RankedEntry> {
        let dimension = self.dimension;
        let window = self.window;

        let mut instant: Vec<&Aggregate> = aggregates.iter().collect();
        instant.sort_by(|a, b| a.key.cmp(&b.key));
        instant.sort_by(|a, b| dimension.value(&b.usage).total_cmp(&dimension.value(&a.usage)));
        instant.truncate(self.top_k);

        let mut selected: HashSet<&TrackedKey> = HashSet::with_capacity(instant.len());
        for agg in &instant {
            let tracked = self
                .entries
                .entry(agg.key.clone())
                .or_insert_with(|| Tracked {
                    history: HistoryBuffer::new(window),
                    bytes: dimension.bytes(&agg.usage).map(|_| HistoryBuffer::new(window)),
                    meta: EntryMeta::from_aggregate(agg),
                    idle_cycles: 0,
                });
            tracked.history.push(dimension.value(&agg.usage));
            if let (Some(bytes), Some(moved)) = (&mut tracked.bytes, dimension.bytes(&agg.usage)) {
                bytes.push(moved as f64);
            }
            selected.insert(&agg.key);
        }

        // Identity follows the group's current members even when it is not
        // selected, so liveness is checked against a pid that still exists.
        let present: HashMap<&TrackedKey, &Aggregate> =
            aggregates.iter().map(|agg| (&agg.key, agg)).collect();
        for (key, tracked) in self.entries.iter_mut() {
            if let Some(agg) = present.get(key) {
                tracked.meta = EntryMeta::from_aggregate(agg);
            }
            if !selected.contains(key) {
                tracked.history.push(0.0);
                if let Some(bytes) = &mut tracked.bytes {
                    bytes.push(0.0);
                }
            }
        }

        // Forget keys that have shown nothing for a whole window.
        let before = self.entries.len();
        self.entries.retain(|key, tracked| {
            if tracked.history.sum() > 0.0 {
                tracked.idle_cycles = 0;
            } else {
                tracked.idle_cycles += 1;
            }
            selected.contains(key) || tracked.idle_cycles < window
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(dimension = dimension.label(), evicted, "evicted idle keys");
        }

        let mut ranking: Vec<(&TrackedKey, &Tracked, f64)> = self
            .entries
            .iter()
            .map(|(key, tracked)| (key, tracked, tracked.history.sum()))
            .collect();
        ranking.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(b.0)));

        ranking
            .into_iter()
            .take(self.top_k)
            .map(|(key, tracked, _)| {
                let history = tracked.history.to_vec();
                let current = tracked.history.last();
                RankedEntry {
                    key: key.clone(),
                    pid: tracked.meta.pid,
                    name: tracked.meta.name.clone(),
                    cmdline: tracked.meta.cmdline.clone(),
                    process_count: tracked.meta.process_count,
                    alive: liveness.is_alive(tracked.meta.pid),
                    current,
                    scale: self.format.scale(&history),
                    value_label: self.format.format_value(current),
                    tooltip: self.format.format_tooltip(&history, tracked.byte_summary()),
                    history,
                }
            })
            .collect()
    }
}
