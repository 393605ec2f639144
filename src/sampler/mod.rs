//! The sampling engine: snapshot pairs in, per-dimension leaderboards out.

pub mod delta;
pub mod dimension;
pub mod group;
pub mod tracker;
pub mod worker;

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::system::collector::Collector;
use crate::system::snapshot::{GlobalCounters, Liveness, Snapshot};
use crate::system::source::SnapshotSource;

use delta::{NormalizationParams, compute_usage};
use dimension::Dimension;
use group::{GroupBy, reduce};
use tracker::{RankedEntry, TopKTracker};

/// Runtime configuration, resolved and validated once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    pub group_by: GroupBy,
    pub sample_period: Duration,
    /// Samples kept per history buffer.
    pub window: usize,
    pub top_k: usize,
    pub dimensions: Vec<Dimension>,
    pub page_size: u64,
    pub core_count: usize,
}

impl SamplerConfig {
    pub fn params(&self) -> NormalizationParams {
        NormalizationParams {
            core_count: self.core_count,
            page_size: self.page_size,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DimensionReport {
    pub dimension: Dimension,
    pub entries: Vec<RankedEntry>,
}

/// Everything one cycle produced, handed to the presentation side by value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub group_by: GroupBy,
    pub window: usize,
    pub elapsed_ms: u64,
    pub globals: GlobalCounters,
    /// System-wide network bytes per second over the interval.
    pub net_rate: f64,
    pub process_count: usize,
    pub boards: Vec<DimensionReport>,
    #[serde(skip)]
    pub liveness: Liveness,
}

impl CycleReport {
    pub fn board(&self, dimension: Dimension) -> Option<&DimensionReport> {
        self.boards.iter().find(|b| b.dimension == dimension)
    }
}

pub struct Sampler<S> {
    collector: Collector<S>,
    config: SamplerConfig,
    trackers: Vec<TopKTracker>,
    cycle: u64,
}

impl<S: SnapshotSource> Sampler<S> {
    pub fn new(source: S, config: SamplerConfig) -> Self {
        let trackers = config
            .dimensions
            .iter()
            .map(|&d| TopKTracker::new(d, config.window, config.top_k, config.core_count))
            .collect();
        Sampler {
            collector: Collector::new(source),
            config,
            trackers,
            cycle: 0,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Blocks for one sample period and returns that interval's report.
    pub fn run_cycle(&mut self) -> CycleReport {
        let before = self.collector.capture();
        std::thread::sleep(self.config.sample_period);
        let after = self.collector.capture();
        self.process(&before, &after)
    }

    /// Runs delta, grouping and ranking over an already captured pair.
    pub fn process(&mut self, before: &Snapshot, after: &Snapshot) -> CycleReport {
        let started = Instant::now();
        self.cycle += 1;
        let _span = tracing::debug_span!("sampler.cycle", cycle = self.cycle).entered();

        let liveness = Liveness::new(after.live_pids());
        let records = compute_usage(before, after, self.config.params());
        let aggregates = reduce(records, self.config.group_by);

        let boards = self
            .trackers
            .iter_mut()
            .map(|tracker| DimensionReport {
                dimension: tracker.dimension(),
                entries: tracker.update(&aggregates, &liveness),
            })
            .collect();

        let interval = after.captured_at.saturating_duration_since(before.captured_at);
        let net_delta = after.globals.net_bytes.saturating_sub(before.globals.net_bytes);
        let net_rate = if interval.is_zero() {
            0.0
        } else {
            net_delta as f64 / interval.as_secs_f64()
        };

        let report = CycleReport {
            cycle: self.cycle,
            group_by: self.config.group_by,
            window: self.config.window,
            elapsed_ms: interval.as_millis() as u64,
            globals: after.globals,
            net_rate,
            process_count: liveness.len(),
            boards,
            liveness,
        };
        tracing::debug!(
            groups = aggregates.len(),
            processes = report.process_count,
            took_us = started.elapsed().as_micros() as u64,
            "cycle processed"
        );
        report
    }
}
