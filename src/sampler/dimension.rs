use serde::Serialize;

use super::delta::UsageRecord;
use crate::format::format_bytes;

/// One independently ranked resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    Cpu,
    Memory,
    Network,
    Io,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Cpu,
        Dimension::Memory,
        Dimension::Network,
        Dimension::Io,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Cpu => "CPU",
            Dimension::Memory => "Memory",
            Dimension::Network => "Network",
            Dimension::Io => "IO",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Dimension::Cpu => 0,
            Dimension::Memory => 1,
            Dimension::Network => 2,
            Dimension::Io => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "mem" | "memory" => Dimension::Memory,
            "net" | "network" => Dimension::Network,
            "io" | "disk" => Dimension::Io,
            _ => Dimension::Cpu,
        }
    }

    /// The instantaneous value this dimension ranks by.
    pub fn value(self, usage: &UsageRecord) -> f64 {
        match self {
            Dimension::Cpu => usage.cpu_pct,
            Dimension::Memory => usage.mem_pct,
            Dimension::Network => usage.net_pct,
            Dimension::Io => usage.io_pct,
        }
    }

    /// Absolute bytes moved during the interval, for the byte-based dimensions.
    pub fn bytes(self, usage: &UsageRecord) -> Option<u64> {
        match self {
            Dimension::Network => Some(usage.net_bytes),
            Dimension::Io => Some(usage.io_bytes),
            Dimension::Cpu | Dimension::Memory => None,
        }
    }

    /// Presentation capabilities for this dimension.
    pub fn format(self, core_count: usize) -> Box<dyn ValueFormat + Send> {
        match self {
            Dimension::Cpu => Box::new(CpuFormat {
                max_cpu: core_count.max(1) as f64 * 100.0,
            }),
            Dimension::Memory => Box::new(PercentFormat),
            Dimension::Network | Dimension::Io => Box::new(ShareFormat),
        }
    }
}

/// How a dimension's history is scaled and labelled.
pub trait ValueFormat {
    /// Upper bound of the graph's vertical axis.
    fn scale(&self, history: &[f64]) -> f64;

    fn format_value(&self, value: f64) -> String;

    fn format_tooltip(&self, history: &[f64], bytes: Option<ByteSummary>) -> String;
}

/// Bytes moved by one key, for the byte-based dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteSummary {
    /// The most recent interval.
    pub last: u64,
    /// Every interval still inside the window.
    pub total: u64,
}

fn max_of(history: &[f64]) -> f64 {
    history.iter().copied().fold(0.0, f64::max)
}

fn avg_of(history: &[f64]) -> f64 {
    if history.is_empty() {
        0.0
    } else {
        history.iter().sum::<f64>() / history.len() as f64
    }
}

/// CPU share; may exceed 100 on multi-core machines.
pub struct CpuFormat {
    pub max_cpu: f64,
}

impl ValueFormat for CpuFormat {
    fn scale(&self, history: &[f64]) -> f64 {
        if max_of(history) > 100.0 {
            self.max_cpu.max(100.0)
        } else {
            100.0
        }
    }

    fn format_value(&self, value: f64) -> String {
        format!("{}%", value.trunc() as u64)
    }

    fn format_tooltip(&self, history: &[f64], _bytes: Option<ByteSummary>) -> String {
        format!(
            "avg: {}%, max: {}%",
            avg_of(history).trunc() as u64,
            max_of(history).trunc() as u64
        )
    }
}

/// Share of used system memory.
pub struct PercentFormat;

impl ValueFormat for PercentFormat {
    fn scale(&self, _history: &[f64]) -> f64 {
        100.0
    }

    fn format_value(&self, value: f64) -> String {
        format!("{value:.1}%")
    }

    fn format_tooltip(&self, history: &[f64], _bytes: Option<ByteSummary>) -> String {
        format!("avg: {:.1}%, max: {:.1}%", avg_of(history), max_of(history))
    }
}

/// Share of the interval's traffic; small shares are common, so the graph
/// scales to its own peak.
pub struct ShareFormat;

impl ValueFormat for ShareFormat {
    fn scale(&self, history: &[f64]) -> f64 {
        max_of(history).max(1.0)
    }

    fn format_value(&self, value: f64) -> String {
        format!("{value:.1}%")
    }

    fn format_tooltip(&self, history: &[f64], bytes: Option<ByteSummary>) -> String {
        let mut tip = format!("avg: {:.1}%, max: {:.1}%", avg_of(history), max_of(history));
        if let Some(bytes) = bytes {
            tip.push_str(&format!(
                ", last: {}, total: {}",
                format_bytes(bytes.last),
                format_bytes(bytes.total)
            ));
        }
        tip
    }
}
