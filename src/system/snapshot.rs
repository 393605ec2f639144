use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetBytes {
    pub sent: u64,
    pub received: u64,
}

impl NetBytes {
    pub fn total(&self) -> u64 {
        self.sent.saturating_add(self.received)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IoBytes {
    pub read: u64,
    pub written: u64,
}

impl IoBytes {
    pub fn total(&self) -> u64 {
        self.read.saturating_add(self.written)
    }
}

/// Raw cumulative counters for one process at one instant.
///
/// `net` and `io` are `None` when the source could not measure them, which is
/// different from a measured zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSnapshotEntry {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub utime: u64,
    pub stime: u64,
    pub resident_pages: u64,
    pub net: Option<NetBytes>,
    pub io: Option<IoBytes>,
    pub cmdline: Option<String>,
    pub readable: bool,
}

impl RawSnapshotEntry {
    /// Zero-valued stand-in for a process that vanished or could not be read.
    pub fn unreadable(pid: u32) -> Self {
        RawSnapshotEntry {
            pid,
            name: "<error>".to_string(),
            readable: false,
            ..Default::default()
        }
    }

    pub fn cpu_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// System-wide counters captured alongside a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GlobalCounters {
    pub cpu_ticks: u64,
    pub memory_used: u64,
    pub memory_total: u64,
    pub net_bytes: u64,
}

pub struct Snapshot {
    pub entries: HashMap<u32, RawSnapshotEntry>,
    pub globals: GlobalCounters,
    pub captured_at: Instant,
}

impl Snapshot {
    pub fn new(entries: HashMap<u32, RawSnapshotEntry>, globals: GlobalCounters) -> Self {
        Snapshot {
            entries,
            globals,
            captured_at: Instant::now(),
        }
    }

    /// Pids that were enumerated and could actually be read.
    pub fn live_pids(&self) -> HashSet<u32> {
        self.entries
            .values()
            .filter(|e| e.readable)
            .map(|e| e.pid)
            .collect()
    }
}

/// Which process identifiers were present in the latest enumeration.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Liveness {
    alive: HashSet<u32>,
}

impl Liveness {
    pub fn new(alive: HashSet<u32>) -> Self {
        Liveness { alive }
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.alive.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }
}

impl FromIterator<u32> for Liveness {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Liveness {
            alive: iter.into_iter().collect(),
        }
    }
}
