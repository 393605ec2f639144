use std::collections::{HashMap, HashSet};
use std::io;

use super::snapshot::{GlobalCounters, NetBytes, RawSnapshotEntry};

/// Where raw counters come from.
///
/// Implementations must never fail the whole snapshot because one process
/// went away: `read_entry` returns `None` and the collector substitutes a
/// zero-valued sentinel.
pub trait SnapshotSource {
    fn enumerate_live_identifiers(&mut self) -> HashSet<u32>;

    fn read_entry(&mut self, pid: u32) -> Option<RawSnapshotEntry>;

    fn read_globals(&mut self) -> io::Result<GlobalCounters>;

    /// Per-process network byte counters, or `None` when no source for them is
    /// available. Pids missing from the map were not measured.
    fn read_network(&mut self) -> Option<HashMap<u32, NetBytes>>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for Box<S> {
    fn enumerate_live_identifiers(&mut self) -> HashSet<u32> {
        (**self).enumerate_live_identifiers()
    }

    fn read_entry(&mut self, pid: u32) -> Option<RawSnapshotEntry> {
        (**self).read_entry(pid)
    }

    fn read_globals(&mut self) -> io::Result<GlobalCounters> {
        (**self).read_globals()
    }

    fn read_network(&mut self) -> Option<HashMap<u32, NetBytes>> {
        (**self).read_network()
    }
}
