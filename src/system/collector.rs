use std::collections::HashMap;

use super::snapshot::{GlobalCounters, RawSnapshotEntry, Snapshot};
use super::source::SnapshotSource;

/// Turns a [`SnapshotSource`] into complete point-in-time snapshots.
pub struct Collector<S> {
    source: S,
}

impl<S: SnapshotSource> Collector<S> {
    pub fn new(source: S) -> Self {
        Collector { source }
    }

    /// Reads every live process plus the system counters.
    ///
    /// Never fails: unreadable processes become sentinels, unreadable system
    /// counters become zeros (which the delta engine treats as a degenerate
    /// interval).
    pub fn capture(&mut self) -> Snapshot {
        let _span = tracing::debug_span!("collector.capture").entered();

        let globals = match self.source.read_globals() {
            Ok(globals) => globals,
            Err(err) => {
                tracing::warn!(error = %err, "system counters unreadable");
                GlobalCounters::default()
            }
        };
        let net = self.source.read_network();
        let pids = self.source.enumerate_live_identifiers();

        let mut entries = HashMap::with_capacity(pids.len());
        let mut unreadable = 0usize;
        for pid in pids {
            let entry = match self.source.read_entry(pid) {
                Some(mut entry) => {
                    entry.net = net.as_ref().and_then(|per_pid| per_pid.get(&pid).copied());
                    entry
                }
                None => {
                    unreadable += 1;
                    RawSnapshotEntry::unreadable(pid)
                }
            };
            entries.insert(pid, entry);
        }

        tracing::debug!(
            processes = entries.len(),
            unreadable,
            network = net.is_some(),
            "snapshot captured"
        );
        Snapshot::new(entries, globals)
    }
}
