use std::collections::{HashMap, HashSet};
use std::io;
use std::time::Instant;

use sysinfo::{Networks, Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use super::SourceOptions;
use crate::system::snapshot::{GlobalCounters, IoBytes, NetBytes, RawSnapshotEntry};
use crate::system::source::SnapshotSource;

/// Snapshot source built on `sysinfo` for platforms without `/proc`.
///
/// sysinfo exposes accumulated CPU time in milliseconds rather than scheduler
/// ticks, so one tick here is 10ms and the system total is wall-clock time
/// multiplied by the core count. Per-process network counters are not
/// available, so the host's interface totals are credited to the lowest pid,
/// the same shape as a single network namespace on Linux.
pub struct SysinfoSource {
    sys: System,
    networks: Option<Networks>,
    started: Instant,
    cores: u64,
    page_size: u64,
}

impl SysinfoSource {
    pub fn new(options: &SourceOptions, page_size: u64) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        let cores = sys.cpus().len().max(1) as u64;
        SysinfoSource {
            sys,
            networks: options.network.then(Networks::new_with_refreshed_list),
            started: Instant::now(),
            cores,
            page_size: page_size.max(1),
        }
    }
}

impl SnapshotSource for SysinfoSource {
    fn enumerate_live_identifiers(&mut self) -> HashSet<u32> {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_memory()
                .with_cpu()
                .with_disk_usage()
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );
        self.sys.processes().keys().map(|pid| pid.as_u32()).collect()
    }

    fn read_entry(&mut self, pid: u32) -> Option<RawSnapshotEntry> {
        let process = self.sys.process(Pid::from_u32(pid))?;
        let disk = process.disk_usage();
        let cmd = process
            .cmd()
            .iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Some(RawSnapshotEntry {
            pid,
            ppid: process.parent().map(|p| p.as_u32()).unwrap_or(0),
            name: process.name().to_string_lossy().to_string(),
            utime: process.accumulated_cpu_time() / 10,
            stime: 0,
            resident_pages: process.memory() / self.page_size,
            net: None,
            io: Some(IoBytes {
                read: disk.total_read_bytes,
                written: disk.total_written_bytes,
            }),
            cmdline: if cmd.is_empty() { None } else { Some(cmd) },
            readable: true,
        })
    }

    fn read_globals(&mut self) -> io::Result<GlobalCounters> {
        self.sys.refresh_memory();
        let elapsed_ticks = (self.started.elapsed().as_millis() / 10) as u64;
        Ok(GlobalCounters {
            cpu_ticks: elapsed_ticks * self.cores,
            memory_used: self.sys.used_memory(),
            memory_total: self.sys.total_memory(),
            net_bytes: 0,
        })
    }

    fn read_network(&mut self) -> Option<HashMap<u32, NetBytes>> {
        let networks = self.networks.as_mut()?;
        networks.refresh(true);
        let host = networks
            .iter()
            .filter(|(name, _)| !name.starts_with("lo"))
            .fold(NetBytes::default(), |acc, (_, data)| NetBytes {
                sent: acc.sent.saturating_add(data.total_transmitted()),
                received: acc.received.saturating_add(data.total_received()),
            });

        // Called before enumeration, so the process table may still be empty.
        if self.sys.processes().is_empty() {
            self.sys.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::nothing(),
            );
        }
        let owner = self.sys.processes().keys().map(|pid| pid.as_u32()).min()?;
        Some(HashMap::from([(owner, host)]))
    }
}
