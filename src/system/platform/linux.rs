use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::SourceOptions;
use crate::system::netstat::SocketListing;
use crate::system::procfs::{
    ParseError, parse_cmdline, parse_cpu_total, parse_io, parse_meminfo, parse_net_dev,
    parse_stat, parse_statm,
};
use crate::system::snapshot::{GlobalCounters, NetBytes, RawSnapshotEntry};
use crate::system::source::SnapshotSource;

/// Reads counters from `/proc` and per-socket bytes from `ss`, falling back to
/// per-namespace interface totals when `ss` gives nothing.
pub struct ProcfsSource {
    root: PathBuf,
    sockets: SocketListing,
}

impl ProcfsSource {
    pub fn new(options: &SourceOptions) -> Self {
        let sockets = if options.network {
            SocketListing::new(options.ss_timeout)
        } else {
            SocketListing::disabled()
        };
        Self::with_root("/proc", sockets)
    }

    pub fn with_root(root: impl Into<PathBuf>, sockets: SocketListing) -> Self {
        ProcfsSource {
            root: root.into(),
            sockets,
        }
    }

    fn list_pids(&self) -> HashSet<u32> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(root = %self.root.display(), error = %err, "cannot list processes");
                return HashSet::new();
            }
        };
        entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .collect()
    }

    /// Interface totals of each network namespace, read from
    /// `/proc/[pid]/net/dev` and credited to the lowest pid in the namespace.
    fn read_namespace_network(&self) -> Option<HashMap<u32, NetBytes>> {
        let mut pids: Vec<u32> = self.list_pids().into_iter().collect();
        pids.sort_unstable();

        // ns/net is only readable for processes we may ptrace
        let mut namespaces: HashMap<PathBuf, u32> = HashMap::new();
        for pid in pids {
            let link = self.root.join(pid.to_string()).join("ns").join("net");
            if let Ok(namespace) = fs::read_link(link) {
                namespaces.entry(namespace).or_insert(pid);
            }
        }

        let per_pid: HashMap<u32, NetBytes> = namespaces
            .into_values()
            .filter_map(|pid| {
                let dev = self.root.join(pid.to_string()).join("net").join("dev");
                Some((pid, parse_net_dev(&fs::read_to_string(dev).ok()?)))
            })
            .collect();
        if per_pid.is_empty() { None } else { Some(per_pid) }
    }

    fn read_process(&self, dir: &Path) -> io::Result<RawSnapshotEntry> {
        let invalid = |e: ParseError| io::Error::new(io::ErrorKind::InvalidData, e);

        let stat = parse_stat(&fs::read_to_string(dir.join("stat"))?).map_err(invalid)?;
        let (_size, resident) =
            parse_statm(&fs::read_to_string(dir.join("statm"))?).map_err(invalid)?;

        // io is root-only for other users' processes
        let io = fs::read_to_string(dir.join("io"))
            .ok()
            .and_then(|c| parse_io(&c));
        let cmdline = fs::read(dir.join("cmdline"))
            .ok()
            .and_then(|raw| parse_cmdline(&raw));

        Ok(RawSnapshotEntry {
            pid: stat.pid,
            ppid: stat.ppid,
            name: stat.comm,
            utime: stat.utime,
            stime: stat.stime,
            resident_pages: resident,
            net: None,
            io,
            cmdline,
            readable: true,
        })
    }
}

impl SnapshotSource for ProcfsSource {
    fn enumerate_live_identifiers(&mut self) -> HashSet<u32> {
        self.list_pids()
    }

    fn read_entry(&mut self, pid: u32) -> Option<RawSnapshotEntry> {
        match self.read_process(&self.root.join(pid.to_string())) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(pid, error = %err, "process unreadable, using sentinel");
                None
            }
        }
    }

    fn read_globals(&mut self) -> io::Result<GlobalCounters> {
        let invalid = |e: ParseError| io::Error::new(io::ErrorKind::InvalidData, e);

        let cpu_ticks =
            parse_cpu_total(&fs::read_to_string(self.root.join("stat"))?).map_err(invalid)?;
        let (memory_total, memory_used) =
            parse_meminfo(&fs::read_to_string(self.root.join("meminfo"))?).map_err(invalid)?;
        let net_bytes = fs::read_to_string(self.root.join("net").join("dev"))
            .map(|c| parse_net_dev(&c).total())
            .unwrap_or(0);

        Ok(GlobalCounters {
            cpu_ticks,
            memory_used,
            memory_total,
            net_bytes,
        })
    }

    fn read_network(&mut self) -> Option<HashMap<u32, NetBytes>> {
        if !self.sockets.enabled {
            return None;
        }
        self.sockets.read().or_else(|| {
            let fallback = self.read_namespace_network();
            tracing::debug!(
                namespaces = fallback.as_ref().map_or(0, HashMap::len),
                "no socket listing, using per-namespace totals"
            );
            fallback
        })
    }
}
