use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;

use super::delta::UsageRecord;

/// How processes are folded together before ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Pid,
    #[serde(rename = "ppid")]
    ParentPid,
    Name,
}

impl GroupBy {
    pub fn from_str_config(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pid" => Some(GroupBy::Pid),
            "ppid" | "parent" => Some(GroupBy::ParentPid),
            "name" | "comm" => Some(GroupBy::Name),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupBy::Pid => "pid",
            GroupBy::ParentPid => "ppid",
            GroupBy::Name => "name",
        }
    }

    pub fn key_for(self, usage: &UsageRecord) -> TrackedKey {
        match self {
            GroupBy::Pid => TrackedKey::Pid {
                pid: usage.pid,
                name: usage.name.clone(),
            },
            GroupBy::ParentPid => TrackedKey::ParentPid(usage.ppid),
            GroupBy::Name => TrackedKey::Name(usage.name.clone()),
        }
    }
}

/// Identity under which history accumulates.
///
/// Per-pid keys include the name so a recycled pid starts a fresh history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TrackedKey {
    Pid { pid: u32, name: String },
    ParentPid(u32),
    Name(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Aggregate {
    pub key: TrackedKey,
    pub usage: UsageRecord,
}

/// Folds records sharing a key into one aggregate per key, ordered by key.
///
/// Shares add up (each dimension has a single denominator per cycle). The
/// member with the lowest pid provides the displayed pid, name and command
/// line; groups of more than one get their size appended to the name.
pub fn reduce(records: Vec<UsageRecord>, mode: GroupBy) -> Vec<Aggregate> {
    let mut groups: BTreeMap<TrackedKey, UsageRecord> = BTreeMap::new();

    for record in records {
        match groups.entry(mode.key_for(&record)) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let group = slot.get_mut();
                group.process_count += record.process_count;
                group.cpu_pct += record.cpu_pct;
                group.mem_pct += record.mem_pct;
                group.net_pct += record.net_pct;
                group.io_pct += record.io_pct;
                group.net_bytes = group.net_bytes.saturating_add(record.net_bytes);
                group.io_bytes = group.io_bytes.saturating_add(record.io_bytes);
                group.alive |= record.alive;
                if record.pid < group.pid {
                    group.pid = record.pid;
                    group.ppid = record.ppid;
                    group.name = record.name;
                    group.cmdline = record.cmdline;
                }
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, mut usage)| {
            if usage.process_count > 1 {
                usage.name = format!("{} ({})", usage.name, usage.process_count);
            }
            Aggregate { key, usage }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32, ppid: u32, name: &str, cpu: f64) -> UsageRecord {
        UsageRecord {
            pid,
            ppid,
            name: name.to_string(),
            process_count: 1,
            cpu_pct: cpu,
            mem_pct: 1.0,
            net_pct: 0.0,
            io_pct: 0.0,
            net_bytes: 10,
            io_bytes: 0,
            alive: true,
            cmdline: Some(format!("{name} --pid {pid}")),
        }
    }

    #[test]
    fn pid_mode_is_identity() {
        let records = vec![record(3, 1, "a", 1.0), record(2, 1, "b", 2.0)];
        let out = reduce(records, GroupBy::Pid);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].key,
            TrackedKey::Pid {
                pid: 2,
                name: "b".to_string()
            }
        );
        assert_eq!(out[0].usage.name, "b");
        assert_eq!(out[1].usage.process_count, 1);
    }

    #[test]
    fn name_mode_sums_and_keeps_lowest_pid() {
        let records = vec![
            record(30, 1, "chrome", 10.0),
            record(12, 1, "chrome", 5.5),
            record(44, 1, "chrome", 2.5),
            record(7, 1, "bash", 1.0),
        ];
        let out = reduce(records, GroupBy::Name);
        assert_eq!(out.len(), 2);

        let chrome = out
            .iter()
            .find(|a| a.key == TrackedKey::Name("chrome".to_string()))
            .unwrap();
        assert_eq!(chrome.usage.pid, 12);
        assert_eq!(chrome.usage.name, "chrome (3)");
        assert_eq!(chrome.usage.process_count, 3);
        assert_eq!(chrome.usage.cpu_pct, 18.0);
        assert_eq!(chrome.usage.mem_pct, 3.0);
        assert_eq!(chrome.usage.net_bytes, 30);
        assert_eq!(chrome.usage.cmdline.as_deref(), Some("chrome --pid 12"));

        let bash = out
            .iter()
            .find(|a| a.key == TrackedKey::Name("bash".to_string()))
            .unwrap();
        assert_eq!(bash.usage.name, "bash");
    }

    #[test]
    fn ppid_mode_groups_siblings() {
        let records = vec![
            record(10, 1, "init-child", 1.0),
            record(21, 20, "make", 4.0),
            record(22, 20, "cc1", 6.0),
        ];
        let out = reduce(records, GroupBy::ParentPid);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].key, TrackedKey::ParentPid(20));
        assert_eq!(out[1].usage.name, "make (2)");
        assert_eq!(out[1].usage.cpu_pct, 10.0);
    }

    #[test]
    fn parses_config_names() {
        assert_eq!(GroupBy::from_str_config("PPID"), Some(GroupBy::ParentPid));
        assert_eq!(GroupBy::from_str_config("name"), Some(GroupBy::Name));
        assert_eq!(GroupBy::from_str_config("pid"), Some(GroupBy::Pid));
        assert_eq!(GroupBy::from_str_config("user"), None);
    }
}
