//! Turns a before/after snapshot pair into per-process usage shares.

use serde::Serialize;

use crate::system::snapshot::{RawSnapshotEntry, Snapshot};

/// Derived usage for one process (or, after grouping, one group) over one
/// sampling interval.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsageRecord {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub process_count: usize,
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub net_pct: f64,
    pub io_pct: f64,
    /// Bytes sent plus received during the interval.
    pub net_bytes: u64,
    /// Bytes read plus written during the interval.
    pub io_bytes: u64,
    pub alive: bool,
    pub cmdline: Option<String>,
}

/// Host constants the shares are normalized against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizationParams {
    pub core_count: usize,
    pub page_size: u64,
}

fn counter_delta(before: Option<u64>, after: Option<u64>) -> Option<u64> {
    after?.checked_sub(before?)
}

fn share(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Computes usage for every process readable in both snapshots.
///
/// Processes seen in only one snapshot, or unreadable in either, get no
/// record. Counters that went backwards (wrap, pid reuse) count as zero.
/// Network and I/O shares are relative to the sum of all measurable process
/// deltas in the interval. Records are ordered by pid.
pub fn compute_usage(
    before: &Snapshot,
    after: &Snapshot,
    params: NormalizationParams,
) -> Vec<UsageRecord> {
    let global_cpu = after
        .globals
        .cpu_ticks
        .checked_sub(before.globals.cpu_ticks)
        .filter(|&ticks| ticks > 0);
    if global_cpu.is_none() {
        tracing::warn!(
            before = before.globals.cpu_ticks,
            after = after.globals.cpu_ticks,
            "system cpu ticks did not advance, cpu shares zeroed for this cycle"
        );
    }
    let used_memory = after.globals.memory_used;

    let mut pairs: Vec<(&RawSnapshotEntry, &RawSnapshotEntry)> = after
        .entries
        .iter()
        .filter_map(|(pid, a)| {
            let b = before.entries.get(pid)?;
            (a.readable && b.readable).then_some((b, a))
        })
        .collect();
    pairs.sort_by_key(|(_, a)| a.pid);

    let net_deltas: Vec<Option<u64>> = pairs
        .iter()
        .map(|(b, a)| counter_delta(b.net.map(|n| n.total()), a.net.map(|n| n.total())))
        .collect();
    let io_deltas: Vec<Option<u64>> = pairs
        .iter()
        .map(|(b, a)| counter_delta(b.io.map(|io| io.total()), a.io.map(|io| io.total())))
        .collect();
    let net_total: u64 = net_deltas.iter().flatten().sum();
    let io_total: u64 = io_deltas.iter().flatten().sum();

    pairs
        .iter()
        .zip(net_deltas.iter().zip(io_deltas.iter()))
        .map(|((b, a), (net, io))| {
            let cpu_pct = match global_cpu {
                Some(total) => a
                    .cpu_ticks()
                    .checked_sub(b.cpu_ticks())
                    .map(|ticks| ticks as f64 / total as f64 * 100.0 * params.core_count as f64)
                    .unwrap_or(0.0),
                None => 0.0,
            };
            let mem_pct = share(a.resident_pages.saturating_mul(params.page_size), used_memory);
            let net_bytes = net.unwrap_or(0);
            let io_bytes = io.unwrap_or(0);

            UsageRecord {
                pid: a.pid,
                ppid: a.ppid,
                name: a.name.clone(),
                process_count: 1,
                cpu_pct,
                mem_pct,
                net_pct: share(net_bytes, net_total),
                io_pct: share(io_bytes, io_total),
                net_bytes,
                io_bytes,
                alive: true,
                cmdline: a.cmdline.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::system::snapshot::{GlobalCounters, IoBytes, NetBytes};

    const PARAMS: NormalizationParams = NormalizationParams {
        core_count: 4,
        page_size: 4096,
    };

    fn entry(pid: u32, ticks: u64) -> RawSnapshotEntry {
        RawSnapshotEntry {
            pid,
            ppid: 1,
            name: format!("proc{pid}"),
            utime: ticks,
            readable: true,
            ..Default::default()
        }
    }

    fn snapshot(entries: Vec<RawSnapshotEntry>, cpu_ticks: u64) -> Snapshot {
        Snapshot::new(
            entries.into_iter().map(|e| (e.pid, e)).collect::<HashMap<_, _>>(),
            GlobalCounters {
                cpu_ticks,
                memory_used: 8_000_000_000,
                memory_total: 16_000_000_000,
                net_bytes: 0,
            },
        )
    }

    fn by_pid(records: &[UsageRecord], pid: u32) -> &UsageRecord {
        records.iter().find(|r| r.pid == pid).unwrap()
    }

    #[test]
    fn cpu_share_scales_by_cores() {
        let before = snapshot(vec![entry(1, 100), entry(2, 50)], 10_000);
        let after = snapshot(vec![entry(1, 350), entry(2, 50)], 11_000);
        let records = compute_usage(&before, &after, PARAMS);
        assert_eq!(by_pid(&records, 1).cpu_pct, 100.0);
        assert_eq!(by_pid(&records, 2).cpu_pct, 0.0);
    }

    #[test]
    fn stalled_system_ticks_zero_cpu() {
        let before = snapshot(vec![entry(1, 100)], 5_000);
        let after = snapshot(vec![entry(1, 300)], 5_000);
        let records = compute_usage(&before, &after, PARAMS);
        assert_eq!(records[0].cpu_pct, 0.0);

        let backwards = snapshot(vec![entry(1, 300)], 4_000);
        let records = compute_usage(&before, &backwards, PARAMS);
        assert_eq!(records[0].cpu_pct, 0.0);
    }

    #[test]
    fn pid_reuse_clamps_to_zero() {
        let before = snapshot(vec![entry(7, 900)], 1_000);
        let after = snapshot(vec![entry(7, 3)], 2_000);
        let records = compute_usage(&before, &after, PARAMS);
        assert_eq!(records[0].cpu_pct, 0.0);
    }

    #[test]
    fn memory_is_a_gauge_of_after() {
        let mut big = entry(1, 0);
        big.resident_pages = 500_000;
        let before = snapshot(vec![entry(1, 0)], 0);
        let after = snapshot(vec![big], 100);
        let records = compute_usage(&before, &after, PARAMS);
        assert!((records[0].mem_pct - 25.6).abs() < 1e-9);
    }

    #[test]
    fn zero_used_memory_gives_zero_share() {
        let mut e = entry(1, 0);
        e.resident_pages = 10;
        let before = snapshot(vec![e.clone()], 0);
        let mut after = snapshot(vec![e], 100);
        after.globals.memory_used = 0;
        let records = compute_usage(&before, &after, PARAMS);
        assert_eq!(records[0].mem_pct, 0.0);
    }

    #[test]
    fn network_needs_both_readings() {
        let with_net = |pid, total| RawSnapshotEntry {
            net: Some(NetBytes {
                sent: total,
                received: 0,
            }),
            ..entry(pid, 0)
        };
        let before = snapshot(vec![with_net(1, 1_000), with_net(2, 0), entry(3, 0)], 0);
        let after = snapshot(
            vec![with_net(1, 1_250), with_net(2, 750), with_net(3, 99_999)],
            100,
        );
        let records = compute_usage(&before, &after, PARAMS);
        assert_eq!(by_pid(&records, 1).net_pct, 25.0);
        assert_eq!(by_pid(&records, 2).net_pct, 75.0);
        // No "before" reading: contributes nothing, not its full counter.
        assert_eq!(by_pid(&records, 3).net_pct, 0.0);
        assert_eq!(by_pid(&records, 3).net_bytes, 0);
        assert_eq!(by_pid(&records, 1).net_bytes, 250);
    }

    #[test]
    fn io_share_of_summed_deltas() {
        let with_io = |pid, read| RawSnapshotEntry {
            io: Some(IoBytes { read, written: 0 }),
            ..entry(pid, 0)
        };
        let before = snapshot(vec![with_io(1, 0), with_io(2, 500)], 0);
        let after = snapshot(vec![with_io(1, 300), with_io(2, 400)], 100);
        let records = compute_usage(&before, &after, PARAMS);
        // pid 2 went backwards and counts as zero, so pid 1 owns all the I/O.
        assert_eq!(by_pid(&records, 1).io_pct, 100.0);
        assert_eq!(by_pid(&records, 2).io_pct, 0.0);
    }

    #[test]
    fn no_traffic_means_zero_shares() {
        let before = snapshot(vec![entry(1, 0)], 0);
        let after = snapshot(vec![entry(1, 0)], 100);
        let records = compute_usage(&before, &after, PARAMS);
        assert_eq!(records[0].net_pct, 0.0);
        assert_eq!(records[0].io_pct, 0.0);
    }

    #[test]
    fn one_sided_and_sentinel_entries_produce_nothing() {
        let before = snapshot(vec![entry(1, 0), entry(2, 0), entry(4, 0)], 0);
        let after = snapshot(
            vec![entry(1, 10), entry(3, 10), RawSnapshotEntry::unreadable(4)],
            100,
        );
        let records = compute_usage(&before, &after, PARAMS);
        let pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![1]);
    }

    #[test]
    fn repeated_pairs_are_deterministic() {
        let before = snapshot(vec![entry(1, 10), entry(2, 20), entry(3, 30)], 100);
        let after = snapshot(vec![entry(1, 40), entry(2, 25), entry(3, 90)], 400);
        let first = compute_usage(&before, &after, PARAMS);
        let second = compute_usage(&before, &after, PARAMS);
        assert_eq!(first, second);
    }
}
