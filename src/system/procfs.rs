//! Parsers for the `/proc` files the sampler reads.
//!
//! Pure functions over file contents so they can be tested with string inputs;
//! the readers that touch the filesystem live in `platform`.

use std::fmt;

use super::snapshot::{IoBytes, NetBytes};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// The fields of `/proc/[pid]/stat` the sampler needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub ppid: u32,
    pub utime: u64,
    pub stime: u64,
}

/// Parses `/proc/[pid]/stat`.
///
/// The comm field is wrapped in parentheses and may itself contain spaces and
/// parentheses, so it is cut out between the first `(` and the last `)`.
pub fn parse_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();
    let open = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;
    if close <= open {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid = content[..open]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;
    let comm = content[open + 1..close].to_string();

    // Fields after comm: state(0) ppid(1) pgrp(2) session(3) tty_nr(4)
    // tpgid(5) flags(6) minflt(7) cminflt(8) majflt(9) cmajflt(10)
    // utime(11) stime(12)
    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();
    let field = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields
            .get(idx)
            .ok_or_else(|| ParseError::new(format!("missing field {name}")))?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {name}")))
    };

    Ok(ProcStat {
        pid,
        comm,
        ppid: field(1, "ppid")? as u32,
        utime: field(11, "utime")?,
        stime: field(12, "stime")?,
    })
}

/// Parses `/proc/[pid]/statm`, returning `(size, resident)` in pages.
pub fn parse_statm(content: &str) -> Result<(u64, u64), ParseError> {
    let mut fields = content.split_whitespace();
    let mut next = |name: &str| -> Result<u64, ParseError> {
        fields
            .next()
            .ok_or_else(|| ParseError::new(format!("missing {name} in statm")))?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {name} in statm")))
    };
    let size = next("size")?;
    let resident = next("resident")?;
    Ok((size, resident))
}

/// Parses `/proc/[pid]/io`. Returns `None` unless both byte counters are present.
pub fn parse_io(content: &str) -> Option<IoBytes> {
    let mut read = None;
    let mut written = None;
    for line in content.lines() {
        if let Some(val) = line.strip_prefix("read_bytes:") {
            read = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("write_bytes:") {
            written = val.trim().parse().ok();
        }
    }
    Some(IoBytes {
        read: read?,
        written: written?,
    })
}

/// Joins the NUL-separated `/proc/[pid]/cmdline` tokens with spaces.
/// Kernel threads have an empty command line and yield `None`.
pub fn parse_cmdline(raw: &[u8]) -> Option<String> {
    let joined = raw
        .split(|&b| b == 0)
        .filter(|token| !token.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() { None } else { Some(joined) }
}

/// Sums user, nice, system, idle, iowait, irq, softirq and steal from the
/// aggregate `cpu` line of `/proc/stat`.
pub fn parse_cpu_total(content: &str) -> Result<u64, ParseError> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| ParseError::new("missing aggregate cpu line"))?;
    let ticks: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|v| v.parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ParseError::new("invalid cpu tick counter"))?;
    if ticks.len() < 8 {
        return Err(ParseError::new(format!(
            "expected 8 cpu tick counters, got {}",
            ticks.len()
        )));
    }
    Ok(ticks.iter().sum())
}

/// Parses `/proc/meminfo`, returning `(total_bytes, used_bytes)` where used is
/// `MemTotal - MemAvailable`.
pub fn parse_meminfo(content: &str) -> Result<(u64, u64), ParseError> {
    let mut total = None;
    let mut available = None;
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(label), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let kb: Option<u64> = value.parse().ok();
        match label {
            "MemTotal:" => total = kb,
            "MemAvailable:" => available = kb,
            _ => {}
        }
    }
    let total = total.ok_or_else(|| ParseError::new("missing MemTotal"))? * 1024;
    let available = available.ok_or_else(|| ParseError::new("missing MemAvailable"))? * 1024;
    Ok((total, total.saturating_sub(available)))
}

/// Sums received and transmitted bytes over all non-loopback interfaces in
/// `/proc/net/dev` (or a process's `/proc/[pid]/net/dev`, which shows its
/// network namespace).
pub fn parse_net_dev(content: &str) -> NetBytes {
    content
        .lines()
        .filter_map(|line| {
            let (iface, counters) = line.split_once(':')?;
            if iface.trim() == "lo" {
                return None;
            }
            let fields: Vec<&str> = counters.split_whitespace().collect();
            // rx: bytes packets errs drop fifo frame compressed multicast, then tx bytes
            let received: u64 = fields.first()?.parse().ok()?;
            let sent: u64 = fields.get(8)?.parse().ok()?;
            Some(NetBytes { sent, received })
        })
        .fold(NetBytes::default(), |acc, iface| NetBytes {
            sent: acc.sent.saturating_add(iface.sent),
            received: acc.received.saturating_add(iface.received),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "1234 (my (weird) proc) S 1 1234 1234 0 -1 4194560 1000 0 0 0 \
                        250 75 0 0 20 0 1 0 100 12345678 500 18446744073709551615";

    #[test]
    fn stat_with_embedded_parens() {
        let stat = parse_stat(STAT).unwrap();
        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "my (weird) proc");
        assert_eq!(stat.ppid, 1);
        assert_eq!(stat.utime, 250);
        assert_eq!(stat.stime, 75);
    }

    #[test]
    fn stat_truncated_is_error() {
        assert!(parse_stat("12 (sh) S 1 2").is_err());
        assert!(parse_stat("garbage").is_err());
    }

    #[test]
    fn statm_fields() {
        assert_eq!(parse_statm("2000 512 100 10 0 300 0\n").unwrap(), (2000, 512));
        assert!(parse_statm("").is_err());
    }

    #[test]
    fn io_counters() {
        let io = "rchar: 100\nwchar: 200\nsyscr: 3\nsyscw: 4\nread_bytes: 4096\nwrite_bytes: 8192\ncancelled_write_bytes: 0\n";
        assert_eq!(
            parse_io(io),
            Some(IoBytes {
                read: 4096,
                written: 8192
            })
        );
        assert_eq!(parse_io("rchar: 100\n"), None);
    }

    #[test]
    fn cmdline_joins_tokens() {
        assert_eq!(
            parse_cmdline(b"/usr/bin/python3\0-m\0http.server\0"),
            Some("/usr/bin/python3 -m http.server".to_string())
        );
        assert_eq!(parse_cmdline(b""), None);
    }

    #[test]
    fn cpu_total_sums_eight_counters() {
        let stat = "cpu  10 20 30 40 50 60 70 80 90 100\ncpu0 1 2 3 4 5 6 7 8 9 10\n";
        assert_eq!(parse_cpu_total(stat).unwrap(), 360);
        assert!(parse_cpu_total("cpu0 1 2 3\n").is_err());
    }

    #[test]
    fn meminfo_used_is_total_minus_available() {
        let meminfo = "MemTotal:       16000000 kB\nMemFree:         1000000 kB\nMemAvailable:    6000000 kB\n";
        let (total, used) = parse_meminfo(meminfo).unwrap();
        assert_eq!(total, 16_000_000 * 1024);
        assert_eq!(used, 10_000_000 * 1024);
    }

    #[test]
    fn net_dev_skips_loopback() {
        let dev = "Inter-|   Receive                                                |  Transmit\n \
                   face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n    \
                   lo: 5000 10 0 0 0 0 0 0 5000 10 0 0 0 0 0 0\n  \
                   eth0: 1000 10 0 0 0 0 0 0 250 5 0 0 0 0 0 0\n";
        let bytes = parse_net_dev(dev);
        assert_eq!(
            bytes,
            NetBytes {
                sent: 250,
                received: 1000
            }
        );
        assert_eq!(bytes.total(), 1250);
    }
}
