//! Per-process TCP byte counters from `ss --tcp --info --processes`.

use std::collections::HashMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::snapshot::NetBytes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SocketCounters {
    pub pid: u32,
    pub fd: u32,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

fn leading_number(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].parse().ok()?, &s[end..]))
}

fn number_after<'a>(s: &'a str, label: &str) -> Option<(u64, &'a str)> {
    let start = s.find(label)? + label.len();
    leading_number(&s[start..])
}

/// Parses one line of `ss -tipHOn` output.
///
/// The line must contain `pid=<n>,fd=<n>` followed later by `bytes_sent:<n>`
/// and `bytes_received:<n>`; anything else yields `None`.
pub fn parse_ss_line(line: &str) -> Option<SocketCounters> {
    let (pid, fd, rest) = line.match_indices("pid=").find_map(|(idx, _)| {
        let (pid, rest) = leading_number(&line[idx + "pid=".len()..])?;
        let (fd, rest) = leading_number(rest.strip_prefix(",fd=")?)?;
        Some((pid, fd, rest))
    })?;
    let (bytes_sent, rest) = number_after(rest, "bytes_sent:")?;
    let (bytes_received, _) = number_after(rest, "bytes_received:")?;
    Some(SocketCounters {
        pid: u32::try_from(pid).ok()?,
        fd: u32::try_from(fd).ok()?,
        bytes_sent,
        bytes_received,
    })
}

/// Sums socket counters per pid. Unparsable lines are skipped.
pub fn aggregate_by_pid(output: &str) -> HashMap<u32, NetBytes> {
    let mut per_pid: HashMap<u32, NetBytes> = HashMap::new();
    for counters in output.lines().filter_map(parse_ss_line) {
        let entry = per_pid.entry(counters.pid).or_default();
        entry.sent = entry.sent.saturating_add(counters.bytes_sent);
        entry.received = entry.received.saturating_add(counters.bytes_received);
    }
    per_pid
}

/// Runs the socket listing command with a deadline.
#[derive(Clone, Debug)]
pub struct SocketListing {
    pub program: String,
    pub timeout: Duration,
    pub enabled: bool,
}

impl SocketListing {
    pub fn new(timeout: Duration) -> Self {
        SocketListing {
            program: "ss".to_string(),
            timeout,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        SocketListing {
            enabled: false,
            ..SocketListing::new(Duration::ZERO)
        }
    }

    /// Returns per-pid byte counters, or `None` when the listing is unavailable
    /// (command missing, non-zero exit, timeout, or no parsable line at all).
    pub fn read(&self) -> Option<HashMap<u32, NetBytes>> {
        if !self.enabled {
            return None;
        }
        let output = match self.run() {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(program = %self.program, error = %err, "socket listing unavailable");
                return None;
            }
        };
        let per_pid = aggregate_by_pid(&output);
        if per_pid.is_empty() && !output.trim().is_empty() {
            tracing::debug!("socket listing had no parsable process lines");
            return None;
        }
        Some(per_pid)
    }

    fn run(&self) -> std::io::Result<String> {
        let mut child = Command::new(&self.program)
            .args([
                "--tcp",
                "--info",
                "--processes",
                "--no-header",
                "--oneline",
                "--numeric",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Drain stdout on a helper thread so a large listing cannot fill the
        // pipe and stall the child while we wait on it.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout not captured"))?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("{} did not finish within {:?}", self.program, self.timeout),
                ));
            }
            thread::sleep(Duration::from_millis(10));
        };

        let buf = reader
            .join()
            .map_err(|_| std::io::Error::other("stdout reader panicked"))??;
        if !status.success() {
            return Err(std::io::Error::other(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "ESTAB 0      0                               \
        192.168.43.58:53056               194.35.102.50:443 \
        users:((\"firefox-bin\",pid=1367,fd=7)) \
        cubic wscale:7,7 rto:303.333 rtt:95.077/48.14 ato:40 \
        mss:1348 pmtu:1500 rcvmss:1348 advmss:1448 cwnd:7 \
        ssthresh:4 bytes_sent:276685 bytes_retrans:524 \
        bytes_acked:276162 bytes_received:810911 segs_out:1827 \
        segs_in:1334 data_segs_out:806 data_segs_in:1223 send \
        793967bps lastsnd:800 lastrcv:667 lastack:667";

    #[test]
    fn parses_full_socket_line() {
        assert_eq!(
            parse_ss_line(FIREFOX),
            Some(SocketCounters {
                pid: 1367,
                fd: 7,
                bytes_sent: 276685,
                bytes_received: 810911,
            })
        );
    }

    #[test]
    fn line_without_process_is_skipped() {
        let line = "ESTAB 0 0 10.0.0.1:22 10.0.0.2:5555 cubic bytes_sent:10 bytes_received:20";
        assert_eq!(parse_ss_line(line), None);
    }

    #[test]
    fn line_without_byte_counters_is_skipped() {
        let line = "LISTEN 0 128 0.0.0.0:22 0.0.0.0:* users:((\"sshd\",pid=900,fd=3)) cubic";
        assert_eq!(parse_ss_line(line), None);
    }

    #[test]
    fn aggregates_multiple_sockets_per_pid() {
        let output = format!(
            "{FIREFOX}\n\
             ESTAB users:((\"firefox-bin\",pid=1367,fd=9)) bytes_sent:15 bytes_received:5\n\
             ESTAB users:((\"curl\",pid=42,fd=3)) bytes_sent:1 bytes_received:2\n\
             garbage\n"
        );
        let per_pid = aggregate_by_pid(&output);
        assert_eq!(per_pid.len(), 2);
        assert_eq!(
            per_pid[&1367],
            NetBytes {
                sent: 276700,
                received: 810916
            }
        );
        assert_eq!(per_pid[&42].total(), 3);
    }

    #[test]
    fn missing_program_is_unavailable() {
        let sockets = SocketListing {
            program: "/nonexistent/healthy-ss".to_string(),
            ..SocketListing::new(Duration::from_millis(200))
        };
        assert!(sockets.read().is_none());
        assert!(SocketListing::disabled().read().is_none());
    }
}
