use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillResult {
    Success(u32, &'static str),
    Failed(u32, String),
    NotFound(u32),
}

impl KillResult {
    pub fn message(&self) -> String {
        match self {
            KillResult::Success(pid, signal) => format!("Sent {signal} to PID {pid}"),
            KillResult::Failed(_, err) => err.clone(),
            KillResult::NotFound(pid) => format!("Process {pid} not found"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, KillResult::Success(..))
    }
}

/// Signals one process. Only that pid is refreshed first, so `sys` does not
/// need a full process table.
pub fn kill_process(sys: &mut System, pid: u32, signal: Signal) -> KillResult {
    let sysinfo_pid = Pid::from_u32(pid);
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[sysinfo_pid]),
        true,
        ProcessRefreshKind::nothing(),
    );
    match sys.process(sysinfo_pid) {
        Some(process) => {
            let signal_name = match signal {
                Signal::Term => "SIGTERM",
                Signal::Kill => "SIGKILL",
                _ => "signal",
            };
            match process.kill_with(signal) {
                Some(true) => KillResult::Success(pid, signal_name),
                Some(false) => {
                    KillResult::Failed(pid, format!("Failed to send {signal_name} to PID {pid}"))
                }
                None => {
                    // Signal not supported on this platform, fall back to kill()
                    if process.kill() {
                        KillResult::Success(pid, signal_name)
                    } else {
                        KillResult::Failed(
                            pid,
                            format!("Failed to kill PID {pid} (permission denied?)"),
                        )
                    }
                }
            }
        }
        None => KillResult::NotFound(pid),
    }
}
