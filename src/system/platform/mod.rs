use std::time::Duration;

use super::source::SnapshotSource;

#[cfg(not(target_os = "linux"))]
mod fallback;
#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(target_os = "linux"))]
pub use fallback::SysinfoSource;
#[cfg(target_os = "linux")]
pub use linux::ProcfsSource;

/// Knobs for the platform snapshot source.
#[derive(Clone, Debug)]
pub struct SourceOptions {
    pub network: bool,
    pub ss_timeout: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        SourceOptions {
            network: true,
            ss_timeout: Duration::from_millis(2000),
        }
    }
}

/// The snapshot source for the running platform.
#[cfg(target_os = "linux")]
pub fn default_source(options: &SourceOptions) -> Box<dyn SnapshotSource + Send> {
    Box::new(ProcfsSource::new(options))
}

#[cfg(not(target_os = "linux"))]
pub fn default_source(options: &SourceOptions) -> Box<dyn SnapshotSource + Send> {
    Box::new(SysinfoSource::new(options, page_size()))
}

/// Memory page size in bytes, read once at startup.
#[cfg(unix)]
pub fn page_size() -> u64 {
    // SAFETY: sysconf has no side effects and is safe to call from any thread.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as u64 } else { 4096 }
}

#[cfg(not(unix))]
pub fn page_size() -> u64 {
    4096
}

/// Number of logical CPUs used to scale per-process CPU shares.
pub fn logical_cores() -> usize {
    let mut sys = sysinfo::System::new();
    sys.refresh_cpu_all();
    match sys.cpus().len() {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        n => n,
    }
}
