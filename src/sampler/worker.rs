use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use tokio::sync::mpsc::UnboundedSender;

use super::{CycleReport, Sampler};
use crate::system::source::SnapshotSource;

/// Owner side of the background sampling thread.
///
/// Dropping the handle asks the thread to stop after its current cycle.
pub struct SamplerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Stops the thread and waits for the cycle in flight to finish.
    pub fn join(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::warn!("sampler thread panicked");
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs `sampler` on its own thread, sending one report per cycle.
///
/// The loop ends when stopped or when the receiving side is gone.
pub fn spawn<S>(mut sampler: Sampler<S>, tx: UnboundedSender<CycleReport>) -> io::Result<SamplerHandle>
where
    S: SnapshotSource + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let thread = std::thread::Builder::new()
        .name("healthy-sampler".to_string())
        .spawn(move || {
            tracing::info!(
                period_ms = sampler.config().sample_period.as_millis() as u64,
                window = sampler.config().window,
                group_by = sampler.config().group_by.label(),
                "sampler started"
            );
            while !flag.load(Ordering::Relaxed) {
                let report = sampler.run_cycle();
                if tx.send(report).is_err() {
                    break;
                }
            }
            tracing::info!(cycles = sampler.cycles(), "sampler stopped");
        })?;

    Ok(SamplerHandle {
        stop,
        thread: Some(thread),
    })
}
