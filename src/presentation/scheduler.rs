use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, ThreadId};

use tracing::{debug, warn};

pub type Job = Box<dyn FnOnce() + Send>;

/// Marshals completions onto a designated execution context with one rule:
/// run the job inline when the caller is already on that context, otherwise
/// enqueue it. Implemented once and shared by every adapter, so callers who
/// already hold the context never pay a scheduling round-trip.
pub trait Scheduler: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Scheduler around one dedicated thread, the stand-in for a UI thread.
/// Jobs dispatched from that thread run synchronously; jobs from anywhere
/// else are queued and run in FIFO order.
pub struct DesignatedThreadScheduler {
    thread_id: ThreadId,
    tx: mpsc::Sender<Job>,
}

impl DesignatedThreadScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name("freshet-dispatch".into())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    // A panicking job must not take the thread down with it.
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        warn!("dispatched job panicked");
                    }
                }
                debug!("dispatch thread finished");
            })
            .expect("Failed to spawn dispatch thread");

        Self {
            thread_id: handle.thread().id(),
            tx,
        }
    }
}

impl Default for DesignatedThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for DesignatedThreadScheduler {
    fn dispatch(&self, job: Job) {
        if thread::current().id() == self.thread_id {
            job();
        } else if self.tx.send(job).is_err() {
            warn!("dispatch thread is gone, dropping job");
        }
    }
}

/// Runs every job inline on the calling thread. For tests and for callers
/// with no thread affinity requirement.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn dispatch(&self, job: Job) {
        job();
    }
}
