//! Fixed-size worker pool used by both the Reader's read-ahead stage and
//! the Writer's compression stage.
//!
//! Backed by `rayon::ThreadPool`. Bounded-queue / blocking-submit semantics
//! are provided by a `crossbeam_channel::bounded` slot channel acting as a
//! semaphore: submitters block until a slot frees up, which is what keeps a
//! runaway producer from queuing unbounded work ahead of a slow sink.

use crossbeam_channel::{bounded, Receiver, Sender};
use rayon::ThreadPool as RayonPool;
use std::sync::{Arc, Condvar, Mutex};

// ---------------------------------------------------------------------------
// Job type.
// ---------------------------------------------------------------------------
type JobFn = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// Internal shared state that workers and submitters both access.
// ---------------------------------------------------------------------------
struct PoolState {
    pending: usize, // number of submitted-but-not-yet-finished jobs
}

/// A bounded worker pool with blocking submission and a `jobs_completed`
/// barrier. Used by the Reader for read-ahead decompression and by the
/// Writer for parallel member compression; neither imposes ordering here —
/// that is the caller's job via an ordered hand-off queue.
pub struct TPool {
    /// rayon thread pool that executes jobs.
    pool: Arc<RayonPool>,
    /// Bounded channel used as a semaphore: the sender slot limits how many
    /// jobs can be in-flight simultaneously (queue_size + nb_threads slots).
    /// Submitters acquire a slot before posting; workers release it on finish.
    slot_tx: Sender<()>,
    slot_rx: Receiver<()>,
    /// Shared counter of pending jobs plus a condvar for `jobs_completed`.
    state: Arc<(Mutex<PoolState>, Condvar)>,
}

impl TPool {
    /// Builds a pool of `nb_threads` workers accepting up to `queue_size`
    /// jobs ahead of what the workers can presently run. `nb_threads` and
    /// `queue_size` must both be at least 1; returns `None` otherwise.
    pub fn new(nb_threads: usize, queue_size: usize) -> Option<Self> {
        if nb_threads < 1 || queue_size < 1 {
            return None;
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_threads)
            .build()
            .ok()?;

        let capacity = queue_size + nb_threads;
        let (slot_tx, slot_rx) = bounded(capacity);
        // Pre-fill the channel so that `slot_rx.recv()` acts as "wait for a
        // free slot" (i.e. we send tokens to represent free slots).
        for _ in 0..capacity {
            slot_tx.send(()).ok()?;
        }

        let state = Arc::new((Mutex::new(PoolState { pending: 0 }), Condvar::new()));

        Some(TPool {
            pool: Arc::new(pool),
            slot_tx,
            slot_rx,
            state,
        })
    }

    /// Submits `job`, blocking the caller until a slot is available.
    pub fn submit_job(&self, job: JobFn) {
        self.slot_rx.recv().expect("threadpool slot channel closed");

        // Increment pending count before spawning so `jobs_completed` cannot
        // observe zero between submit and actual execution start.
        {
            let (lock, _cvar) = &*self.state;
            let mut s = lock.lock().unwrap();
            s.pending += 1;
        }

        let state = Arc::clone(&self.state);
        let slot_tx = self.slot_tx.clone();
        self.pool.spawn(move || {
            job();

            // Release the slot and decrement pending count.
            let (lock, cvar) = &*state;
            let mut s = lock.lock().unwrap();
            s.pending -= 1;
            if s.pending == 0 {
                cvar.notify_all();
            }
            // Return the semaphore token.
            let _ = slot_tx.send(());
        });
    }

    /// Blocks until all submitted jobs have finished. Does not shut down the
    /// pool; it can accept further jobs afterwards.
    pub fn jobs_completed(&self) {
        let (lock, cvar) = &*self.state;
        let mut s = lock.lock().unwrap();
        while s.pending > 0 {
            s = cvar.wait(s).unwrap();
        }
    }
}

impl Drop for TPool {
    /// Waits for all running jobs to finish then tears down the rayon pool.
    /// rayon's `ThreadPool` already joins workers on drop, so we only need
    /// to ensure no jobs are still in-flight first.
    fn drop(&mut self) {
        self.jobs_completed();
        // rayon::ThreadPool::drop joins all worker threads automatically.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn new_rejects_zero_threads_or_queue() {
        assert!(TPool::new(0, 4).is_none());
        assert!(TPool::new(4, 0).is_none());
    }

    #[test]
    fn jobs_completed_waits_for_all_submissions() {
        let pool = TPool::new(4, 8).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.submit_job(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.jobs_completed();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }
}
