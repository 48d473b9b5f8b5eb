//! Decode worker pool
//!
//! A fixed-size pool of threads draining the job queue. Each worker waits
//! on the queue's condition variable, pops one job, executes it outside
//! any lock, and posts the outcome on the result channel. Workers hold only
//! plain copies of job parameters; results cross back to the owner as
//! owned messages.

use crate::{JobQueue, ShutdownToken};
use std::sync::{mpsc::Sender, Arc};
use std::thread::{self, JoinHandle};

/// Callback invoked by workers for each job they pull.
///
/// The executor receives the job parameters and produces an owned outcome.
/// It should check the shutdown token and the job's generation stamp before
/// doing expensive work, and report a cancelled outcome instead of decoding.
pub type JobExecutor<J, O> = Arc<dyn Fn(&J) -> O + Send + Sync>;

/// Configuration for the decode worker pool.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads to spawn.
    ///
    /// Default: 4. The bottleneck is source I/O plus decode latency, not
    /// raw compute, so the pool is not scaled to core count.
    pub num_workers: usize,

    /// Prefix used for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            thread_name_prefix: "artwork-decode".to_string(),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a configuration with the given worker count.
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            ..Default::default()
        }
    }

    /// Set the thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

/// Fixed-size decode worker pool.
///
/// Jobs are popped from the shared [`JobQueue`]; outcomes are posted on an
/// `mpsc` channel whose receiver lives on the owner thread. If the owner
/// has already dropped the receiver, outcomes are silently discarded.
///
/// # Example
///
/// ```
/// use artgrid_scheduler::{JobQueue, ShutdownToken, WorkerPool, WorkerPoolConfig};
/// use std::sync::{mpsc, Arc};
///
/// let queue = Arc::new(JobQueue::new());
/// let shutdown = ShutdownToken::new();
/// let (tx, rx) = mpsc::channel();
///
/// let pool = WorkerPool::new(
///     Arc::clone(&queue),
///     Arc::new(|job: &u32| job + 1),
///     tx,
///     shutdown.clone(),
///     WorkerPoolConfig::new(2),
/// );
///
/// queue.submit(1);
/// assert_eq!(rx.recv().unwrap(), 2);
///
/// pool.shutdown_and_join();
/// ```
pub struct WorkerPool<J> {
    queue: Arc<JobQueue<J>>,
    shutdown: ShutdownToken,
    workers: Vec<Worker>,
}

impl<J: Send + 'static> WorkerPool<J> {
    /// Create and start a new worker pool.
    pub fn new<O: Send + 'static>(
        queue: Arc<JobQueue<J>>,
        executor: JobExecutor<J, O>,
        results: Sender<O>,
        shutdown: ShutdownToken,
        config: WorkerPoolConfig,
    ) -> Self {
        let mut workers = Vec::with_capacity(config.num_workers);

        for id in 0..config.num_workers {
            let worker = Worker::new(
                id,
                &config.thread_name_prefix,
                Arc::clone(&queue),
                Arc::clone(&executor),
                results.clone(),
                shutdown.clone(),
            );
            workers.push(worker);
        }

        Self {
            queue,
            shutdown,
            workers,
        }
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Check if the pool is shutting down.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Shut down and wait for all workers to exit.
    ///
    /// Queued jobs are dropped unexecuted. Blocks until every worker has
    /// finished its current job and terminated.
    pub fn shutdown_and_join(mut self) {
        self.begin_shutdown();
        for worker in self.workers.drain(..) {
            worker.join();
        }
    }

    /// Shut down without waiting.
    ///
    /// Workers finish their current job (posting a result nobody reads)
    /// and exit in the background.
    pub fn shutdown_nowait(mut self) {
        self.begin_shutdown();
        self.workers.clear();
    }

    fn begin_shutdown(&self) {
        self.shutdown.trigger();
        self.queue.close();
    }
}

impl<J> Drop for WorkerPool<J> {
    fn drop(&mut self) {
        // Detached workers exit on their own once the queue closes.
        self.shutdown.trigger();
        self.queue.close();
    }
}

/// A single worker thread in the pool.
struct Worker {
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn new<J: Send + 'static, O: Send + 'static>(
        id: usize,
        name_prefix: &str,
        queue: Arc<JobQueue<J>>,
        executor: JobExecutor<J, O>,
        results: Sender<O>,
        shutdown: ShutdownToken,
    ) -> Self {
        let thread = thread::Builder::new()
            .name(format!("{}-{}", name_prefix, id))
            .spawn(move || {
                Self::run(id, queue, executor, results, shutdown);
            })
            .expect("Failed to spawn worker thread");

        Self {
            thread: Some(thread),
        }
    }

    /// Main worker loop.
    ///
    /// Blocks on the queue until a job arrives or the queue closes; the
    /// executor runs outside any lock.
    fn run<J, O>(
        id: usize,
        queue: Arc<JobQueue<J>>,
        executor: JobExecutor<J, O>,
        results: Sender<O>,
        shutdown: ShutdownToken,
    ) {
        loop {
            if shutdown.is_triggered() {
                break;
            }

            let Some(job) = queue.wait_pop() else {
                break;
            };

            let outcome = executor(&job);

            // The owner may already be gone during teardown.
            if results.send(outcome).is_err() {
                break;
            }
        }
        log::debug!("worker {} exiting", id);
    }

    fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().expect("Worker thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_config_default() {
        let config = WorkerPoolConfig::default();
        assert_eq!(config.num_workers, 4);
    }

    #[test]
    fn test_config_enforces_at_least_one_worker() {
        let config = WorkerPoolConfig::new(0);
        assert_eq!(config.num_workers, 1);
    }

    #[test]
    fn test_pool_executes_jobs_and_posts_outcomes() {
        let queue = Arc::new(JobQueue::new());
        let shutdown = ShutdownToken::new();
        let (tx, rx) = mpsc::channel();

        let pool = WorkerPool::new(
            Arc::clone(&queue),
            Arc::new(|job: &u32| job * 10),
            tx,
            shutdown,
            WorkerPoolConfig::new(2),
        );

        for i in 1..=5 {
            queue.submit(i);
        }

        let mut outcomes: Vec<u32> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        outcomes.sort_unstable();
        assert_eq!(outcomes, vec![10, 20, 30, 40, 50]);

        pool.shutdown_and_join();
    }

    #[test]
    fn test_shutdown_drops_queued_jobs() {
        let queue = Arc::new(JobQueue::new());
        let shutdown = ShutdownToken::new();
        let (tx, rx) = mpsc::channel();
        let executed = Arc::new(AtomicUsize::new(0));

        let executor = {
            let executed = Arc::clone(&executed);
            Arc::new(move |job: &u32| {
                executed.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(30));
                *job
            })
        };

        let pool = WorkerPool::new(
            Arc::clone(&queue),
            executor,
            tx,
            shutdown,
            WorkerPoolConfig::new(1),
        );

        for i in 0..20 {
            queue.submit(i);
        }
        thread::sleep(Duration::from_millis(10));

        pool.shutdown_and_join();
        drop(rx);

        // The single worker cannot have drained 20 slow jobs.
        assert!(executed.load(Ordering::SeqCst) < 20);
    }

    #[test]
    fn test_workers_exit_when_owner_drops_receiver() {
        let queue = Arc::new(JobQueue::new());
        let shutdown = ShutdownToken::new();
        let (tx, rx) = mpsc::channel();

        let pool = WorkerPool::new(
            Arc::clone(&queue),
            Arc::new(|job: &u32| *job),
            tx,
            shutdown,
            WorkerPoolConfig::new(1),
        );

        drop(rx);
        queue.submit(1);
        // Worker observes the dead channel on its next send and exits.
        thread::sleep(Duration::from_millis(50));

        pool.shutdown_and_join();
    }

    #[test]
    fn test_is_shutting_down() {
        let queue: Arc<JobQueue<u32>> = Arc::new(JobQueue::new());
        let shutdown = ShutdownToken::new();
        let (tx, _rx) = mpsc::channel::<u32>();

        let pool = WorkerPool::new(
            Arc::clone(&queue),
            Arc::new(|job: &u32| *job),
            tx,
            shutdown.clone(),
            WorkerPoolConfig::new(1),
        );

        assert!(!pool.is_shutting_down());
        shutdown.trigger();
        assert!(pool.is_shutting_down());

        pool.shutdown_and_join();
    }

    #[test]
    fn test_named_threads() {
        let queue = Arc::new(JobQueue::new());
        let shutdown = ShutdownToken::new();
        let (tx, rx) = mpsc::channel();

        let pool = WorkerPool::new(
            Arc::clone(&queue),
            Arc::new(|_job: &u32| {
                thread::current()
                    .name()
                    .map(|n| n.to_string())
                    .unwrap_or_default()
            }),
            tx,
            shutdown,
            WorkerPoolConfig::new(1).with_thread_name_prefix("art-test"),
        );

        queue.submit(0);
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name, "art-test-0");

        pool.shutdown_and_join();
    }
}
