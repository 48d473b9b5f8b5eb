//! Blocking FIFO job queue for the worker pool
//!
//! Workers park on a condition variable while the queue is empty and are
//! woken by submissions or by `close()`. The queue is FIFO: dispatch order
//! (visible items before prefetch items) decides execution order, so no
//! priority structure is needed here.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct QueueState<J> {
    jobs: VecDeque<J>,
    closed: bool,
}

/// Blocking FIFO queue shared between the owner and the worker pool.
///
/// `submit` never blocks; `wait_pop` blocks until a job arrives or the
/// queue is closed. Closing is one-way: any job still queued is dropped
/// unexecuted, which is safe because results are generation-checked and
/// losing one is harmless.
pub struct JobQueue<J> {
    state: Mutex<QueueState<J>>,
    available: Condvar,
}

impl<J> JobQueue<J> {
    /// Create a new open, empty queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueue a job and wake one waiting worker.
    ///
    /// Jobs submitted after `close()` are dropped silently.
    pub fn submit(&self, job: J) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.jobs.push_back(job);
        drop(state);
        self.available.notify_one();
    }

    /// Block until a job is available or the queue is closed.
    ///
    /// Returns `None` once the queue is closed, even if jobs remain queued;
    /// those jobs are dropped when the queue itself is dropped.
    pub fn wait_pop(&self) -> Option<J> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.closed {
                return None;
            }
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            state = self.available.wait(state).unwrap();
        }
    }

    /// Close the queue and wake every waiting worker.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }

    /// Check whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.closed
    }

    /// Drop all queued jobs without closing the queue.
    ///
    /// Used on item-set rebuilds: jobs for the old generation would only be
    /// decoded and then discarded, so they are removed up front.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        let dropped = state.jobs.len();
        state.jobs.clear();
        dropped
    }

    /// Number of jobs currently queued.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.jobs.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<J> Default for JobQueue<J> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = JobQueue::new();

        queue.submit(1);
        queue.submit(2);
        queue.submit(3);

        assert_eq!(queue.wait_pop(), Some(1));
        assert_eq!(queue.wait_pop(), Some(2));
        assert_eq!(queue.wait_pop(), Some(3));
    }

    #[test]
    fn test_wait_pop_blocks_until_submit() {
        let queue = Arc::new(JobQueue::new());

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.wait_pop())
        };

        thread::sleep(Duration::from_millis(50));
        queue.submit(7u32);

        assert_eq!(waiter.join().unwrap(), Some(7));
    }

    #[test]
    fn test_close_wakes_waiters() {
        let queue: Arc<JobQueue<u32>> = Arc::new(JobQueue::new());

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.wait_pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), None);
        }
    }

    #[test]
    fn test_closed_queue_drops_pending_jobs() {
        let queue = JobQueue::new();

        queue.submit(1);
        queue.close();

        // Queued jobs are abandoned once closed.
        assert_eq!(queue.wait_pop(), None);
        // And new submissions are ignored.
        queue.submit(2);
        assert_eq!(queue.wait_pop(), None);
    }

    #[test]
    fn test_clear_drops_jobs_but_stays_open() {
        let queue = JobQueue::new();

        queue.submit(1);
        queue.submit(2);

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(!queue.is_closed());

        queue.submit(3);
        assert_eq!(queue.wait_pop(), Some(3));
    }

    #[test]
    fn test_len() {
        let queue = JobQueue::new();
        assert!(queue.is_empty());

        queue.submit(1);
        queue.submit(2);
        assert_eq!(queue.len(), 2);
    }
}
