//! Artgrid Scheduler Library
//!
//! Bounded worker pool with a blocking job queue, a monotonic generation
//! guard for invalidating in-flight work, and an owner-constructed shutdown
//! token.
//!
//! Jobs are plain parameter structs; workers never hold a pointer into
//! owner memory. Completed work flows back to the owner as owned messages
//! over a channel, and the owner re-validates every result (generation,
//! continued relevance) at delivery time.
//!
//! # Example
//!
//! ```
//! use artgrid_scheduler::{JobQueue, ShutdownToken, WorkerPool, WorkerPoolConfig};
//! use std::sync::{mpsc, Arc};
//!
//! let queue = Arc::new(JobQueue::new());
//! let shutdown = ShutdownToken::new();
//! let (tx, rx) = mpsc::channel();
//!
//! let executor = Arc::new(|job: &u64| *job * 2);
//! let pool = WorkerPool::new(
//!     Arc::clone(&queue),
//!     executor,
//!     tx,
//!     shutdown.clone(),
//!     WorkerPoolConfig::new(2),
//! );
//!
//! queue.submit(21);
//! assert_eq!(rx.recv().unwrap(), 42);
//!
//! pool.shutdown_and_join();
//! ```

mod generation;
mod queue;
mod shutdown;
mod worker;

// Re-export public API
pub use generation::{Generation, GenerationGuard};
pub use queue::JobQueue;
pub use shutdown::ShutdownToken;
pub use worker::{JobExecutor, WorkerPool, WorkerPoolConfig};
