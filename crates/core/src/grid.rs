//! Owner-side artwork grid cache
//!
//! [`ArtworkGridCache`] is the facade the grid view talks to. It owns the
//! LRU store, the item table, the in-flight set, and the result channel
//! receiver; decode work runs on the bounded worker pool and crosses back
//! only as owned [`ThumbnailOutcome`] messages. Every delivered result is
//! re-validated on arrival: shutdown, generation, and continued existence
//! of the item are all checked before anything touches the store.

use crate::config::GridConfig;
use crate::dispatcher::Dispatcher;
use crate::error::LoadError;
use crate::source::{ArtworkDecoder, ArtworkSource, TargetSize};
use artgrid_cache::{AdaptiveBudget, Bitmap, CacheEntry, CacheStats, ItemKey, LruStore};
use artgrid_scheduler::{
    Generation, GenerationGuard, JobExecutor, JobQueue, ShutdownToken, WorkerPool,
    WorkerPoolConfig,
};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

/// Parameters for one decode job.
///
/// Plain copies only: workers never hold a pointer into owner memory.
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    /// Item the artwork belongs to.
    pub item: ItemKey,

    /// Requested bitmap size.
    pub target: TargetSize,

    /// Generation current at submission time.
    pub generation: Generation,
}

/// Completed decode job, posted back to the owner thread.
#[derive(Debug)]
pub struct ThumbnailOutcome {
    /// Item the artwork belongs to.
    pub item: ItemKey,

    /// Generation stamped at submission.
    pub generation: Generation,

    /// Size the job was asked to produce.
    pub target: TargetSize,

    /// The decoded bitmap, or why there is none.
    pub result: Result<Bitmap, LoadError>,
}

/// Counts from one result-drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Results pulled off the channel.
    pub delivered: usize,

    /// Bitmaps inserted into the store.
    pub inserted: usize,

    /// Items marked resolved-without-bitmap (terminal failures).
    pub resolved_without_bitmap: usize,

    /// Results discarded for a stale generation.
    pub discarded_stale: usize,

    /// Results discarded because the item left the current set.
    pub discarded_missing: usize,

    /// Results discarded because shutdown had begun.
    pub discarded_shutdown: usize,

    /// Transient failures eligible for re-dispatch.
    pub retryable: usize,
}

impl DrainSummary {
    /// Whether the grid should repaint after this drain.
    pub fn needs_redraw(&self) -> bool {
        self.inserted > 0 || self.resolved_without_bitmap > 0
    }
}

/// Asynchronous artwork cache for a scrolling tile grid.
///
/// Single-threaded owner facade over the decode pipeline. All methods are
/// called from the owner (UI) thread and none of them block: dispatch and
/// drain are polled from the redraw/timer cycle.
///
/// # Example
///
/// ```no_run
/// use artgrid_core::{ArtworkGridCache, GridConfig};
/// # use artgrid_core::{ArtworkDecoder, ArtworkSource, LoadError, TargetSize};
/// # use artgrid_core::Bitmap;
/// # struct Lib;
/// # impl ArtworkSource for Lib {
/// #     fn fetch(&self, _: u64) -> Result<Vec<u8>, LoadError> { Err(LoadError::SourceUnavailable) }
/// # }
/// # struct Codec;
/// # impl ArtworkDecoder for Codec {
/// #     fn decode_and_resize(&self, _: &[u8], _: TargetSize) -> Result<Bitmap, LoadError> {
/// #         Err(LoadError::DecodeFailed("stub".into()))
/// #     }
/// # }
/// use std::sync::Arc;
///
/// let mut grid = ArtworkGridCache::new(Arc::new(Lib), Arc::new(Codec), GridConfig::default());
///
/// grid.on_item_set_changed(vec![101, 102, 103]);
/// grid.set_viewport(0, 3);
///
/// // From the redraw/timer cycle:
/// let summary = grid.tick();
/// if summary.needs_redraw() {
///     // repaint visible cells
/// }
/// if let Some(bitmap) = grid.get_cached_bitmap(101) {
///     // draw it; None means placeholder
/// }
///
/// grid.shutdown();
/// ```
pub struct ArtworkGridCache {
    config: GridConfig,
    store: LruStore,
    budget: AdaptiveBudget,
    guard: GenerationGuard,
    shutdown: ShutdownToken,
    queue: Arc<JobQueue<ThumbnailJob>>,
    pool: Option<WorkerPool<ThumbnailJob>>,
    results: Receiver<ThumbnailOutcome>,
    dispatcher: Dispatcher,

    /// Current item set, index order matching the grid layout.
    items: Vec<ItemKey>,

    /// Membership view of `items` for delivery-time existence checks.
    members: HashSet<ItemKey>,

    /// Items with a submitted but undelivered job. Doubles as the dedup
    /// structure: at most one job per item, ever.
    in_flight: HashSet<ItemKey>,

    /// Items that terminally resolved without artwork this generation.
    resolved_without_bitmap: HashSet<ItemKey>,

    shut_down: bool,
}

impl ArtworkGridCache {
    /// Create a grid cache with an adaptive budget from the platform
    /// memory probe.
    pub fn new(
        source: Arc<dyn ArtworkSource>,
        decoder: Arc<dyn ArtworkDecoder>,
        config: GridConfig,
    ) -> Self {
        Self::with_budget(source, decoder, config, AdaptiveBudget::with_system_probe())
    }

    /// Create a grid cache with an explicit budget.
    pub fn with_budget(
        source: Arc<dyn ArtworkSource>,
        decoder: Arc<dyn ArtworkDecoder>,
        config: GridConfig,
        budget: AdaptiveBudget,
    ) -> Self {
        let store = LruStore::new(budget.current());
        let guard = GenerationGuard::new();
        let shutdown = ShutdownToken::new();
        let queue = Arc::new(JobQueue::new());
        let (tx, rx) = mpsc::channel();

        let executor: JobExecutor<ThumbnailJob, ThumbnailOutcome> = {
            let guard = guard.clone();
            let shutdown = shutdown.clone();
            Arc::new(move |job: &ThumbnailJob| {
                // Cheap relevance check before the expensive fetch+decode.
                if shutdown.is_triggered() || !guard.is_current(job.generation) {
                    return ThumbnailOutcome {
                        item: job.item,
                        generation: job.generation,
                        target: job.target,
                        result: Err(LoadError::Cancelled),
                    };
                }
                let result = source
                    .fetch(job.item)
                    .and_then(|bytes| decoder.decode_and_resize(&bytes, job.target));
                ThumbnailOutcome {
                    item: job.item,
                    generation: job.generation,
                    target: job.target,
                    result,
                }
            })
        };

        let pool = WorkerPool::new(
            Arc::clone(&queue),
            executor,
            tx,
            shutdown.clone(),
            WorkerPoolConfig::new(config.num_workers),
        );

        let dispatcher = Dispatcher::new(config.prefetch_window);

        Self {
            config,
            store,
            budget,
            guard,
            shutdown,
            queue,
            pool: Some(pool),
            results: rx,
            dispatcher,
            items: Vec::new(),
            members: HashSet::new(),
            in_flight: HashSet::new(),
            resolved_without_bitmap: HashSet::new(),
            shut_down: false,
        }
    }

    /// Record the viewport reported by the layout engine.
    ///
    /// Called after each layout pass; does not dispatch by itself.
    pub fn set_viewport(&mut self, first_visible: usize, last_visible: usize) {
        self.dispatcher.update_viewport(first_visible, last_visible);
    }

    /// Look up a cached bitmap for a visible cell.
    ///
    /// `None` while pending or resolved-without-artwork; the renderer draws
    /// a placeholder. Never triggers a load: loads originate only from
    /// [`dispatch_missing`](Self::dispatch_missing).
    pub fn get_cached_bitmap(&self, item: ItemKey) -> Option<Bitmap> {
        self.store.get(item)
    }

    /// Replace the item set after a structural rebuild.
    ///
    /// Bumps the generation (invalidating every in-flight job), drops
    /// queued jobs, clears the per-generation resolution flags, and purges
    /// cache entries not referenced by the new set. Entries for unchanged
    /// groups keep their identity and survive the rebuild.
    pub fn on_item_set_changed(&mut self, items: Vec<ItemKey>) {
        let generation = self.guard.bump();
        let dropped = self.queue.clear();
        self.in_flight.clear();
        self.resolved_without_bitmap.clear();

        self.members = items.iter().copied().collect();
        let purged = {
            let members = &self.members;
            self.store.retain(|key| members.contains(&key))
        };
        self.items = items;

        log::debug!(
            "item set rebuilt: generation {}, {} items, {} queued jobs dropped, {} entries purged",
            generation,
            self.items.len(),
            dropped,
            purged
        );
    }

    /// Submit jobs for items the viewport needs that are neither cached
    /// nor in flight nor already resolved.
    ///
    /// Bounded three ways: the global in-flight cap, and per-cycle caps on
    /// visible and prefetch submissions so one call never floods the pool.
    /// The remainder is picked up on the next redraw/timer cycle. Returns
    /// the number of jobs submitted.
    pub fn dispatch_missing(&mut self) -> usize {
        if self.shut_down {
            return 0;
        }

        self.store.set_budget(self.budget.refresh());

        let plan = self.dispatcher.plan(self.items.len());
        let generation = self.guard.current();
        let mut submitted = 0;

        let mut visible_left = self.config.visible_per_cycle;
        for &index in &plan.visible {
            if visible_left == 0 {
                break;
            }
            if self.submit_if_missing(self.items[index], generation) {
                visible_left -= 1;
                submitted += 1;
            }
        }

        let mut prefetch_left = self.config.prefetch_per_cycle;
        for &index in &plan.prefetch {
            if prefetch_left == 0 {
                break;
            }
            if self.submit_if_missing(self.items[index], generation) {
                prefetch_left -= 1;
                submitted += 1;
            }
        }

        submitted
    }

    fn submit_if_missing(&mut self, item: ItemKey, generation: Generation) -> bool {
        if self.in_flight.len() >= self.config.max_in_flight {
            return false;
        }
        if self.store.contains(item)
            || self.in_flight.contains(&item)
            || self.resolved_without_bitmap.contains(&item)
        {
            return false;
        }

        self.in_flight.insert(item);
        self.queue.submit(ThumbnailJob {
            item,
            target: self.config.target_size,
            generation,
        });
        true
    }

    /// Drain completed jobs from the result channel.
    ///
    /// Non-blocking; called from the redraw/timer cycle. This is the only
    /// point where worker-produced data crosses into owner-owned
    /// structures, and every result is validated here: shutdown first,
    /// then generation, then continued existence of the item.
    pub fn drain_results(&mut self) -> DrainSummary {
        let mut summary = DrainSummary::default();

        while let Ok(outcome) = self.results.try_recv() {
            summary.delivered += 1;

            if self.shut_down || self.shutdown.is_triggered() {
                summary.discarded_shutdown += 1;
                continue;
            }

            if !self.guard.is_current(outcome.generation) {
                // The in-flight marker for this item was already cleared by
                // the rebuild; a same-key job for the new generation may
                // exist, so the marker must not be touched here.
                log::trace!("discarding stale result for item {:#x}", outcome.item);
                summary.discarded_stale += 1;
                continue;
            }

            self.in_flight.remove(&outcome.item);

            if !self.members.contains(&outcome.item) {
                summary.discarded_missing += 1;
                continue;
            }

            match outcome.result {
                Ok(bitmap) => {
                    self.store.insert(outcome.item, CacheEntry::new(bitmap));
                    summary.inserted += 1;
                }
                Err(err) if err.is_terminal() => {
                    log::debug!("item {:#x} resolved without artwork: {}", outcome.item, err);
                    self.resolved_without_bitmap.insert(outcome.item);
                    summary.resolved_without_bitmap += 1;
                }
                Err(_) => {
                    // Transient: the cleared marker makes the item eligible
                    // for re-dispatch on a later cycle.
                    summary.retryable += 1;
                }
            }
        }

        summary
    }

    /// One owner-loop cycle: drain results, then dispatch missing items.
    pub fn tick(&mut self) -> DrainSummary {
        let summary = self.drain_results();
        self.dispatch_missing();
        summary
    }

    /// Begin teardown. Returns promptly.
    ///
    /// No new jobs are submitted after this; in-flight jobs finish on
    /// their own and their results self-discard. The store is bulk-cleared
    /// under the same lock insert/evict use. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.shutdown.trigger();

        if let Some(pool) = self.pool.take() {
            pool.shutdown_nowait();
        }

        self.in_flight.clear();
        self.store.clear_all();
        log::debug!("artwork grid cache shut down");
    }

    /// Whether shutdown has begun.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Number of jobs currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of items terminally resolved without artwork this generation.
    pub fn resolved_without_bitmap_count(&self) -> usize {
        self.resolved_without_bitmap.len()
    }

    /// The generation of the current item set.
    pub fn current_generation(&self) -> Generation {
        self.guard.current()
    }

    /// Cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }
}

impl Drop for ArtworkGridCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}
