//! Artgrid Core Library
//!
//! Asynchronous artwork cache and loader backing a scrolling tile grid.
//!
//! The grid's layout engine reports a viewport, the dispatcher computes
//! which items still need artwork, stamped decode jobs run on a bounded
//! worker pool, and completed bitmaps flow back to the owner thread where
//! they are validated (generation, continued existence, shutdown) before
//! landing in the byte-budgeted LRU store. Structural rebuilds of the item
//! set invalidate all in-flight work by bumping a generation counter;
//! stale results are discarded, never applied.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod grid;
pub mod source;

pub use artgrid_cache::{Bitmap, CacheStats, ItemKey};
pub use config::{ConfigError, GridConfig};
pub use dispatcher::{Dispatcher, LoadPlan, ScrollDirection};
pub use error::LoadError;
pub use grid::{ArtworkGridCache, DrainSummary, ThumbnailJob, ThumbnailOutcome};
pub use source::{ArtworkDecoder, ArtworkSource, TargetSize};
