//! Artgrid Cache Library
//!
//! Byte-budgeted artwork bitmap cache with LRU eviction and an adaptive
//! memory budget derived from system memory.

pub mod budget;
pub mod lru;

pub use budget::{AdaptiveBudget, BudgetConfig, FixedMemoryProbe, MemoryProbe, SystemMemoryProbe};
pub use lru::{Bitmap, CacheEntry, CacheStats, ItemKey, LruStore};
