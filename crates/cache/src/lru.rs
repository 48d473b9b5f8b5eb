//! RAM artwork cache with LRU eviction
//!
//! Provides in-memory caching of decoded, resized artwork bitmaps with
//! automatic eviction based on Least Recently Used (LRU) policy when the
//! byte budget is reached. Eviction happens *before* an insert is placed,
//! so the budget invariant holds after every insert.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A cache key that uniquely identifies one grid item's artwork.
///
/// This is a simple u64 hash key. In practice it is derived by the grouping
/// collaborator from the group's constituent elements, and is stable across
/// rebuilds only when the group is unchanged.
pub type ItemKey = u64;

/// A decoded, resized artwork bitmap (RGBA format).
///
/// Pixel data is shared behind an `Arc`, so cloning a `Bitmap` out of the
/// cache for the duration of a draw is cheap and never copies pixels.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixels: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl Bitmap {
    /// Create a bitmap from raw RGBA pixel data.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels: pixels.into(),
            width,
            height,
        }
    }

    /// Raw pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Memory footprint of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// A cached artwork entry.
///
/// Exclusively owned by the store once inserted; the renderer receives a
/// cheap `Bitmap` clone, never a reference into the store.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The decoded bitmap.
    pub bitmap: Bitmap,

    /// Byte footprint charged against the budget.
    pub bytes: usize,

    /// Monotonic touch stamp; larger means more recently used.
    pub last_touch: u64,
}

impl CacheEntry {
    /// Create an entry from a bitmap; the footprint is the pixel size.
    pub fn new(bitmap: Bitmap) -> Self {
        let bytes = bitmap.byte_len();
        Self {
            bitmap,
            bytes,
            last_touch: 0,
        }
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries currently in the cache
    pub entry_count: usize,

    /// Total memory used by cached bitmaps (bytes)
    pub memory_used: usize,

    /// Current byte budget
    pub budget: usize,

    /// Number of cache hits
    pub hits: u64,

    /// Number of cache misses
    pub misses: u64,

    /// Number of entries evicted due to memory pressure
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate memory utilization (0.0 to 1.0)
    pub fn memory_utilization(&self) -> f64 {
        if self.budget == 0 {
            0.0
        } else {
            self.memory_used as f64 / self.budget as f64
        }
    }
}

/// Internal cache state
struct CacheState {
    /// Map from item key to cached entry
    entries: HashMap<ItemKey, CacheEntry>,

    /// Recency list (most recently used at front, least recently used at back)
    recency: VecDeque<ItemKey>,

    /// Current memory usage in bytes
    memory_used: usize,

    /// Current byte budget
    budget: usize,

    /// Monotonic touch counter
    touch_counter: u64,

    /// Statistics
    stats: CacheStats,
}

impl CacheState {
    fn new(budget: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: VecDeque::new(),
            memory_used: 0,
            budget,
            touch_counter: 0,
            stats: CacheStats {
                budget,
                ..Default::default()
            },
        }
    }

    /// Move a key to the front of the recency list and stamp it.
    fn touch(&mut self, key: ItemKey) {
        self.recency.retain(|&k| k != key);
        self.recency.push_front(key);
        self.touch_counter += 1;
        let stamp = self.touch_counter;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_touch = stamp;
        }
    }

    /// Evict the least recently used entry.
    fn evict_lru(&mut self) -> Option<CacheEntry> {
        if let Some(key) = self.recency.pop_back() {
            if let Some(entry) = self.entries.remove(&key) {
                self.memory_used = self.memory_used.saturating_sub(entry.bytes);
                self.stats.entry_count = self.entries.len();
                self.stats.memory_used = self.memory_used;
                self.stats.evictions += 1;
                return Some(entry);
            }
        }
        None
    }

    /// Evict entries until `required_bytes` more would fit under the budget.
    fn evict_to_fit(&mut self, required_bytes: usize) {
        while self.memory_used + required_bytes > self.budget && !self.entries.is_empty() {
            if self.evict_lru().is_none() {
                break;
            }
        }
    }

    fn remove(&mut self, key: ItemKey) -> Option<CacheEntry> {
        if let Some(entry) = self.entries.remove(&key) {
            self.memory_used = self.memory_used.saturating_sub(entry.bytes);
            self.recency.retain(|&k| k != key);
            self.stats.entry_count = self.entries.len();
            self.stats.memory_used = self.memory_used;
            Some(entry)
        } else {
            None
        }
    }
}

/// RAM artwork cache with LRU eviction
///
/// Thread-safe in-memory cache for decoded artwork bitmaps. When an insert
/// would exceed the byte budget, least recently used entries are evicted
/// first, before the new entry is placed.
///
/// All mutation normally originates on the owner thread; `clear_all` is also
/// safe to call during shutdown concurrently with an eviction in progress,
/// because every operation takes the same internal lock.
///
/// # Example
///
/// ```
/// use artgrid_cache::{Bitmap, CacheEntry, LruStore};
///
/// // Create a store with a 100MB budget
/// let store = LruStore::new(100 * 1024 * 1024);
///
/// // Store a bitmap
/// let bitmap = Bitmap::new(vec![0u8; 128 * 128 * 4], 128, 128);
/// store.insert(12345, CacheEntry::new(bitmap));
///
/// // Retrieve it (touches recency)
/// if let Some(bitmap) = store.get(12345) {
///     println!("hit: {}x{}", bitmap.width(), bitmap.height());
/// }
/// ```
pub struct LruStore {
    state: Arc<Mutex<CacheState>>,
}

impl LruStore {
    /// Create a new store with the specified byte budget.
    pub fn new(budget: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::new(budget))),
        }
    }

    /// Create a new store with a budget in megabytes.
    pub fn with_mb_budget(megabytes: usize) -> Self {
        Self::new(megabytes * 1024 * 1024)
    }

    /// Insert an entry, evicting oldest-first until it fits.
    ///
    /// Eviction happens before the entry is placed, so `total_bytes()` never
    /// exceeds the budget after an insert. If the same key is already cached,
    /// the old entry is replaced.
    pub fn insert(&self, key: ItemKey, entry: CacheEntry) {
        let mut state = self.state.lock().unwrap();

        let entry_bytes = entry.bytes;

        // Replacing an existing entry must not double-charge its bytes.
        state.remove(key);

        state.evict_to_fit(entry_bytes);

        state.memory_used += entry_bytes;
        state.entries.insert(key, entry);
        state.touch(key);

        state.stats.entry_count = state.entries.len();
        state.stats.memory_used = state.memory_used;
    }

    /// Retrieve a bitmap, updating recency and hit/miss statistics.
    pub fn get(&self, key: ItemKey) -> Option<Bitmap> {
        let mut state = self.state.lock().unwrap();

        if let Some(bitmap) = state.entries.get(&key).map(|e| e.bitmap.clone()) {
            state.touch(key);
            state.stats.hits += 1;
            Some(bitmap)
        } else {
            state.stats.misses += 1;
            None
        }
    }

    /// Mark an entry as most recently used without retrieving it.
    pub fn touch(&self, key: ItemKey) {
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(&key) {
            state.touch(key);
        }
    }

    /// Check if a key is cached without updating recency.
    pub fn contains(&self, key: ItemKey) -> bool {
        let state = self.state.lock().unwrap();
        state.entries.contains_key(&key)
    }

    /// Evict the least recently used entry.
    ///
    /// Returns `true` if an entry was evicted, `false` if the store was empty.
    pub fn evict_one(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.evict_lru().is_some()
    }

    /// Remove a specific entry.
    pub fn remove(&self, key: ItemKey) -> Option<CacheEntry> {
        let mut state = self.state.lock().unwrap();
        state.remove(key)
    }

    /// Keep only entries whose key satisfies the predicate.
    ///
    /// Used when the item set is rebuilt: entries not referenced by the new
    /// set are purged in one pass. Returns the number of entries removed.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(ItemKey) -> bool,
    {
        let mut state = self.state.lock().unwrap();
        let doomed: Vec<ItemKey> = state
            .entries
            .keys()
            .copied()
            .filter(|&k| !keep(k))
            .collect();
        for key in &doomed {
            state.remove(*key);
        }
        doomed.len()
    }

    /// Clear all entries.
    ///
    /// Takes the same lock as insert/evict, so it is safe during shutdown
    /// concurrently with a still-completing insert.
    pub fn clear_all(&self) {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        state.recency.clear();
        state.memory_used = 0;
        state.stats.entry_count = 0;
        state.stats.memory_used = 0;
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().unwrap();
        state.stats
    }

    /// Update the byte budget.
    ///
    /// If the new budget is smaller than current usage, entries are evicted
    /// oldest-first until usage fits.
    pub fn set_budget(&self, new_budget: usize) {
        let mut state = self.state.lock().unwrap();
        if new_budget < state.budget && state.memory_used > new_budget {
            log::debug!(
                "cache budget shrank to {} bytes, evicting from {} bytes",
                new_budget,
                state.memory_used
            );
        }
        state.budget = new_budget;
        state.stats.budget = new_budget;

        if state.memory_used > new_budget {
            state.evict_to_fit(0);
        }
    }

    /// Current byte budget.
    pub fn budget(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.budget
    }

    /// Current memory usage in bytes.
    pub fn total_bytes(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.memory_used
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.entries.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
