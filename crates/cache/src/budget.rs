//! Adaptive memory budget derived from system memory
//!
//! The cache budget tracks available system memory instead of using a fixed
//! limit, so the grid stays useful on small machines and generous on large
//! ones. Sampling is throttled: the system is probed at most once per
//! refresh interval (~1.5s), which keeps inserts cheap while staying
//! responsive to memory pressure.

use std::sync::Arc;
use std::time::{Duration, Instant};

const MB: usize = 1024 * 1024;

/// Source of system memory readings.
///
/// The platform probe is the production implementation; tests inject a
/// fixed probe for deterministic behavior.
pub trait MemoryProbe: Send + Sync {
    /// Total physical memory in bytes, if known.
    fn physical_bytes(&self) -> Option<u64>;

    /// Currently available memory in bytes, if known.
    fn available_bytes(&self) -> Option<u64>;
}

/// Platform memory probe.
#[derive(Debug, Default)]
pub struct SystemMemoryProbe;

impl MemoryProbe for SystemMemoryProbe {
    fn physical_bytes(&self) -> Option<u64> {
        physical_ram_bytes()
    }

    fn available_bytes(&self) -> Option<u64> {
        available_ram_bytes()
    }
}

/// Fixed-value probe for tests and deterministic configurations.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryProbe {
    /// Reported physical memory in bytes.
    pub physical: Option<u64>,
    /// Reported available memory in bytes.
    pub available: Option<u64>,
}

impl MemoryProbe for FixedMemoryProbe {
    fn physical_bytes(&self) -> Option<u64> {
        self.physical
    }

    fn available_bytes(&self) -> Option<u64> {
        self.available
    }
}

#[cfg(target_os = "macos")]
fn physical_ram_bytes() -> Option<u64> {
    use std::ffi::CString;
    use std::mem::size_of;
    use std::ptr;

    let key = CString::new("hw.memsize").ok()?;
    let mut value: u64 = 0;
    let mut len = size_of::<u64>();
    let rc = unsafe {
        libc::sysctlbyname(
            key.as_ptr(),
            &mut value as *mut u64 as *mut libc::c_void,
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    if rc == 0 && len == size_of::<u64>() {
        Some(value)
    } else {
        None
    }
}

#[cfg(target_os = "linux")]
fn physical_ram_bytes() -> Option<u64> {
    let mut info = std::mem::MaybeUninit::<libc::sysinfo>::uninit();
    let rc = unsafe { libc::sysinfo(info.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    let info = unsafe { info.assume_init() };
    Some((info.totalram as u64).saturating_mul(info.mem_unit as u64))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn physical_ram_bytes() -> Option<u64> {
    None
}

#[cfg(target_os = "linux")]
fn available_ram_bytes() -> Option<u64> {
    let mut info = std::mem::MaybeUninit::<libc::sysinfo>::uninit();
    let rc = unsafe { libc::sysinfo(info.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    let info = unsafe { info.assume_init() };
    let unit = info.mem_unit as u64;
    let free = (info.freeram as u64).saturating_mul(unit);
    let buffers = (info.bufferram as u64).saturating_mul(unit);
    Some(free.saturating_add(buffers))
}

// No cheap availability reading outside Linux; the budget falls back to a
// fraction of physical memory.
#[cfg(not(target_os = "linux"))]
fn available_ram_bytes() -> Option<u64> {
    None
}

/// Configuration for the adaptive budget.
#[derive(Debug, Clone, Copy)]
pub struct BudgetConfig {
    /// Minimum budget in bytes, never undercut.
    pub floor: usize,

    /// Maximum budget in bytes, never exceeded.
    pub ceiling: usize,

    /// Minimum interval between system probes.
    pub refresh_interval: Duration,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            floor: 64 * MB,
            ceiling: 2048 * MB,
            refresh_interval: Duration::from_millis(1500),
        }
    }
}

impl BudgetConfig {
    /// Pick the ceiling tier for a machine with the given physical memory.
    ///
    /// Machines under 4 GB cap at 256 MB, under 16 GB at 1 GB, larger
    /// machines at 2 GB.
    pub fn tiered(physical_bytes: Option<u64>) -> Self {
        let ceiling = match physical_bytes {
            Some(phys) if phys < 4 * 1024 * 1024 * 1024 => 256 * MB,
            Some(phys) if phys < 16 * 1024 * 1024 * 1024 => 1024 * MB,
            _ => 2048 * MB,
        };
        Self {
            ceiling,
            ..Default::default()
        }
    }

    /// Set the floor in megabytes.
    pub fn with_floor_mb(mut self, mb: usize) -> Self {
        self.floor = mb * MB;
        self
    }

    /// Set the ceiling in megabytes.
    pub fn with_ceiling_mb(mut self, mb: usize) -> Self {
        self.ceiling = mb * MB;
        self
    }

    /// Set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

/// Adaptive cache budget.
///
/// `refresh()` returns the current budget, probing the system at most once
/// per refresh interval. The budget is half of available memory, clamped to
/// the configured floor/ceiling; when only physical memory is known, a
/// quarter of it is used instead; when nothing is known the previous budget
/// is kept.
///
/// # Example
///
/// ```
/// use artgrid_cache::{AdaptiveBudget, BudgetConfig, FixedMemoryProbe};
/// use std::sync::Arc;
///
/// let probe = FixedMemoryProbe {
///     physical: Some(8 * 1024 * 1024 * 1024),
///     available: Some(2 * 1024 * 1024 * 1024),
/// };
/// let mut budget = AdaptiveBudget::new(Arc::new(probe), BudgetConfig::default());
/// assert_eq!(budget.refresh(), 1024 * 1024 * 1024);
/// ```
pub struct AdaptiveBudget {
    probe: Arc<dyn MemoryProbe>,
    config: BudgetConfig,
    last_probe: Option<Instant>,
    current: usize,
}

impl AdaptiveBudget {
    /// Create an adaptive budget over the given probe.
    ///
    /// The first reading is taken immediately.
    pub fn new(probe: Arc<dyn MemoryProbe>, config: BudgetConfig) -> Self {
        let mut budget = Self {
            probe,
            config,
            last_probe: None,
            current: config.floor,
        };
        budget.sample();
        budget
    }

    /// Create an adaptive budget with a tiered ceiling from the platform probe.
    pub fn with_system_probe() -> Self {
        let probe = Arc::new(SystemMemoryProbe);
        let config = BudgetConfig::tiered(probe.physical_bytes());
        Self::new(probe, config)
    }

    /// Current budget in bytes, without probing.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Budget configuration.
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Return the current budget, re-probing at most once per interval.
    pub fn refresh(&mut self) -> usize {
        let due = match self.last_probe {
            Some(at) => at.elapsed() >= self.config.refresh_interval,
            None => true,
        };
        if due {
            self.sample();
        }
        self.current
    }

    fn sample(&mut self) {
        self.last_probe = Some(Instant::now());

        let raw = match (self.probe.available_bytes(), self.probe.physical_bytes()) {
            (Some(avail), _) => (avail / 2) as usize,
            (None, Some(phys)) => (phys / 4) as usize,
            (None, None) => return,
        };

        let clamped = raw.clamp(self.config.floor, self.config.ceiling);
        if clamped != self.current {
            log::debug!(
                "artwork cache budget {} -> {} bytes",
                self.current,
                clamped
            );
        }
        self.current = clamped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    fn probe(physical: Option<u64>, available: Option<u64>) -> Arc<FixedMemoryProbe> {
        Arc::new(FixedMemoryProbe {
            physical,
            available,
        })
    }

    #[test]
    fn test_tier_selection() {
        assert_eq!(BudgetConfig::tiered(Some(2 * GB)).ceiling, 256 * MB);
        assert_eq!(BudgetConfig::tiered(Some(8 * GB)).ceiling, 1024 * MB);
        assert_eq!(BudgetConfig::tiered(Some(32 * GB)).ceiling, 2048 * MB);
        assert_eq!(BudgetConfig::tiered(None).ceiling, 2048 * MB);
    }

    #[test]
    fn test_budget_is_half_available_clamped() {
        let config = BudgetConfig::default().with_ceiling_mb(1024);

        // 2 GB available -> 1 GB, at the ceiling.
        let budget = AdaptiveBudget::new(probe(Some(8 * GB), Some(2 * GB)), config);
        assert_eq!(budget.current(), 1024 * MB);

        // 6 GB available -> clamped to the 1 GB ceiling.
        let budget = AdaptiveBudget::new(probe(Some(8 * GB), Some(6 * GB)), config);
        assert_eq!(budget.current(), 1024 * MB);

        // 20 MB available -> clamped up to the 64 MB floor.
        let budget = AdaptiveBudget::new(probe(Some(8 * GB), Some(20 * MB as u64)), config);
        assert_eq!(budget.current(), 64 * MB);
    }

    #[test]
    fn test_physical_fallback_when_available_unknown() {
        let config = BudgetConfig::default();
        let budget = AdaptiveBudget::new(probe(Some(4 * GB), None), config);
        assert_eq!(budget.current(), GB as usize);
    }

    #[test]
    fn test_unknown_memory_keeps_previous_budget() {
        let config = BudgetConfig::default().with_refresh_interval(Duration::ZERO);
        let mut budget = AdaptiveBudget::new(probe(None, None), config);
        // Initial budget stays at the floor when nothing is known.
        assert_eq!(budget.current(), config.floor);
        assert_eq!(budget.refresh(), config.floor);
    }

    #[test]
    fn test_refresh_throttled_by_interval() {
        struct CountingProbe {
            calls: std::sync::atomic::AtomicUsize,
        }
        impl MemoryProbe for CountingProbe {
            fn physical_bytes(&self) -> Option<u64> {
                None
            }
            fn available_bytes(&self) -> Option<u64> {
                self.calls
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Some(2 * GB)
            }
        }

        let probe = Arc::new(CountingProbe {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let config = BudgetConfig::default().with_refresh_interval(Duration::from_secs(3600));
        let mut budget = AdaptiveBudget::new(Arc::clone(&probe) as Arc<dyn MemoryProbe>, config);

        for _ in 0..100 {
            budget.refresh();
        }

        // Only the construction-time sample; the interval has not elapsed.
        assert_eq!(probe.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refresh_resamples_when_due() {
        let config = BudgetConfig::default().with_refresh_interval(Duration::ZERO);
        let mut budget = AdaptiveBudget::new(probe(Some(8 * GB), Some(2 * GB)), config);
        assert_eq!(budget.refresh(), 1024 * MB);
        assert_eq!(budget.refresh(), 1024 * MB);
    }

    #[test]
    fn test_system_probe_is_usable() {
        // Smoke test only: values are machine-dependent.
        let probe = SystemMemoryProbe;
        let _ = probe.physical_bytes();
        let _ = probe.available_bytes();
    }
}
