//! Grid cache configuration
//!
//! Builder-style configuration for the loader pipeline: worker count,
//! in-flight cap, prefetch window, per-cycle submission caps, and thumbnail
//! target size. Values can also be overridden from environment variables.

use crate::source::TargetSize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable contained an unparsable value.
    #[error("invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Configuration for [`ArtworkGridCache`](crate::ArtworkGridCache).
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Number of decode worker threads.
    ///
    /// Small by design: the bottleneck is source I/O plus decode latency,
    /// not compute, so this is not scaled to core count.
    pub num_workers: usize,

    /// Maximum number of jobs in flight at once; the sole backpressure
    /// mechanism.
    pub max_in_flight: usize,

    /// Number of items prefetched beyond the viewport, biased toward the
    /// current scroll direction.
    pub prefetch_window: usize,

    /// Maximum visible-range jobs submitted per dispatch cycle.
    pub visible_per_cycle: usize,

    /// Maximum prefetch jobs submitted per dispatch cycle.
    pub prefetch_per_cycle: usize,

    /// Target bitmap size for one grid cell.
    pub target_size: TargetSize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            max_in_flight: 8,
            prefetch_window: 5,
            visible_per_cycle: 3,
            prefetch_per_cycle: 2,
            target_size: TargetSize::square(160),
        }
    }
}

impl GridConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers.max(1);
        self
    }

    /// Set the in-flight cap.
    pub fn with_max_in_flight(mut self, cap: usize) -> Self {
        self.max_in_flight = cap.max(1);
        self
    }

    /// Set the prefetch window size.
    pub fn with_prefetch_window(mut self, window: usize) -> Self {
        self.prefetch_window = window;
        self
    }

    /// Set the per-cycle submission caps.
    pub fn with_cycle_caps(mut self, visible: usize, prefetch: usize) -> Self {
        self.visible_per_cycle = visible.max(1);
        self.prefetch_per_cycle = prefetch;
        self
    }

    /// Set the thumbnail target size.
    pub fn with_target_size(mut self, target: TargetSize) -> Self {
        self.target_size = target;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ARTGRID_WORKERS`: decode worker count (default: 4)
    /// - `ARTGRID_MAX_IN_FLIGHT`: in-flight job cap (default: 8)
    /// - `ARTGRID_PREFETCH`: prefetch window size (default: 5)
    /// - `ARTGRID_THUMB_EDGE`: square thumbnail edge in pixels (default: 160)
    ///
    /// # Errors
    /// Returns an error if any variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ARTGRID_WORKERS") {
            config.num_workers = parse_env("ARTGRID_WORKERS", &val)?.max(1);
        }
        if let Ok(val) = std::env::var("ARTGRID_MAX_IN_FLIGHT") {
            config.max_in_flight = parse_env("ARTGRID_MAX_IN_FLIGHT", &val)?.max(1);
        }
        if let Ok(val) = std::env::var("ARTGRID_PREFETCH") {
            config.prefetch_window = parse_env("ARTGRID_PREFETCH", &val)?;
        }
        if let Ok(val) = std::env::var("ARTGRID_THUMB_EDGE") {
            let edge = parse_env("ARTGRID_THUMB_EDGE", &val)? as u32;
            config.target_size = TargetSize::square(edge);
        }

        Ok(config)
    }
}

fn parse_env(name: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}
