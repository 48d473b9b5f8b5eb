//! Viewport tracking and load-set planning
//!
//! The dispatcher turns the viewport reported by the layout engine into an
//! ordered load plan: visible indices first, then a prefetch window that
//! extends further in the current scroll direction. The direction is
//! inferred from successive viewport updates, so smooth scrolling keeps the
//! speculative work ahead of the user.

/// Direction of the most recent scroll movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    /// No movement observed yet.
    #[default]
    Unknown,

    /// Scrolling toward smaller indices.
    Up,

    /// Scrolling toward larger indices.
    Down,
}

/// Ordered load set for one dispatch cycle.
///
/// Visible indices are always submitted before prefetch indices; within
/// each group, indices are ordered by proximity to the viewport edge in
/// the scroll direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    /// Indices currently inside the viewport.
    pub visible: Vec<usize>,

    /// Speculative indices just outside the viewport.
    pub prefetch: Vec<usize>,
}

impl LoadPlan {
    /// Total number of planned indices.
    pub fn len(&self) -> usize {
        self.visible.len() + self.prefetch.len()
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.prefetch.is_empty()
    }
}

/// Viewport tracker and load planner.
///
/// The viewport is a half-open index range `[first, last)`. Each update
/// compares against the previous position to infer the scroll direction.
///
/// # Example
///
/// ```
/// use artgrid_core::Dispatcher;
///
/// let mut dispatcher = Dispatcher::new(5);
/// dispatcher.update_viewport(0, 10);
/// dispatcher.update_viewport(10, 20); // scrolled down
///
/// let plan = dispatcher.plan(100);
/// assert_eq!(plan.visible, (10..20).collect::<Vec<_>>());
/// assert_eq!(plan.prefetch, (20..25).collect::<Vec<_>>());
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    first: usize,
    last: usize,
    direction: ScrollDirection,
    prefetch_window: usize,
}

impl Dispatcher {
    /// Create a dispatcher with the given prefetch window size.
    pub fn new(prefetch_window: usize) -> Self {
        Self {
            first: 0,
            last: 0,
            direction: ScrollDirection::Unknown,
            prefetch_window,
        }
    }

    /// Record a new viewport `[first, last)` and infer the scroll direction.
    pub fn update_viewport(&mut self, first: usize, last: usize) {
        if first > self.first {
            self.direction = ScrollDirection::Down;
        } else if first < self.first {
            self.direction = ScrollDirection::Up;
        }
        self.first = first;
        self.last = last.max(first);
    }

    /// The current viewport as `(first, last)`.
    pub fn viewport(&self) -> (usize, usize) {
        (self.first, self.last)
    }

    /// The inferred scroll direction.
    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Compute the ordered load set, clamped to `[0, item_count)`.
    ///
    /// The whole prefetch window extends in the scroll direction when one
    /// is known; with no movement observed yet it is split evenly around
    /// the viewport, the trailing half nearest-first.
    pub fn plan(&self, item_count: usize) -> LoadPlan {
        let first = self.first.min(item_count);
        let last = self.last.min(item_count);

        let visible: Vec<usize> = (first..last).collect();

        let (ahead, behind) = match self.direction {
            ScrollDirection::Down => (self.prefetch_window, 0),
            ScrollDirection::Up => (0, self.prefetch_window),
            ScrollDirection::Unknown => {
                let behind = self.prefetch_window / 2;
                (self.prefetch_window - behind, behind)
            }
        };

        let mut prefetch = Vec::with_capacity(self.prefetch_window);
        prefetch.extend((last..last.saturating_add(ahead)).filter(|&i| i < item_count));
        prefetch.extend((1..=behind).filter_map(|offset| first.checked_sub(offset)));

        LoadPlan { visible, prefetch }
    }
}
