//! Paint coalescing: any number of invalidations between two paint
//! callbacks collapse into a single compositor pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared invalidation bit. Cloned into asset-load callbacks so a texture
/// arriving marks the view stale without going through the scheduler.
#[derive(Clone)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    pub fn new() -> Self {
        DirtyFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn mark(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_marked(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl Default for DirtyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides when the compositor runs. The platform fires one paint callback
/// per display refresh; `take_paint` answers it, true at most once per
/// batch of invalidations and never zero times if anything invalidated.
pub struct RenderScheduler {
    dirty: DirtyFlag,
}

impl RenderScheduler {
    /// Starts dirty so the very first callback paints the initial frame.
    pub fn new() -> Self {
        let dirty = DirtyFlag::new();
        dirty.mark();
        RenderScheduler { dirty }
    }

    pub fn invalidate(&self) {
        self.dirty.mark();
    }

    /// Handle for out-of-band invalidation (asset loads).
    pub fn dirty_flag(&self) -> DirtyFlag {
        self.dirty.clone()
    }

    /// Body of the per-refresh paint callback: clears the flag and reports
    /// whether the compositor should run. The flag is cleared nowhere else,
    /// so no invalidation between two callbacks can be missed.
    pub fn take_paint(&self) -> bool {
        if !self.dirty.is_marked() {
            return false;
        }
        self.dirty.clear();
        true
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}
