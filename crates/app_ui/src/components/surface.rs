//! Rendering surface and its progress overlays

use super::Component;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Overlay shown while a requested page waits for its image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressIndicator {
    id: u64,
    index: usize,
}

impl ProgressIndicator {
    pub fn new(id: u64, index: usize) -> Self {
        Self { id, index }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Page the indicator waits for
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Area the render engine draws into. The core only tracks overlays on it.
#[derive(Debug, Default)]
pub struct RenderSurface {
    overlays: Mutex<Vec<ProgressIndicator>>,
    next_id: AtomicU64,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an indicator for `index` and put it on the surface
    pub fn begin_progress(&self, index: usize) -> ProgressIndicator {
        let indicator = ProgressIndicator::new(self.next_id.fetch_add(1, Ordering::Relaxed), index);
        self.insert(Component::Progress(indicator.clone()));
        indicator
    }

    /// Offer a child. Only progress indicators are accepted.
    pub fn insert(&self, child: Component) -> bool {
        match child {
            Component::Progress(indicator) => {
                self.overlays.lock().push(indicator);
                true
            }
            other => {
                tracing::debug!(kind = other.kind(), "render surface ignored child");
                false
            }
        }
    }

    pub fn remove_progress(&self, indicator: &ProgressIndicator) -> bool {
        let mut overlays = self.overlays.lock();
        let before = overlays.len();
        overlays.retain(|o| o.id != indicator.id);
        overlays.len() != before
    }

    pub fn progress(&self) -> Vec<ProgressIndicator> {
        self.overlays.lock().clone()
    }

    pub fn is_waiting_for(&self, index: usize) -> bool {
        self.overlays.lock().iter().any(|o| o.index == index)
    }

    pub fn clear(&self) {
        self.overlays.lock().clear();
    }
}
