//! Reference render engine over an IIIF manifest
//!
//! Tracks which pages have been requested and which have arrived, resolves
//! clicks with the quarter rule, and otherwise leaves pixels alone: fetched
//! bytes are counted and dropped.

use crate::engine::{Direction, PageSource, PointerEvent, RenderEngine};
use crate::image_handle::{ImageHandle, LoadOutcome};
use crate::manifest::Manifest;
use crate::transport::ImageFetcher;
use std::sync::Arc;

/// One page slot; the handle exists once loading has started
struct PageSlot {
    source: PageSource,
    handle: Option<ImageHandle>,
}

/// Manifest-backed render engine
pub struct PageEngine {
    fetcher: Arc<dyn ImageFetcher>,
    label: String,
    pages: Vec<PageSlot>,
    index: usize,
    drag_origin: Option<(f64, f64)>,
}

impl PageEngine {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            label: String::new(),
            pages: Vec::new(),
            index: 0,
            drag_origin: None,
        }
    }

    /// Is the page image available?
    pub fn is_loaded(&self, index: usize) -> bool {
        self.pages
            .get(index)
            .and_then(|slot| slot.handle.as_ref())
            .map_or(false, ImageHandle::is_complete)
    }

    /// Is a drag gesture in progress?
    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    fn spawn_fetch(&self, handle: ImageHandle) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(src = handle.src(), "No async runtime; page image will not load");
                return;
            }
        };

        let fetcher = self.fetcher.clone();
        runtime.spawn(async move {
            match fetcher.fetch_image(handle.src()).await {
                Ok(bytes) => {
                    tracing::debug!(src = handle.src(), bytes, "page image fetched");
                    handle.complete();
                }
                Err(e) => {
                    tracing::warn!(src = handle.src(), "page image failed: {}", e);
                    handle.fail();
                }
            }
        });
    }
}

impl RenderEngine for PageEngine {
    fn size(&self) -> usize {
        self.pages.len()
    }

    fn show(&mut self, index: usize) -> bool {
        let Some(slot) = self.pages.get(index) else {
            // Nothing to display; the current page stays.
            tracing::debug!(index, size = self.pages.len(), "show: index out of range");
            return true;
        };

        match slot.handle.as_ref().map(ImageHandle::outcome) {
            // Never requested, or the last fetch failed: fetch (again).
            None | Some(Some(LoadOutcome::Failed)) => {
                self.load(index);
                false
            }
            Some(Some(LoadOutcome::Loaded)) => {
                tracing::debug!(index, "show");
                self.index = index;
                true
            }
            Some(None) => false,
        }
    }

    fn load(&mut self, index: usize) {
        let Some(slot) = self.pages.get_mut(index) else {
            tracing::debug!(index, "load: index out of range");
            return;
        };

        if let Some(handle) = &slot.handle {
            if !handle.is_failed() {
                tracing::trace!(index, loaded = handle.is_complete(), "load: already requested");
                return;
            }
            tracing::debug!(index, "load: retrying failed page");
        }

        let handle = ImageHandle::new(slot.source.src.clone());
        slot.handle = Some(handle.clone());
        self.spawn_fetch(handle);
    }

    fn is_loading(&self, index: usize) -> bool {
        match self.pages.get(index) {
            Some(slot) => slot.handle.as_ref().is_some_and(|handle| !handle.is_failed()),
            // Out-of-range pages never need a load.
            None => true,
        }
    }

    fn image_handle(&self, index: usize) -> Option<ImageHandle> {
        self.pages.get(index).and_then(|slot| slot.handle.clone())
    }

    fn index_by_src(&self, src: &str) -> usize {
        self.pages
            .iter()
            .position(|slot| slot.source.src == src)
            .unwrap_or(self.index)
    }

    fn set_manifest(&mut self, text: &str) -> bool {
        let manifest: Manifest = match text.parse() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Cannot read manifest: {}", e);
                return false;
            }
        };

        self.pages = manifest
            .pages()
            .into_iter()
            .map(|source| PageSlot { source, handle: None })
            .collect();
        self.label = manifest.label;
        self.index = 0;
        tracing::info!(label = %self.label, pages = self.pages.len(), "manifest accepted");
        true
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn page(&self, index: usize) -> Option<PageSource> {
        self.pages.get(index).map(|slot| slot.source.clone())
    }

    fn index(&self) -> usize {
        self.index
    }

    fn pointer_down(&mut self, event: &PointerEvent) {
        self.drag_origin = Some((event.x, event.y));
    }

    fn pointer_move(&mut self, event: &PointerEvent) {
        if let Some((x, y)) = self.drag_origin {
            tracing::trace!(dx = event.x - x, dy = event.y - y, "drag");
        }
    }

    fn pointer_up(&mut self, _event: &PointerEvent) {
        self.drag_origin = None;
    }

    fn click(&mut self, event: &PointerEvent) -> Option<Direction> {
        Direction::from_click(event.surface_width, event.x)
    }
}
