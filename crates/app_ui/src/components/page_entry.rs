//! A single page in a collection view

use super::collection_view::{CollectionView, ViewKind, WeakView};
use crate::host::{ViewerHost, WeakHost};
use crate::show::ShowRequest;
use app_core::PageSource;
use parking_lot::Mutex;
use std::sync::Arc;

/// Load indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    /// The image fetch failed; showing the page fetches it again
    Failed,
}

/// Addressable page entry.
///
/// Cheap to clone; clones share state. Back-references to the owning view
/// and host are set once by the view that adopts the entry.
#[derive(Clone)]
pub struct PageEntry {
    inner: Arc<EntryInner>,
}

struct EntryInner {
    source: PageSource,
    state: Mutex<EntryState>,
}

#[derive(Default)]
struct EntryState {
    load: Option<LoadState>,
    active: bool,
    host: Option<WeakHost>,
    view: Option<WeakView>,
}

impl PageEntry {
    pub fn new(source: PageSource) -> Self {
        Self {
            inner: Arc::new(EntryInner {
                source,
                state: Mutex::new(EntryState::default()),
            }),
        }
    }

    /// Image URI of the page
    pub fn src(&self) -> &str {
        &self.inner.source.src
    }

    pub fn label(&self) -> &str {
        &self.inner.source.label
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.inner.source.thumbnail.as_deref()
    }

    pub fn mark_loading(&self) {
        self.inner.state.lock().load = Some(LoadState::Loading);
    }

    /// Clear the loading indicator. Returns false if it was already clear.
    pub fn mark_loaded(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.load == Some(LoadState::Loaded) {
            return false;
        }
        state.load = Some(LoadState::Loaded);
        true
    }

    /// Flag the image as unavailable. A later successful display clears it.
    pub fn mark_failed(&self) {
        self.inner.state.lock().load = Some(LoadState::Failed);
    }

    /// `None` until a view adopts the entry
    pub fn load_state(&self) -> Option<LoadState> {
        self.inner.state.lock().load
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    pub(crate) fn activate(&self) {
        self.inner.state.lock().active = true;
    }

    pub(crate) fn deactivate(&self) {
        self.inner.state.lock().active = false;
    }

    /// Resolve back-references from the adopting view.
    ///
    /// A view that is not itself attached to a host leaves the entry
    /// unlinked; such an entry ignores clicks.
    pub(crate) fn attach(&self, view: &CollectionView) {
        let Some(host) = view.host_link() else {
            tracing::debug!(src = self.src(), "entry adopted by a view without a host; left unlinked");
            return;
        };
        let mut state = self.inner.state.lock();
        state.host = Some(host);
        state.view = Some(view.downgrade());
    }

    pub(crate) fn detach(&self) {
        let mut state = self.inner.state.lock();
        state.host = None;
        state.view = None;
        state.active = false;
    }

    /// Owning viewer host, if linked and still alive
    pub fn host(&self) -> Option<ViewerHost> {
        self.inner.state.lock().host.as_ref().and_then(WeakHost::upgrade)
    }

    /// Owning collection view, if linked and still alive
    pub fn view(&self) -> Option<CollectionView> {
        self.inner.state.lock().view.as_ref().and_then(WeakView::upgrade)
    }

    /// User picked this entry.
    ///
    /// Shows the page it stands for. A list entry then highlights itself
    /// directly; a grid entry closes its panel.
    pub fn click(&self) -> Option<ShowRequest> {
        let (Some(host), Some(view)) = (self.host(), self.view()) else {
            tracing::debug!(src = self.src(), "click on unlinked entry ignored");
            return None;
        };

        let index = host.index_by_src(self.src());
        let request = host.show(index);

        match view.kind() {
            ViewKind::List => {
                view.deactivate_all();
                self.activate();
            }
            ViewKind::Grid => {
                view.toggle_visibility();
            }
        }

        Some(request)
    }

    pub fn ptr_eq(&self, other: &PageEntry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for PageEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PageEntry")
            .field("src", &self.inner.source.src)
            .field("load", &state.load)
            .field("active", &state.active)
            .field("linked", &state.host.is_some())
            .finish()
    }
}
