//! Ordered page containers (list and grid)

use super::panel::{AuxiliaryPanel, Visibility};
use super::{Component, PageEntry};
use crate::host::WeakHost;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Presentation style of a collection view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Page list; mirrors the host's current page
    List,
    /// Thumbnail grid; closes after a pick
    Grid,
}

/// Ordered set of page entries. Position equals page index.
#[derive(Clone)]
pub struct CollectionView {
    inner: Arc<ViewInner>,
}

/// Non-owning link to a collection view
#[derive(Clone)]
pub struct WeakView(Weak<ViewInner>);

impl WeakView {
    pub fn upgrade(&self) -> Option<CollectionView> {
        self.0.upgrade().map(|inner| CollectionView { inner })
    }
}

struct ViewInner {
    kind: ViewKind,
    entries: RwLock<Vec<PageEntry>>,
    visibility: Visibility,
    host: RwLock<Option<WeakHost>>,
}

impl CollectionView {
    pub fn new(kind: ViewKind) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                kind,
                entries: RwLock::new(Vec::new()),
                visibility: Visibility::new(true),
                host: RwLock::new(None),
            }),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.inner.kind
    }

    /// Offer a child. Only page entries are adopted; the new entry starts
    /// out loading.
    pub fn insert(&self, child: Component) -> bool {
        let entry = match child {
            Component::Entry(entry) => entry,
            other => {
                tracing::debug!(kind = other.kind(), view = ?self.inner.kind, "collection view ignored child");
                return false;
            }
        };

        entry.attach(self);
        self.inner.entries.write().push(entry.clone());
        entry.mark_loading();
        true
    }

    pub fn deactivate_all(&self) {
        for entry in self.inner.entries.read().iter() {
            entry.deactivate();
        }
    }

    /// Highlight the entry at `index` and nothing else.
    ///
    /// An out-of-range index leaves no entry active and returns false.
    pub fn activate(&self, index: usize) -> bool {
        let entries = self.inner.entries.read();
        for entry in entries.iter() {
            entry.deactivate();
        }
        match entries.get(index) {
            Some(entry) => {
                entry.activate();
                true
            }
            None => {
                tracing::debug!(index, len = entries.len(), "activate: no such entry");
                false
            }
        }
    }

    pub fn entry_at(&self, index: usize) -> Option<PageEntry> {
        self.inner.entries.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.inner.entries.read().iter().filter(|e| e.is_active()).count()
    }

    /// Flip the view's visibility; returns the new state
    pub fn toggle_visibility(&self) -> bool {
        self.toggle()
    }

    /// Position of the highlighted entry
    pub fn active_index(&self) -> Option<usize> {
        self.inner.entries.read().iter().position(PageEntry::is_active)
    }

    /// Drop every entry, unlinking them first
    pub fn clear(&self) {
        let entries = std::mem::take(&mut *self.inner.entries.write());
        for entry in &entries {
            entry.detach();
        }
    }

    /// Adopted by a host. Entries already present are relinked.
    pub(crate) fn attach(&self, host: WeakHost) {
        *self.inner.host.write() = Some(host);
        let entries = self.inner.entries.read().clone();
        for entry in &entries {
            entry.attach(self);
        }
    }

    pub(crate) fn host_link(&self) -> Option<WeakHost> {
        self.inner.host.read().clone()
    }

    pub fn downgrade(&self) -> WeakView {
        WeakView(Arc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &CollectionView) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl AuxiliaryPanel for CollectionView {
    fn visibility(&self) -> &Visibility {
        &self.inner.visibility
    }
}

impl std::fmt::Debug for CollectionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionView")
            .field("kind", &self.inner.kind)
            .field("len", &self.len())
            .field("visible", &self.inner.visibility.is_visible())
            .finish()
    }
}
