//! Toggleable side panels

use super::{CollectionView, Component, SearchPanel, ViewKind};
use crate::host::WeakHost;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shown/hidden flag
#[derive(Debug)]
pub struct Visibility(AtomicBool);

impl Visibility {
    pub fn new(visible: bool) -> Self {
        Self(AtomicBool::new(visible))
    }

    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::Release);
    }

    /// Flip and return the new value
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

/// A panel shown and hidden independently of navigation
pub trait AuxiliaryPanel {
    fn visibility(&self) -> &Visibility;

    fn toggle(&self) -> bool {
        self.visibility().toggle()
    }

    fn is_visible(&self) -> bool {
        self.visibility().is_visible()
    }

    fn set_visible(&self, visible: bool) {
        self.visibility().set(visible);
    }
}

/// Panels addressable by toggle commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    List,
    Grid,
    Search,
}

/// Side container holding the collection views and the search panel
pub struct ViewsPanel {
    host: WeakHost,
    children: RwLock<Vec<Component>>,
}

impl ViewsPanel {
    pub(crate) fn new(host: WeakHost) -> Self {
        Self {
            host,
            children: RwLock::new(Vec::new()),
        }
    }

    /// Offer a child. Collection views and the search panel are adopted.
    pub fn insert(&self, child: Component) -> bool {
        match &child {
            Component::Collection(view) => view.attach(self.host.clone()),
            Component::Search(_) => {}
            other => {
                tracing::debug!(kind = other.kind(), "views panel ignored child");
                return false;
            }
        }
        self.children.write().push(child);
        true
    }

    pub fn len(&self) -> usize {
        self.children.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.read().is_empty()
    }

    pub fn collections(&self) -> Vec<CollectionView> {
        self.children
            .read()
            .iter()
            .filter_map(|child| match child {
                Component::Collection(view) => Some(view.clone()),
                _ => None,
            })
            .collect()
    }

    /// First view of the given kind
    pub fn collection(&self, kind: ViewKind) -> Option<CollectionView> {
        self.collections().into_iter().find(|view| view.kind() == kind)
    }

    pub fn search(&self) -> Option<SearchPanel> {
        self.children.read().iter().find_map(|child| match child {
            Component::Search(panel) => Some(panel.clone()),
            _ => None,
        })
    }
}
