//! Mount point the surrounding application attaches viewers to

use crate::host::ViewerHost;
use crate::show::ShowRequest;
use app_core::ViewerError;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// Parent of one or more viewers
#[derive(Clone, Default)]
pub struct MountPoint {
    inner: Arc<MountInner>,
}

#[derive(Default)]
struct MountInner {
    children: RwLock<Vec<ViewerHost>>,
}

/// Non-owning link from a viewer back to its mount point
#[derive(Clone)]
pub struct WeakMount(Weak<MountInner>);

impl WeakMount {
    pub fn upgrade(&self) -> Option<MountPoint> {
        self.0.upgrade().map(|inner| MountPoint { inner })
    }
}

impl MountPoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakMount {
        WeakMount(Arc::downgrade(&self.inner))
    }

    pub fn append(&self, host: &ViewerHost) {
        host.set_mount(self.downgrade());
        self.inner.children.write().push(host.clone());
        tracing::debug!(host = host.id(), "viewer attached");
    }

    /// Attach a viewer and bring it up
    pub async fn mount(&self, host: &ViewerHost) -> Result<ShowRequest, ViewerError> {
        self.append(host);
        host.initialize().await
    }

    pub fn remove_child(&self, host: &ViewerHost) -> bool {
        let mut children = self.inner.children.write();
        let before = children.len();
        children.retain(|child| !child.ptr_eq(host));
        children.len() != before
    }

    pub fn contains(&self, host: &ViewerHost) -> bool {
        self.inner.children.read().iter().any(|child| child.ptr_eq(host))
    }

    pub fn len(&self) -> usize {
        self.inner.children.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.children.read().is_empty()
    }

    pub fn children(&self) -> Vec<ViewerHost> {
        self.inner.children.read().clone()
    }
}
