//! IIIF manga viewer coordination layer
//!
//! Provides:
//! - View components (page entries, collection views, side panels)
//! - The viewer host and its show/load choreography
//! - Mount point for viewers
//! - Input handling

pub mod components;
pub mod host;
pub mod show;
pub mod mount;
pub mod input;

#[cfg(test)]
mod testing;

pub use components::{
    AuxiliaryPanel, CollectionView, Component, LoadState, PageEntry, PanelKind, ProgressIndicator, RenderSurface,
    SearchPanel, ViewKind, ViewsPanel,
};
pub use host::{HostStatus, ViewerHost, WeakHost};
pub use input::Keymap;
pub use mount::MountPoint;
pub use show::{RetryPolicy, ShowRequest, ShowState};
