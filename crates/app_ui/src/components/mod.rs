//! View components
//!
//! Containers accept a closed set of children. Anything outside a
//! container's set is dropped without an error (and logged at debug level).

pub mod page_entry;
pub mod collection_view;
pub mod panel;
pub mod search_panel;
pub mod surface;

pub use page_entry::{PageEntry, LoadState};
pub use collection_view::{CollectionView, ViewKind, WeakView};
pub use panel::{AuxiliaryPanel, PanelKind, ViewsPanel, Visibility};
pub use search_panel::SearchPanel;
pub use surface::{ProgressIndicator, RenderSurface};

/// Any child a container may be offered
#[derive(Clone)]
pub enum Component {
    Entry(PageEntry),
    Collection(CollectionView),
    Search(SearchPanel),
    Progress(ProgressIndicator),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Entry(_) => "page-entry",
            Component::Collection(_) => "collection-view",
            Component::Search(_) => "search-panel",
            Component::Progress(_) => "progress",
        }
    }
}
