//! Search form panel

use super::panel::{AuxiliaryPanel, Visibility};
use app_core::{QueryBuilder, SearchForm, SearchQuery};
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects search input and turns it into a [`SearchQuery`].
///
/// The query is only assembled and logged; sending it is left to whoever
/// reads [`SearchPanel::last_query`].
#[derive(Clone)]
pub struct SearchPanel {
    inner: Arc<SearchInner>,
}

struct SearchInner {
    builder: QueryBuilder,
    visibility: Visibility,
    last: Mutex<Option<SearchQuery>>,
}

impl SearchPanel {
    pub fn new(builder: QueryBuilder) -> Self {
        Self {
            inner: Arc::new(SearchInner {
                builder,
                visibility: Visibility::new(false),
                last: Mutex::new(None),
            }),
        }
    }

    /// Submit the form. Empty text produces no query.
    pub fn submit(&self, form: &SearchForm) -> Option<SearchQuery> {
        let Some(query) = self.inner.builder.build(form) else {
            tracing::debug!("search submitted without text");
            return None;
        };

        match query.to_json() {
            Ok(body) => tracing::info!(%body, "search query"),
            Err(e) => tracing::warn!("Cannot encode search query: {}", e),
        }

        *self.inner.last.lock() = Some(query.clone());
        Some(query)
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.inner.last.lock().clone()
    }
}

impl AuxiliaryPanel for SearchPanel {
    fn visibility(&self) -> &Visibility {
        &self.inner.visibility
    }
}
