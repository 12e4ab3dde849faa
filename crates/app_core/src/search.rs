//! Search query assembly for a remote collection search API
//!
//! Turns raw form input into a [`SearchQuery`] ready to be serialized. No
//! request is sent from here.

use crate::config::SearchConfig;
use crate::error::ViewerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection themes accepted by the search API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[serde(alias = "archaelogy")]
    Archaeology,
    Art,
    Fashion,
    Manuscript,
    Map,
    Migration,
    Music,
    Nature,
    Newspaper,
    Photography,
    Ww1,
}

impl Theme {
    pub const ALL: [Theme; 11] = [
        Theme::Archaeology,
        Theme::Art,
        Theme::Fashion,
        Theme::Manuscript,
        Theme::Map,
        Theme::Migration,
        Theme::Music,
        Theme::Nature,
        Theme::Newspaper,
        Theme::Photography,
        Theme::Ww1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Archaeology => "archaeology",
            Theme::Art => "art",
            Theme::Fashion => "fashion",
            Theme::Manuscript => "manuscript",
            Theme::Map => "map",
            Theme::Migration => "migration",
            Theme::Music => "music",
            Theme::Nature => "nature",
            Theme::Newspaper => "newspaper",
            Theme::Photography => "photography",
            Theme::Ww1 => "ww1",
        }
    }
}

impl FromStr for Theme {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "archaelogy" {
            return Ok(Theme::Archaeology);
        }
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or_else(|| ViewerError::Config(format!("unknown theme `{}`", s)))
    }
}

/// Sortable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    TimestampCreated,
    TimestampUpdate,
    EuropeanaId,
    Completeness,
    IsFulltext,
    HasThumbnails,
    HasMedia,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::TimestampCreated,
        SortField::TimestampUpdate,
        SortField::EuropeanaId,
        SortField::Completeness,
        SortField::IsFulltext,
        SortField::HasThumbnails,
        SortField::HasMedia,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::TimestampCreated => "timestamp_created",
            SortField::TimestampUpdate => "timestamp_update",
            SortField::EuropeanaId => "europeana_id",
            SortField::Completeness => "COMPLETENESS",
            SortField::IsFulltext => "is_fulltext",
            SortField::HasThumbnails => "has_thumbnails",
            SortField::HasMedia => "has_media",
        }
    }
}

impl FromStr for SortField {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ViewerError::Config(format!("unknown sort field `{}`", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Sort clause, serialized as `field+order`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.field.as_str(), self.order.as_str())
    }
}

impl From<Sort> for String {
    fn from(sort: Sort) -> Self {
        sort.to_string()
    }
}

impl TryFrom<String> for Sort {
    type Error = ViewerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (field, order) = value.split_once('+').unwrap_or((value.as_str(), "asc"));
        let order = match order {
            "asc" => SortOrder::Ascending,
            "desc" => SortOrder::Descending,
            other => return Err(ViewerError::Config(format!("unknown sort order `{}`", other))),
        };
        Ok(Sort { field: field.parse()?, order })
    }
}

/// Structured search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    sort: Option<Sort>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    rows: Option<u32>,
}

impl SearchQuery {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    pub fn rows(&self) -> Option<u32> {
        self.rows
    }

    /// Transport-ready JSON body
    pub fn to_json(&self) -> Result<String, ViewerError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Raw form input, exactly as the search panel collects it
#[derive(Debug, Clone, Default)]
pub struct SearchForm {
    pub text: String,
    pub theme: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub rows: Option<String>,
}

/// Builds [`SearchQuery`] values from form input
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    default_rows: u32,
    max_rows: u32,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl QueryBuilder {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            default_rows: config.default_rows,
            max_rows: config.max_rows.max(config.default_rows),
        }
    }

    /// Build a query; `None` when the free-text field is empty
    pub fn build(&self, form: &SearchForm) -> Option<SearchQuery> {
        let text = form.text.trim();
        if text.is_empty() {
            return None;
        }

        let theme = non_empty(form.theme.as_deref()).and_then(|value| match value.parse::<Theme>() {
            Ok(theme) => Some(theme),
            Err(e) => {
                tracing::debug!("ignoring theme: {}", e);
                None
            }
        });

        let sort = non_empty(form.sort.as_deref()).and_then(|value| match value.parse::<SortField>() {
            Ok(field) => Some(Sort {
                field,
                order: if form.descending { SortOrder::Descending } else { SortOrder::Ascending },
            }),
            Err(e) => {
                tracing::debug!("ignoring sort: {}", e);
                None
            }
        });

        let rows = non_empty(form.rows.as_deref()).and_then(|value| self.rows(value));

        Some(SearchQuery {
            query: text.to_string(),
            theme,
            sort,
            rows,
        })
    }

    /// Negative counts fall back to the default; large ones are capped
    fn rows(&self, value: &str) -> Option<u32> {
        match value.parse::<i64>() {
            Ok(n) if n < 0 => Some(self.default_rows),
            Ok(n) => Some(u32::try_from(n).unwrap_or(u32::MAX).min(self.max_rows)),
            Err(_) => {
                tracing::debug!(rows = value, "ignoring non-numeric row count");
                None
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One hit returned by the search API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}
