//! IIIF manga viewer core domain
//!
//! This crate contains:
//! - Configuration
//! - Command ids
//! - Error types
//! - The render engine interface and page load signals
//! - IIIF manifest model and a reference render engine
//! - Manifest/image transport
//! - Search query assembly

pub mod config;
pub mod command;
pub mod error;
pub mod engine;
pub mod image_handle;
pub mod manifest;
pub mod page_engine;
pub mod transport;
pub mod search;

pub use config::{AppConfig, GeneralConfig, ViewerConfig, SearchConfig};
pub use command::{Command, CommandId, CommandParams};
pub use error::ViewerError;
pub use engine::{Direction, PageSource, PointerEvent, RenderEngine};
pub use image_handle::{ImageHandle, LoadOutcome};
pub use manifest::Manifest;
pub use page_engine::PageEngine;
pub use transport::{HttpTransport, ImageFetcher, ManifestTransport};
pub use search::{QueryBuilder, SearchForm, SearchQuery, SearchResult, Sort, SortField, SortOrder, Theme};
