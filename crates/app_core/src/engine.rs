//! Render engine interface consumed by the viewer host
//!
//! Decoding, layout and hit-testing live behind this trait. The host only
//! drives it: it asks for pages to be shown or loaded, reads per-page image
//! handles, and forwards pointer input.

use crate::image_handle::ImageHandle;
use serde::{Deserialize, Serialize};

/// Hit-test result for a click on the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Quarter rule: the outer quarters of the surface are turn zones
    pub fn from_click(surface_width: f64, x: f64) -> Option<Self> {
        if x < surface_width / 4.0 {
            Some(Direction::Left)
        } else if x > surface_width * 3.0 / 4.0 {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

/// Pointer event in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    /// Rendered width of the surface at the time of the event
    pub surface_width: f64,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, surface_width: f64) -> Self {
        Self { x, y, surface_width }
    }
}

/// Addressable page as described by the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSource {
    /// Image URI; unique per page
    pub src: String,
    pub label: String,
    pub thumbnail: Option<String>,
}

/// Rendering engine owned exclusively by one viewer host
pub trait RenderEngine: Send {
    /// Number of pages
    fn size(&self) -> usize;

    /// Display a page. `false` means the image is not available yet.
    fn show(&mut self, index: usize) -> bool;

    /// Start loading a page image
    fn load(&mut self, index: usize);

    /// Is a load of this page in flight or done? A failed load is not.
    fn is_loading(&self, index: usize) -> bool;

    /// Image handle for a page, once loading has been started
    fn image_handle(&self, index: usize) -> Option<ImageHandle>;

    /// Reverse lookup from image URI to page index
    fn index_by_src(&self, src: &str) -> usize;

    /// Hand over manifest text. `false` means it was rejected.
    fn set_manifest(&mut self, text: &str) -> bool;

    /// Human-readable title
    fn label(&self) -> String;

    /// Page metadata used to populate collection views
    fn page(&self, index: usize) -> Option<PageSource>;

    /// Currently displayed page
    fn index(&self) -> usize;

    fn pointer_down(&mut self, event: &PointerEvent);

    fn pointer_move(&mut self, event: &PointerEvent);

    fn pointer_up(&mut self, event: &PointerEvent);

    /// Hit-test a click
    fn click(&mut self, event: &PointerEvent) -> Option<Direction>;
}
