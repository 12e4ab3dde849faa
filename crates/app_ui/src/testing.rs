//! In-memory collaborators for host tests

use app_core::{Direction, ImageHandle, LoadOutcome, ManifestTransport, PageSource, PointerEvent, RenderEngine, ViewerError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Default)]
struct ScriptState {
    pages: Vec<PageSource>,
    handles: Vec<Option<ImageHandle>>,
    index: usize,
    load_calls: Vec<usize>,
    show_calls: Vec<usize>,
    reject: bool,
    withheld: HashSet<usize>,
    refused: HashSet<usize>,
    click: Option<Direction>,
    pointer_log: Vec<&'static str>,
}

/// Render engine whose image loads complete only when the test says so.
///
/// Accepts manifests of the form `pages=N`.
pub(crate) struct ScriptedEngine {
    state: Arc<Mutex<ScriptState>>,
}

/// Test-side controls for a [`ScriptedEngine`]
#[derive(Clone)]
pub(crate) struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> (Self, Script) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        (Self { state: state.clone() }, Script { state })
    }
}

impl Script {
    /// Fire the load-completion signal for a page, if loading has started
    pub(crate) fn complete(&self, index: usize) {
        let handle = self.state.lock().handles.get(index).cloned().flatten();
        if let Some(handle) = handle {
            handle.complete();
        }
    }

    /// Make the page's pending fetch fail, if loading has started
    pub(crate) fn fail(&self, index: usize) {
        let handle = self.state.lock().handles.get(index).cloned().flatten();
        if let Some(handle) = handle {
            handle.fail();
        }
    }

    /// Loading this page never produces an image handle
    pub(crate) fn withhold(&self, index: usize) {
        self.state.lock().withheld.insert(index);
    }

    /// The engine never manages to display this page
    pub(crate) fn refuse(&self, index: usize) {
        self.state.lock().refused.insert(index);
    }

    pub(crate) fn reject_manifests(&self) {
        self.state.lock().reject = true;
    }

    pub(crate) fn click_result(&self, direction: Option<Direction>) {
        self.state.lock().click = direction;
    }

    pub(crate) fn load_calls(&self) -> Vec<usize> {
        self.state.lock().load_calls.clone()
    }

    pub(crate) fn show_calls(&self) -> Vec<usize> {
        self.state.lock().show_calls.clone()
    }

    pub(crate) fn pointer_log(&self) -> Vec<&'static str> {
        self.state.lock().pointer_log.clone()
    }
}

impl ScriptState {
    fn load(&mut self, index: usize) {
        if index >= self.pages.len() {
            return;
        }
        self.load_calls.push(index);
        let live = self.handles[index].as_ref().is_some_and(|h| !h.is_failed());
        if live || self.withheld.contains(&index) {
            return;
        }
        self.handles[index] = Some(ImageHandle::new(self.pages[index].src.clone()));
    }
}

impl RenderEngine for ScriptedEngine {
    fn size(&self) -> usize {
        self.state.lock().pages.len()
    }

    fn show(&mut self, index: usize) -> bool {
        let mut state = self.state.lock();
        state.show_calls.push(index);
        if index >= state.pages.len() {
            return true;
        }
        if state.refused.contains(&index) {
            return false;
        }
        let outcome = state.handles[index].as_ref().map(ImageHandle::outcome);
        match outcome {
            Some(Some(LoadOutcome::Loaded)) => {
                state.index = index;
                true
            }
            Some(None) => false,
            Some(Some(LoadOutcome::Failed)) => {
                state.load(index);
                false
            }
            None => {
                if !state.load_calls.contains(&index) {
                    state.load(index);
                }
                false
            }
        }
    }

    fn load(&mut self, index: usize) {
        self.state.lock().load(index);
    }

    fn is_loading(&self, index: usize) -> bool {
        let state = self.state.lock();
        if index >= state.pages.len() {
            return true;
        }
        let failed = state.handles[index].as_ref().is_some_and(ImageHandle::is_failed);
        state.load_calls.contains(&index) && !failed
    }

    fn image_handle(&self, index: usize) -> Option<ImageHandle> {
        self.state.lock().handles.get(index).cloned().flatten()
    }

    fn index_by_src(&self, src: &str) -> usize {
        let state = self.state.lock();
        state.pages.iter().position(|p| p.src == src).unwrap_or(state.index)
    }

    fn set_manifest(&mut self, text: &str) -> bool {
        let mut state = self.state.lock();
        if state.reject {
            return false;
        }
        let Some(count) = text.strip_prefix("pages=").and_then(|n| n.trim().parse::<usize>().ok()) else {
            return false;
        };
        state.pages = (0..count)
            .map(|i| PageSource {
                src: format!("https://example.org/images/p{}.jpg", i + 1),
                label: format!("p. {}", i + 1),
                thumbnail: None,
            })
            .collect();
        state.handles = vec![None; count];
        state.index = 0;
        true
    }

    fn label(&self) -> String {
        "Scripted book".to_string()
    }

    fn page(&self, index: usize) -> Option<PageSource> {
        self.state.lock().pages.get(index).cloned()
    }

    fn index(&self) -> usize {
        self.state.lock().index
    }

    fn pointer_down(&mut self, _event: &PointerEvent) {
        self.state.lock().pointer_log.push("down");
    }

    fn pointer_move(&mut self, _event: &PointerEvent) {
        self.state.lock().pointer_log.push("move");
    }

    fn pointer_up(&mut self, _event: &PointerEvent) {
        self.state.lock().pointer_log.push("up");
    }

    fn click(&mut self, _event: &PointerEvent) -> Option<Direction> {
        self.state.lock().click
    }
}

/// Transport returning a fixed answer
pub(crate) struct CannedTransport {
    answer: Result<String, String>,
}

impl CannedTransport {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self { answer: Ok(text.into()) }
    }

    pub(crate) fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
        }
    }
}

#[async_trait]
impl ManifestTransport for CannedTransport {
    async fn fetch_text(&self, _locator: &str) -> Result<String, ViewerError> {
        self.answer.clone().map_err(ViewerError::Transport)
    }
}
