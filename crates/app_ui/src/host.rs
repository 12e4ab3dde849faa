//! Viewer host: the root coordinator
//!
//! Owns the render engine, the rendering surface and the side panels. It
//! acquires the manifest, drives page display through the show state
//! machine, preloads pages in the background, and turns surface clicks into
//! page turns (right-to-left: a left click goes forward).

use crate::components::{
    AuxiliaryPanel, CollectionView, Component, PageEntry, PanelKind, RenderSurface, SearchPanel, ViewKind,
    ViewsPanel,
};
use crate::mount::WeakMount;
use crate::show::{RetryPolicy, ShowRequest, ShowState};
use app_core::{
    AppConfig, Direction, ImageHandle, LoadOutcome, ManifestTransport, PageSource, PointerEvent, QueryBuilder,
    RenderEngine, SearchForm, SearchQuery, ViewerError,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);

/// What the host is doing, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostStatus {
    Idle,
    Fetching,
    Ready { pages: usize },
    Failed { message: String },
    Removed { reason: String },
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostStatus::Idle => write!(f, "idle"),
            HostStatus::Fetching => write!(f, "fetching manifest"),
            HostStatus::Ready { pages } => write!(f, "ready ({} pages)", pages),
            HostStatus::Failed { message } => write!(f, "failed: {}", message),
            HostStatus::Removed { reason } => write!(f, "removed: {}", reason),
        }
    }
}

/// Mountable viewer. Cheap to clone; clones share the same viewer.
#[derive(Clone)]
pub struct ViewerHost {
    inner: Arc<HostInner>,
}

/// Non-owning link to a viewer host, held by its descendants
#[derive(Clone)]
pub struct WeakHost(Weak<HostInner>);

impl WeakHost {
    pub fn upgrade(&self) -> Option<ViewerHost> {
        self.0.upgrade().map(|inner| ViewerHost { inner })
    }

    #[cfg(test)]
    pub(crate) fn dangling() -> Self {
        WeakHost(Weak::new())
    }
}

struct HostInner {
    id: u64,
    span: tracing::Span,
    engine: Mutex<Box<dyn RenderEngine>>,
    transport: Arc<dyn ManifestTransport>,
    surface: RenderSurface,
    panel: ViewsPanel,
    list: CollectionView,
    grid: CollectionView,
    search: SearchPanel,
    locator: Option<String>,
    preload: bool,
    policy: RetryPolicy,
    status: RwLock<HostStatus>,
    removed: AtomicBool,
    mount: Mutex<Option<WeakMount>>,
    sweep: Mutex<Option<JoinHandle<usize>>>,
}

/// One pending cycle of a show request
struct PendingCycle {
    attempt: u32,
    indicator: crate::components::ProgressIndicator,
    handle: Option<ImageHandle>,
}

impl ViewerHost {
    pub fn new(engine: Box<dyn RenderEngine>, transport: Arc<dyn ManifestTransport>, config: &AppConfig) -> Self {
        let id = NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::new_cyclic(|weak: &Weak<HostInner>| {
            let host = WeakHost(weak.clone());

            let list = CollectionView::new(ViewKind::List);
            let grid = CollectionView::new(ViewKind::Grid);
            grid.set_visible(false);
            let search = SearchPanel::new(QueryBuilder::new(&config.search));

            let panel = ViewsPanel::new(host);
            panel.insert(Component::Collection(list.clone()));
            panel.insert(Component::Collection(grid.clone()));
            panel.insert(Component::Search(search.clone()));

            HostInner {
                id,
                span: tracing::info_span!("viewer", host = id),
                engine: Mutex::new(engine),
                transport,
                surface: RenderSurface::new(),
                panel,
                list,
                grid,
                search,
                locator: config.viewer.manifest.clone(),
                preload: config.viewer.preload,
                policy: RetryPolicy::from_config(&config.viewer),
                status: RwLock::new(HostStatus::Idle),
                removed: AtomicBool::new(false),
                mount: Mutex::new(None),
                sweep: Mutex::new(None),
            }
        });
        Self { inner }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakHost {
        WeakHost(Arc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &ViewerHost) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn status(&self) -> HostStatus {
        self.inner.status.read().clone()
    }

    fn set_status(&self, status: HostStatus) {
        *self.inner.status.write() = status;
    }

    pub fn is_removed(&self) -> bool {
        self.inner.removed.load(Ordering::Acquire)
    }

    /// Primary (list) collection view; mirrors the current page
    pub fn list(&self) -> &CollectionView {
        &self.inner.list
    }

    pub fn grid(&self) -> &CollectionView {
        &self.inner.grid
    }

    pub fn search_panel(&self) -> &SearchPanel {
        &self.inner.search
    }

    pub fn panel(&self) -> &ViewsPanel {
        &self.inner.panel
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.inner.surface
    }

    pub(crate) fn set_mount(&self, mount: WeakMount) {
        *self.inner.mount.lock() = Some(mount);
    }

    // ===== Engine forwarding =====

    pub fn size(&self) -> usize {
        self.inner.engine.lock().size()
    }

    pub fn index(&self) -> usize {
        self.inner.engine.lock().index()
    }

    pub fn label(&self) -> String {
        self.inner.engine.lock().label()
    }

    pub fn index_by_src(&self, src: &str) -> usize {
        self.inner.engine.lock().index_by_src(src)
    }

    pub fn image_handle(&self, index: usize) -> Option<ImageHandle> {
        self.inner.engine.lock().image_handle(index)
    }

    pub fn pointer_down(&self, event: &PointerEvent) {
        self.inner.engine.lock().pointer_down(event);
    }

    pub fn pointer_move(&self, event: &PointerEvent) {
        self.inner.engine.lock().pointer_move(event);
    }

    pub fn pointer_up(&self, event: &PointerEvent) {
        self.inner.engine.lock().pointer_up(event);
    }

    // ===== Navigation =====

    /// Request page `index`.
    ///
    /// The engine is asked synchronously. If the image is not there yet a
    /// progress indicator goes up and a background task waits for the
    /// load-completion signal, then asks again, within the retry policy.
    pub fn show(&self, index: usize) -> ShowRequest {
        let _enter = self.inner.span.enter();

        if self.is_removed() {
            tracing::debug!(index, "show on removed viewer");
            return ShowRequest::settled(index, ShowState::Abandoned);
        }

        if self.try_display(index) {
            return ShowRequest::settled(index, ShowState::Displayed);
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(index, "No async runtime; cannot wait for page image");
                return ShowRequest::settled(index, ShowState::Abandoned);
            }
        };

        let (state, rx) = watch::channel(ShowState::Requested);
        let cycle = self.enter_pending(index, 1, &state);
        let driver = drive_pending(self.downgrade(), index, self.inner.policy, cycle, state);
        runtime.spawn(driver.instrument(self.inner.span.clone()));

        ShowRequest::tracking(index, rx)
    }

    pub fn next(&self) -> ShowRequest {
        // Out-of-range indexes are the engine's business.
        self.show(self.index().wrapping_add(1))
    }

    pub fn prev(&self) -> ShowRequest {
        self.show(self.index().wrapping_sub(1))
    }

    /// Hit-test a surface click and turn the page accordingly
    pub fn click(&self, event: &PointerEvent) -> Option<ShowRequest> {
        let direction = self.inner.engine.lock().click(event);
        match direction {
            Some(Direction::Left) => Some(self.next()),
            Some(Direction::Right) => Some(self.prev()),
            None => None,
        }
    }

    fn try_display(&self, index: usize) -> bool {
        let shown = self.inner.engine.lock().show(index);
        if shown {
            tracing::debug!(index, "page displayed");
            self.inner.list.activate(index);
            self.mark_page_loaded(index);
        }
        shown
    }

    fn enter_pending(&self, index: usize, attempt: u32, state: &watch::Sender<ShowState>) -> PendingCycle {
        state.send_replace(ShowState::Pending { attempt });
        let indicator = self.inner.surface.begin_progress(index);
        let handle = self.image_handle(index);
        tracing::debug!(index, attempt, has_handle = handle.is_some(), "page pending");
        PendingCycle {
            attempt,
            indicator,
            handle,
        }
    }

    // ===== Panels =====

    /// Show or hide a side panel; returns the new visibility
    pub fn toggle_panel(&self, kind: PanelKind) -> bool {
        let visible = match kind {
            PanelKind::List => self.inner.list.toggle(),
            PanelKind::Grid => self.inner.grid.toggle(),
            PanelKind::Search => self.inner.search.toggle(),
        };
        tracing::debug!(parent: &self.inner.span, panel = ?kind, visible, "panel toggled");
        visible
    }

    pub fn search(&self, form: &SearchForm) -> Option<SearchQuery> {
        let _enter = self.inner.span.enter();
        self.inner.search.submit(form)
    }

    // ===== Lifecycle =====

    /// Fetch the configured manifest and bring the viewer up.
    ///
    /// Returns the request for the first page. A rejected manifest removes
    /// the viewer from its mount point.
    pub async fn initialize(&self) -> Result<ShowRequest, ViewerError> {
        let span = self.inner.span.clone();
        self.acquire().instrument(span).await
    }

    async fn acquire(&self) -> Result<ShowRequest, ViewerError> {
        let Some(locator) = self.inner.locator.clone() else {
            let err = ViewerError::MissingLocator;
            tracing::error!("Cannot start viewer: {}", err);
            self.set_status(HostStatus::Failed {
                message: err.user_message(),
            });
            return Err(err);
        };

        self.set_status(HostStatus::Fetching);
        tracing::info!(%locator, "fetching manifest");

        let text = match self.inner.transport.fetch_text(&locator).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(%locator, "Manifest fetch failed: {}", e);
                self.set_status(HostStatus::Failed {
                    message: e.user_message(),
                });
                return Err(e);
            }
        };

        if self.is_removed() {
            tracing::debug!("manifest arrived after removal");
            return Ok(ShowRequest::settled(0, ShowState::Abandoned));
        }

        let accepted = self.inner.engine.lock().set_manifest(&text);
        if !accepted {
            self.remove("manifest rejected");
            return Err(ViewerError::ManifestRejected);
        }

        let pages = self.populate_views();
        self.set_status(HostStatus::Ready { pages });
        tracing::info!(label = %self.label(), pages, "viewer ready");

        let first = self.show(0);
        if self.inner.preload {
            self.spawn_preload();
        }
        Ok(first)
    }

    /// One entry per page in every collection view
    fn populate_views(&self) -> usize {
        let sources: Vec<PageSource> = {
            let engine = self.inner.engine.lock();
            (0..engine.size())
                .map(|index| engine.page(index).unwrap_or_else(|| placeholder(index)))
                .collect()
        };

        for view in [&self.inner.list, &self.inner.grid] {
            view.clear();
            for source in &sources {
                view.insert(Component::Entry(PageEntry::new(source.clone())));
            }
        }
        sources.len()
    }

    fn spawn_preload(&self) {
        let host = self.downgrade();
        let task = async move {
            // Let the first page's request get going before the sweep.
            tokio::task::yield_now().await;
            host.upgrade().map_or(0, |host| host.preload_sweep())
        };
        let handle = tokio::spawn(task.instrument(self.inner.span.clone()));
        *self.inner.sweep.lock() = Some(handle);
    }

    /// Start loading every page not yet loading, in ascending order, and
    /// mark entries loaded as their images arrive. Returns the number of
    /// `load` calls issued.
    pub fn preload_sweep(&self) -> usize {
        let _enter = self.inner.span.enter();
        let size = self.size();
        let mut issued = 0;

        for index in 0..size {
            if self.is_removed() {
                tracing::debug!(index, "preload stopped: viewer removed");
                break;
            }

            let handle = {
                let mut engine = self.inner.engine.lock();
                if !engine.is_loading(index) {
                    engine.load(index);
                    issued += 1;
                }
                engine.image_handle(index)
            };

            match handle {
                Some(handle) => {
                    let host = self.downgrade();
                    handle.on_settled(move |outcome| {
                        let Some(host) = host.upgrade() else {
                            return;
                        };
                        match outcome {
                            LoadOutcome::Loaded => host.mark_page_loaded(index),
                            LoadOutcome::Failed => host.mark_page_failed(index),
                        }
                    });
                }
                None => tracing::debug!(index, "preload: no image handle"),
            }
        }

        tracing::debug!(size, issued, "preload sweep issued");
        issued
    }

    /// Wait for the background sweep, if one was started
    pub async fn join_preload(&self) -> Option<usize> {
        let handle = self.inner.sweep.lock().take()?;
        handle.await.ok()
    }

    fn mark_page_loaded(&self, index: usize) {
        if self.is_removed() {
            return;
        }
        for view in [&self.inner.list, &self.inner.grid] {
            if let Some(entry) = view.entry_at(index) {
                entry.mark_loaded();
            }
        }
        tracing::trace!(parent: &self.inner.span, index, "page loaded");
    }

    fn mark_page_failed(&self, index: usize) {
        if self.is_removed() {
            return;
        }
        for view in [&self.inner.list, &self.inner.grid] {
            if let Some(entry) = view.entry_at(index) {
                entry.mark_failed();
            }
        }
        tracing::debug!(parent: &self.inner.span, index, "page fetch failed");
    }

    /// Take the viewer out of service and detach it from its mount point.
    /// Late completions become no-ops.
    pub fn remove(&self, reason: &str) {
        if self.inner.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::warn!(parent: &self.inner.span, reason, "viewer removed");

        let mount = self.inner.mount.lock().take();
        if let Some(mount) = mount.and_then(|m| m.upgrade()) {
            mount.remove_child(self);
        }
        self.inner.surface.clear();
        self.set_status(HostStatus::Removed {
            reason: reason.to_string(),
        });
    }
}

impl fmt::Debug for ViewerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerHost")
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .finish()
    }
}

fn placeholder(index: usize) -> PageSource {
    PageSource {
        src: format!("#page-{}", index),
        label: format!("{}", index + 1),
        thumbnail: None,
    }
}

/// Retry loop behind a pending show request
async fn drive_pending(
    host: WeakHost,
    index: usize,
    policy: RetryPolicy,
    mut cycle: PendingCycle,
    state: watch::Sender<ShowState>,
) {
    let outcome = loop {
        let waited = wait_for_image(cycle.handle.as_ref(), policy.load_timeout).await;

        let Some(viewer) = host.upgrade() else {
            break ShowState::Abandoned;
        };
        if viewer.is_removed() {
            tracing::debug!(index, "late completion ignored");
            break ShowState::Abandoned;
        }
        viewer.inner.surface.remove_progress(&cycle.indicator);

        match waited {
            ImageWait::NoHandle => {
                tracing::warn!(index, "No image handle for page; giving up");
                break ShowState::TimedOut;
            }
            ImageWait::Failed => {
                viewer.mark_page_failed(index);
                tracing::warn!(index, attempt = cycle.attempt, "Page image failed to load");
                break ShowState::Failed;
            }
            ImageWait::TimedOut => tracing::debug!(index, attempt = cycle.attempt, "load wait timed out"),
            ImageWait::Loaded => {}
        }

        if viewer.try_display(index) {
            break ShowState::Displayed;
        }
        if cycle.attempt >= policy.max_attempts {
            tracing::warn!(index, attempts = cycle.attempt, "Page did not display; giving up");
            break ShowState::TimedOut;
        }

        cycle = viewer.enter_pending(index, cycle.attempt + 1, &state);
    };

    tracing::debug!(index, state = ?outcome, "show settled");
    state.send_replace(outcome);
}

/// How one pending cycle's wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageWait {
    Loaded,
    Failed,
    TimedOut,
    NoHandle,
}

/// Wait for the handle to settle, at most `limit`
async fn wait_for_image(handle: Option<&ImageHandle>, limit: Duration) -> ImageWait {
    let Some(handle) = handle else {
        tokio::time::sleep(limit).await;
        return ImageWait::NoHandle;
    };

    let (tx, rx) = oneshot::channel();
    handle.on_settled(move |outcome| {
        let _ = tx.send(outcome);
    });
    match tokio::time::timeout(limit, rx).await {
        Ok(Ok(LoadOutcome::Loaded)) => ImageWait::Loaded,
        Ok(Ok(LoadOutcome::Failed)) => ImageWait::Failed,
        Ok(Err(_)) | Err(_) => ImageWait::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::LoadState;
    use crate::mount::MountPoint;
    use crate::testing::{CannedTransport, ScriptedEngine};

    fn config(load_timeout_ms: u64, max_show_attempts: u32) -> AppConfig {
        let mut config = AppConfig::default();
        config.viewer.manifest = Some("https://example.org/iiif/book1/manifest.json".into());
        config.viewer.load_timeout_ms = load_timeout_ms;
        config.viewer.max_show_attempts = max_show_attempts;
        config
    }

    fn viewer(pages: usize, config: &AppConfig) -> (ViewerHost, crate::testing::Script) {
        let (engine, script) = ScriptedEngine::new();
        let transport = CannedTransport::text(format!("pages={}", pages));
        (ViewerHost::new(Box::new(engine), Arc::new(transport), config), script)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    /// Initialized with every page image loaded
    async fn ready(host: &ViewerHost, script: &crate::testing::Script) {
        host.initialize().await.unwrap();
        host.join_preload().await;
        for i in 0..host.size() {
            script.complete(i);
        }
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_populates_views() {
        let config = config(1_000, 3);
        let (host, _script) = viewer(3, &config);

        let first = host.initialize().await.unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(host.status(), HostStatus::Ready { pages: 3 });

        assert_eq!(host.list().len(), 3);
        assert_eq!(host.grid().len(), 3);
        for i in 0..3 {
            assert_eq!(host.list().entry_at(i).unwrap().load_state(), Some(LoadState::Loading));
        }
        assert!(host.list().is_visible());
        assert!(!host.grid().is_visible());
        assert!(!host.search_panel().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_show_displays_after_completion() {
        let mut config = config(1_000, 3);
        config.viewer.preload = false;
        let (host, script) = viewer(3, &config);

        let first = host.initialize().await.unwrap();
        assert_eq!(first.state(), ShowState::Pending { attempt: 1 });
        assert!(host.surface().is_waiting_for(0));
        assert_eq!(host.list().active_count(), 0);

        script.complete(0);
        assert_eq!(first.wait().await, ShowState::Displayed);

        assert!(host.surface().progress().is_empty());
        assert_eq!(host.list().active_index(), Some(0));
        assert_eq!(host.list().active_count(), 1);
        assert_eq!(host.index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_index_eventually_displays() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        host.initialize().await.unwrap();

        for i in [2, 0, 1] {
            let request = host.show(i);
            script.complete(i);
            assert_eq!(request.wait().await, ShowState::Displayed);
            assert_eq!(host.list().active_index(), Some(i));
            assert_eq!(host.list().active_count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_issues_loads_in_order() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        host.initialize().await.unwrap();

        // show(0) already started loading page 0.
        assert_eq!(host.join_preload().await, Some(2));
        assert_eq!(script.load_calls(), vec![0, 1, 2]);

        // A second sweep has nothing left to start.
        assert_eq!(host.preload_sweep(), 0);
        assert_eq!(script.load_calls(), vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completions_in_any_order() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        host.initialize().await.unwrap();
        host.join_preload().await;

        script.complete(2);
        assert_eq!(host.list().entry_at(2).unwrap().load_state(), Some(LoadState::Loaded));
        assert_eq!(host.grid().entry_at(2).unwrap().load_state(), Some(LoadState::Loaded));
        assert_eq!(host.list().entry_at(0).unwrap().load_state(), Some(LoadState::Loading));

        script.complete(1);
        script.complete(0);
        for i in 0..3 {
            assert_eq!(host.list().entry_at(i).unwrap().load_state(), Some(LoadState::Loaded));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_and_preload_both_observe_completion() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        let first = host.initialize().await.unwrap();
        host.join_preload().await;

        script.complete(0);
        assert_eq!(first.wait().await, ShowState::Displayed);
        assert_eq!(host.list().entry_at(0).unwrap().load_state(), Some(LoadState::Loaded));
        assert_eq!(host.list().active_index(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_past_last_is_forwarded() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        ready(&host, &script).await;

        assert_eq!(host.show(2).wait().await, ShowState::Displayed);
        let request = host.next();
        assert_eq!(request.index(), 3);
        assert_eq!(request.wait().await, ShowState::Displayed);
        assert_eq!(script.show_calls().last(), Some(&3));
        // The engine kept its page; nothing in the list matches index 3.
        assert_eq!(host.index(), 2);
        assert_eq!(host.list().active_count(), 0);

        assert_eq!(host.show(0).wait().await, ShowState::Displayed);
        let request = host.prev();
        assert_eq!(request.index(), usize::MAX);
        assert_eq!(script.show_calls().last(), Some(&usize::MAX));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_manifest_removes_viewer() {
        let config = config(1_000, 3);
        let (engine, script) = ScriptedEngine::new();
        script.reject_manifests();
        let host = ViewerHost::new(Box::new(engine), Arc::new(CannedTransport::text("pages=3")), &config);

        let mount = MountPoint::new();
        let err = mount.mount(&host).await.unwrap_err();
        assert!(matches!(err, ViewerError::ManifestRejected));
        assert!(!mount.contains(&host));
        assert!(mount.is_empty());
        assert!(host.is_removed());
        assert!(matches!(host.status(), HostStatus::Removed { .. }));
        assert!(host.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_visible() {
        let config = config(1_000, 3);
        let (engine, _script) = ScriptedEngine::new();
        let host = ViewerHost::new(Box::new(engine), Arc::new(CannedTransport::failing("connection refused")), &config);

        let err = host.initialize().await.unwrap_err();
        assert!(matches!(err, ViewerError::Transport(_)));
        match host.status() {
            HostStatus::Failed { message } => assert!(message.contains("connection refused")),
            other => panic!("unexpected status: {other:?}"),
        }
        assert!(!host.is_removed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_locator() {
        let config = AppConfig::default();
        let (host, _script) = viewer(3, &config);
        assert!(matches!(host.initialize().await, Err(ViewerError::MissingLocator)));
        assert!(matches!(host.status(), HostStatus::Failed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_handle_times_out() {
        let mut config = config(500, 3);
        config.viewer.preload = false;
        let (host, script) = viewer(3, &config);
        script.withhold(1);
        host.initialize().await.unwrap();

        let request = host.show(1);
        assert!(host.surface().is_waiting_for(1));

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(host.surface().is_waiting_for(1));

        assert_eq!(request.wait().await, ShowState::TimedOut);
        assert!(!host.surface().is_waiting_for(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_bounded() {
        let config = config(100, 3);
        let (host, script) = viewer(3, &config);
        host.initialize().await.unwrap();
        host.join_preload().await;
        script.refuse(2);

        let request = host.show(2);
        assert_eq!(request.state(), ShowState::Pending { attempt: 1 });
        script.complete(2);
        assert_eq!(request.wait().await, ShowState::TimedOut);

        // One synchronous attempt plus one per pending cycle.
        let attempts = script.show_calls().iter().filter(|&&i| i == 2).count();
        assert_eq!(attempts, 4);
        assert!(host.surface().progress().iter().all(|p| p.index() != 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_ends_show_and_refetches() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        host.initialize().await.unwrap();
        host.join_preload().await;

        let started = tokio::time::Instant::now();
        let request = host.show(1);
        assert!(host.surface().is_waiting_for(1));
        script.fail(1);
        assert_eq!(request.wait().await, ShowState::Failed);
        assert!(started.elapsed() < Duration::from_millis(1_000));

        assert!(!host.surface().is_waiting_for(1));
        assert_eq!(host.list().entry_at(1).unwrap().load_state(), Some(LoadState::Failed));
        assert_eq!(host.grid().entry_at(1).unwrap().load_state(), Some(LoadState::Failed));

        // Showing it again issues a fresh fetch.
        let retry = host.show(1);
        assert_eq!(retry.state(), ShowState::Pending { attempt: 1 });
        assert_eq!(script.load_calls().iter().filter(|&&i| i == 1).count(), 2);

        script.complete(1);
        assert_eq!(retry.wait().await, ShowState::Displayed);
        assert_eq!(host.index(), 1);
        assert_eq!(host.list().entry_at(1).unwrap().load_state(), Some(LoadState::Loaded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_abandons_pending_show() {
        let mut config = config(1_000, 3);
        config.viewer.preload = false;
        let (host, script) = viewer(3, &config);
        let first = host.initialize().await.unwrap();

        host.remove("closed by user");
        script.complete(0);
        assert_eq!(first.wait().await, ShowState::Abandoned);
        assert_eq!(host.list().active_count(), 0);
        assert_eq!(host.show(1).state(), ShowState::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_viewer_ignores_preload_completions() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        host.initialize().await.unwrap();
        host.join_preload().await;

        host.remove("closed by user");
        script.complete(1);
        assert_eq!(host.list().entry_at(1).unwrap().load_state(), Some(LoadState::Loading));
    }

    #[tokio::test(start_paused = true)]
    async fn test_surface_click_direction() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        ready(&host, &script).await;
        host.show(1).wait().await;

        script.click_result(Some(Direction::Left));
        let request = host.click(&PointerEvent::new(10.0, 5.0, 800.0)).unwrap();
        assert_eq!(request.index(), 2);
        assert_eq!(request.wait().await, ShowState::Displayed);

        script.click_result(Some(Direction::Right));
        let request = host.click(&PointerEvent::new(790.0, 5.0, 800.0)).unwrap();
        assert_eq!(request.index(), 1);

        script.click_result(None);
        assert!(host.click(&PointerEvent::new(400.0, 5.0, 800.0)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_events_forwarded() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);

        let event = PointerEvent::new(1.0, 2.0, 800.0);
        host.pointer_down(&event);
        host.pointer_move(&event);
        host.pointer_up(&event);
        assert_eq!(script.pointer_log(), vec!["down", "move", "up"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_entry_click() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        ready(&host, &script).await;

        let entry = host.list().entry_at(2).unwrap();
        let request = entry.click().unwrap();
        assert_eq!(request.index(), 2);
        assert_eq!(request.wait().await, ShowState::Displayed);
        assert!(entry.is_active());
        assert_eq!(host.list().active_count(), 1);
        assert_eq!(host.index(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grid_entry_click_closes_grid() {
        let config = config(1_000, 3);
        let (host, script) = viewer(3, &config);
        ready(&host, &script).await;

        assert!(host.toggle_panel(PanelKind::Grid));
        let request = host.grid().entry_at(1).unwrap().click().unwrap();
        assert_eq!(request.wait().await, ShowState::Displayed);
        assert!(!host.grid().is_visible());
        assert_eq!(host.list().active_index(), Some(1));
        assert_eq!(host.grid().active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_is_stable() {
        let config = config(1_000, 3);
        let (host, _script) = viewer(3, &config);
        host.initialize().await.unwrap();

        let entry = host.list().entry_at(0).unwrap();
        let first = entry.host().unwrap();
        let second = entry.host().unwrap();
        assert!(first.ptr_eq(&second));
        assert!(first.ptr_eq(&host));
        assert!(entry.view().unwrap().ptr_eq(host.list()));
        assert!(entry.view().unwrap().ptr_eq(&entry.view().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_host_unlinks_entries() {
        let config = config(1_000, 3);
        let (host, _script) = viewer(3, &config);
        host.initialize().await.unwrap();
        let entry = host.list().entry_at(0).unwrap();

        host.join_preload().await;
        drop(host);
        settle().await;
        assert!(entry.host().is_none());
        assert!(entry.click().is_none());
    }

    #[test]
    fn test_search_panel() {
        let config = config(1_000, 3);
        let (host, _script) = viewer(3, &config);

        assert!(host.toggle_panel(PanelKind::Search));
        let form = SearchForm {
            text: "hokusai".into(),
            theme: Some("art".into()),
            rows: Some("-5".into()),
            ..Default::default()
        };
        let query = host.search(&form).unwrap();
        assert_eq!(query.rows(), Some(10));
        assert_eq!(host.search_panel().last_query(), Some(query));
    }
}
