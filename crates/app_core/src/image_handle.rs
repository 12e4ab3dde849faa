//! Per-page image handle and its one-shot load-completion signal

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

type Listener = Box<dyn FnOnce(LoadOutcome) + Send>;

/// How a page image load ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Handle to one page image owned by a render engine.
///
/// Settling is a latch: it happens once, with either outcome. Every listener
/// registered before or after that moment runs exactly once, and later
/// `complete()`/`fail()` calls do nothing.
#[derive(Clone)]
pub struct ImageHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    src: String,
    state: Mutex<HandleState>,
    done: watch::Sender<Option<LoadOutcome>>,
}

#[derive(Default)]
struct HandleState {
    outcome: Option<LoadOutcome>,
    listeners: Vec<Listener>,
}

impl ImageHandle {
    pub fn new(src: impl Into<String>) -> Self {
        let (done, _) = watch::channel(None);
        Self {
            inner: Arc::new(HandleInner {
                src: src.into(),
                state: Mutex::new(HandleState::default()),
                done,
            }),
        }
    }

    /// Source URI this handle loads
    pub fn src(&self) -> &str {
        &self.inner.src
    }

    /// `None` while the load is in flight
    pub fn outcome(&self) -> Option<LoadOutcome> {
        self.inner.state.lock().outcome
    }

    /// Has the image finished loading?
    pub fn is_complete(&self) -> bool {
        self.outcome() == Some(LoadOutcome::Loaded)
    }

    pub fn is_failed(&self) -> bool {
        self.outcome() == Some(LoadOutcome::Failed)
    }

    /// Register a listener for the load-completion signal.
    ///
    /// Runs immediately when the image is already loaded; never runs if the
    /// load fails.
    pub fn on_loaded<F>(&self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_settled(move |outcome| {
            if outcome == LoadOutcome::Loaded {
                listener();
            }
        });
    }

    /// Register a listener for either outcome.
    ///
    /// Runs immediately when the handle has already settled.
    pub fn on_settled<F>(&self, listener: F)
    where
        F: FnOnce(LoadOutcome) + Send + 'static,
    {
        let mut state = self.inner.state.lock();
        match state.outcome {
            Some(outcome) => {
                drop(state);
                listener(outcome);
            }
            None => state.listeners.push(Box::new(listener)),
        }
    }

    /// Wait until the handle settles
    pub async fn loaded(&self) -> LoadOutcome {
        let mut rx = self.inner.done.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).unwrap_or(LoadOutcome::Failed),
            Err(_) => LoadOutcome::Failed,
        };
        outcome
    }

    /// Fire the load-completion signal. Returns false if already settled.
    pub fn complete(&self) -> bool {
        self.settle(LoadOutcome::Loaded)
    }

    /// Record a failed load. Returns false if already settled.
    pub fn fail(&self) -> bool {
        self.settle(LoadOutcome::Failed)
    }

    fn settle(&self, outcome: LoadOutcome) -> bool {
        let listeners = {
            let mut state = self.inner.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome);
            std::mem::take(&mut state.listeners)
        };

        tracing::trace!(src = %self.inner.src, ?outcome, listeners = listeners.len(), "image settled");
        self.inner.done.send_replace(Some(outcome));
        // Listeners run outside the lock so they may touch this handle again.
        for listener in listeners {
            listener(outcome);
        }
        true
    }

    /// Do both handles refer to the same image?
    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("src", &self.inner.src)
            .field("outcome", &self.outcome())
            .finish()
    }
}
