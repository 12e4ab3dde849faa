//! Show request state machine
//!
//! A request for page `i` starts as [`ShowState::Requested`]. If the engine
//! displays the page straight away it is [`ShowState::Displayed`]; otherwise
//! it cycles through [`ShowState::Pending`] until the image arrives, the
//! retry budget runs out, or the host goes away.

use app_core::ViewerConfig;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowState {
    Requested,
    /// Waiting for the image; `attempt` counts pending cycles from 1
    Pending { attempt: u32 },
    Displayed,
    TimedOut,
    /// The image fetch failed; a later show fetches it again
    Failed,
    /// The host was dropped or removed before the page could be shown
    Abandoned,
}

impl ShowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShowState::Displayed | ShowState::TimedOut | ShowState::Failed | ShowState::Abandoned
        )
    }
}

/// Bounds on the pending/retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Longest wait for one load-completion signal
    pub load_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            max_attempts: config.max_show_attempts.max(1),
            load_timeout: config.load_timeout(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

/// Handle on one `show(i)` call
#[derive(Debug)]
pub struct ShowRequest {
    index: usize,
    state: watch::Receiver<ShowState>,
}

impl ShowRequest {
    pub(crate) fn settled(index: usize, state: ShowState) -> Self {
        let (_, rx) = watch::channel(state);
        Self { index, state: rx }
    }

    pub(crate) fn tracking(index: usize, state: watch::Receiver<ShowState>) -> Self {
        Self { index, state }
    }

    /// Requested page
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current state, without waiting
    pub fn state(&self) -> ShowState {
        *self.state.borrow()
    }

    pub fn is_settled(&self) -> bool {
        self.state().is_terminal()
    }

    /// Wait for the terminal state
    pub async fn wait(mut self) -> ShowState {
        match self.state.wait_for(ShowState::is_terminal).await {
            Ok(state) => *state,
            // Driver went away without settling.
            Err(_) => ShowState::Abandoned,
        }
    }
}
