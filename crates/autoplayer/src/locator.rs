use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use crate::browser::{BrowserPage, ClickKind};
use crate::errors::AutoplayerError;
use crate::selector::Selector;

// Default timeout if none is specified on the locator itself
const DEFAULT_LOCATOR_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A selector bound to a page, resolved lazily on every action
#[derive(Clone)]
pub struct Locator {
    page: Arc<dyn BrowserPage>,
    selector: Selector,
    timeout: Duration,
}

impl std::fmt::Debug for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator")
            .field("selector", &self.selector)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Locator {
    pub fn new(page: Arc<dyn BrowserPage>, selector: impl Into<Selector>) -> Self {
        Self {
            page,
            selector: selector.into(),
            timeout: DEFAULT_LOCATOR_TIMEOUT,
        }
    }

    /// Set a default timeout for waiting operations on this locator instance.
    pub fn set_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn count(&self) -> Result<usize, AutoplayerError> {
        self.page.count(&self.selector).await
    }

    /// Poll until at least one element matches, up to `timeout` (or the
    /// locator's default).
    #[instrument(level = "debug", skip(self, timeout))]
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<(), AutoplayerError> {
        debug!("Waiting for element matching selector: {}", self.selector);
        let effective_timeout = timeout.unwrap_or(self.timeout);
        let deadline = Instant::now() + effective_timeout;
        loop {
            if self.count().await? > 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AutoplayerError::Timeout(format!(
                    "Timed out after {effective_timeout:?} waiting for element {}",
                    self.selector
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Click without waiting for a navigation.
    pub async fn click(&self) -> Result<(), AutoplayerError> {
        self.page
            .click(&self.selector, ClickKind::Native, None)
            .await
    }

    /// Click and wait for the resulting page load.
    pub async fn click_and_wait(&self) -> Result<(), AutoplayerError> {
        self.page
            .click(&self.selector, ClickKind::Native, Some(self.timeout))
            .await
    }

    /// Fire a synthetic click event (for image-map areas that only react to
    /// script-dispatched clicks) and wait for the resulting page load.
    pub async fn dispatch_click_and_wait(&self) -> Result<(), AutoplayerError> {
        self.page
            .click(&self.selector, ClickKind::Dispatch, Some(self.timeout))
            .await
    }

    pub async fn fill(&self, text: &str) -> Result<(), AutoplayerError> {
        self.page.fill(&self.selector, text).await
    }
}
