//! Browser driving through the Chrome DevTools Protocol
//!
//! Everything the bot does to the website goes through the [`BrowserPage`]
//! trait. The production implementation is [`CdpPage`], which talks to a
//! Chrome/Chromium instance over the DevTools WebSocket. Tests substitute a
//! scripted page.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::AutoplayerError;
use crate::selector::Selector;

pub mod cdp_client;
pub mod connection;
pub mod launcher;
pub mod page;

pub use cdp_client::{CdpClient, TargetInfo};
pub use connection::CdpConnection;
pub use launcher::BrowserLauncher;
pub use page::CdpPage;

/// How a click is delivered to the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    /// `element.click()`, what a user click would do on a normal control
    Native,
    /// A synthetic bubbling `click` MouseEvent. Needed for image-map `<area>`
    /// elements whose handlers only fire from a dispatched event.
    Dispatch,
}

/// A single browser tab the bot can drive.
#[async_trait::async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and return once the load event fired.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), AutoplayerError>;

    /// Reload the current document and wait for the load event.
    async fn reload(&self, timeout: Duration) -> Result<(), AutoplayerError>;

    /// Full HTML of the current document.
    async fn content(&self) -> Result<String, AutoplayerError>;

    /// Current location.
    async fn url(&self) -> Result<String, AutoplayerError>;

    /// Evaluate a JavaScript expression and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, AutoplayerError>;

    /// Number of elements matching the selector.
    async fn count(&self, selector: &Selector) -> Result<usize, AutoplayerError>;

    /// Click the first element matching the selector. When
    /// `wait_for_navigation` is set, returns after the resulting page load.
    async fn click(
        &self,
        selector: &Selector,
        kind: ClickKind,
        wait_for_navigation: Option<Duration>,
    ) -> Result<(), AutoplayerError>;

    /// Set the value of the first matching input and fire input/change events.
    async fn fill(&self, selector: &Selector, text: &str) -> Result<(), AutoplayerError>;

    /// Click an element that opens a new tab and return that tab once loaded.
    async fn click_expect_popup(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Arc<dyn BrowserPage>, AutoplayerError>;
}
