use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::browser::BrowserPage;
use crate::config::NavigationSettings;
use crate::errors::AutoplayerError;
use crate::locator::Locator;
use crate::selector::Selector;
use crate::urls;

/// Base page object: the session tab plus the retry policy for talking to it
#[derive(Clone)]
pub struct SitePage {
    page: Arc<dyn BrowserPage>,
    settings: NavigationSettings,
}

impl SitePage {
    pub fn new(page: Arc<dyn BrowserPage>, settings: NavigationSettings) -> Self {
        Self { page, settings }
    }

    pub fn browser_page(&self) -> &Arc<dyn BrowserPage> {
        &self.page
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// A locator on this page using the navigation timeout.
    pub fn locator(&self, selector: impl Into<Selector>) -> Locator {
        Locator::new(self.page.clone(), selector).set_default_timeout(self.settings.navigation_timeout)
    }

    pub async fn content(&self) -> Result<String, AutoplayerError> {
        self.page.content().await
    }

    pub async fn url(&self) -> Result<String, AutoplayerError> {
        self.page.url().await
    }

    /// Navigate and wait for the load event, retrying through a blank page.
    #[instrument(level = "debug", skip(self))]
    pub async fn go_to_url_and_wait_navigation(&self, url: &str) -> Result<(), AutoplayerError> {
        let max_retries = self.settings.navigation_retries;
        let timeout = self.settings.navigation_timeout;

        for attempt in 1..=max_retries {
            match self.page.goto(url, timeout).await {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!("Navigation attempt {attempt} to {url} failed: {e}");
                    if let Err(blank_error) = self.page.goto(urls::BLANK_PAGE_URL, timeout).await {
                        warn!(
                            "Also failed to navigate to blank page before trying navigation again: {blank_error}"
                        );
                    }
                }
            }
        }

        error!("Failed to navigate to {url} after {max_retries} attempts.");
        Err(AutoplayerError::RetriesExhausted {
            operation: format!("navigation to {url}"),
            attempts: max_retries,
        })
    }

    /// Click an element that triggers a page load, reloading the page between
    /// failed attempts.
    pub async fn click_clickable_element(
        &self,
        button: &Locator,
        error_message: &str,
    ) -> Result<(), AutoplayerError> {
        let max_retries = self.settings.click_retries;

        for attempt in 1..=max_retries {
            match button.click_and_wait().await {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!("{error_message} Attempt {attempt} failed: {e}");
                    if let Err(reload_error) = self.page.reload(self.settings.navigation_timeout).await {
                        warn!("Reload attempt failed during click retry: {reload_error}");
                    }
                }
            }
        }

        error!("Failed to click element after {max_retries} attempts.");
        Err(AutoplayerError::RetriesExhausted {
            operation: format!("click on {}", button.selector()),
            attempts: max_retries,
        })
    }

    /// Click the element whose own text is exactly `link_text`.
    pub async fn click_link_matching_text(&self, link_text: &str) -> Result<(), AutoplayerError> {
        info!("Clicking link '{link_text}'");
        self.locator(Selector::text(link_text)).click_and_wait().await
    }
}
