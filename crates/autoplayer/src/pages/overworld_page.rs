use std::collections::HashSet;
use std::future::Future;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use super::site_page::SitePage;
use crate::errors::AutoplayerError;
use crate::html;
use crate::locator::Locator;
use crate::overworld::Direction;
use crate::urls;

pub const GAME_CONTAINER_CLASS: &str = "phpGamesNonPortalView";

const NORMAL_MODE_LOCATOR: &str = "a[href='nq2.phtml?act=travel&mode=1']";
const HUNTING_MODE_LOCATOR: &str = "a[href='nq2.phtml?act=travel&mode=2']";
const INVENTORY_LOCATOR: &str = "a[href='nq2.phtml?act=inv']";
const OPTIONS_LOCATOR: &str = "a[href='nq2.phtml?act=opt']";

static COORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"coords\((.*?)\)").expect("static regex is valid"));

/// Every `coords(...)` token inside the game container. The set changes
/// whenever the party moves, which is how a lost navigation is detected.
pub fn map_coords(page_html: &str) -> Vec<String> {
    let game_html = html::from_class(page_html, GAME_CONTAINER_CLASS);
    COORDS_RE
        .captures_iter(game_html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Outcome of checking whether a timed-out move went through
enum Recovery {
    Performed,
    NotPerformed,
}

/// The overworld map screen with its direction pad
#[derive(Clone)]
pub struct OverworldPage {
    site: SitePage,
}

impl OverworldPage {
    pub fn new(site: SitePage) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SitePage {
        &self.site
    }

    pub fn direction_locator(&self, direction: Direction) -> Locator {
        self.site
            .locator(format!("area[alt=\"{}\"]", direction.alt_text()))
    }

    pub async fn current_map_coords(&self) -> Result<Vec<String>, AutoplayerError> {
        Ok(map_coords(&self.site.content().await?))
    }

    /// Step in `direction` by clicking the direction pad. The result is either
    /// another overworld page or an encounter.
    pub async fn click_direction(&self, direction: Direction) -> Result<(), AutoplayerError> {
        let map_coords = self.current_map_coords().await?;
        let button = self.direction_locator(direction);
        if button.count().await? == 0 {
            return Err(AutoplayerError::InvalidArgument(format!(
                "Invalid direction for path direction: {} ({})",
                direction.digit(),
                direction.alt_text()
            )));
        }

        info!("Moving {}", direction.alt_text());
        self.with_move_recovery("direction click", &map_coords, || {
            button.dispatch_click_and_wait()
        })
        .await
    }

    /// Visit a movement URL directly with the same recovery as a click.
    pub async fn go_to_movement_url_with_wait(&self, movement_url: &str) -> Result<(), AutoplayerError> {
        let map_coords = self.current_map_coords().await?;
        let timeout = self.site.settings().navigation_timeout;
        let page = self.site.browser_page().clone();
        self.with_move_recovery(movement_url, &map_coords, || {
            let page = page.clone();
            async move {
                info!("Attempting to visit {movement_url} ...");
                page.goto(movement_url, timeout).await
            }
        })
        .await
    }

    async fn with_move_recovery<F, Fut>(
        &self,
        operation: &str,
        prev_map_coords: &[String],
        mut action: F,
    ) -> Result<(), AutoplayerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), AutoplayerError>>,
    {
        let num_retries = self.site.settings().movement_retries;
        for attempt in 1..=num_retries {
            match action().await {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!("Attempt {attempt} of {operation} failed: {e}");
                    match self.recover(prev_map_coords).await {
                        Ok(Recovery::Performed) => {
                            info!("The page failed to load but the action was performed.");
                            return Ok(());
                        }
                        Ok(Recovery::NotPerformed) => {
                            info!("The previous movement action did not go through. Resubmitting action...");
                        }
                        Err(reload_error) => {
                            warn!("Also failed to reload the page after failed movement: {reload_error}");
                        }
                    }
                }
            }
        }

        error!("Failed to complete {operation} after {num_retries} attempts.");
        Err(AutoplayerError::RetriesExhausted {
            operation: operation.to_string(),
            attempts: num_retries,
        })
    }

    /// Reload the game through a blank page and compare map coordinates with
    /// the ones seen before the move.
    async fn recover(&self, prev_map_coords: &[String]) -> Result<Recovery, AutoplayerError> {
        let settings = self.site.settings();
        let page = self.site.browser_page();
        info!("Attempting to reload the page and determine the result");

        page.goto(urls::BLANK_PAGE_URL, settings.navigation_timeout).await?;
        tokio::time::sleep(settings.settle_delay).await;
        page.goto(urls::MAIN_GAME_URL, settings.navigation_timeout).await?;
        tokio::time::sleep(settings.settle_delay).await;

        let before: HashSet<&String> = prev_map_coords.iter().collect();
        let after = self.current_map_coords().await?;
        let after: HashSet<&String> = after.iter().collect();
        if before == after {
            Ok(Recovery::NotPerformed)
        } else {
            Ok(Recovery::Performed)
        }
    }

    pub async fn click_normal_movement_button(&self) -> Result<(), AutoplayerError> {
        self.site
            .click_clickable_element(
                &self.site.locator(NORMAL_MODE_LOCATOR),
                "Could not click the normal mode button. This can happen if you were already in normal mode.",
            )
            .await
    }

    pub async fn click_hunting_movement_button(&self) -> Result<(), AutoplayerError> {
        self.site
            .click_clickable_element(
                &self.site.locator(HUNTING_MODE_LOCATOR),
                "Could not click the hunting mode button. This can happen if you were already in hunting mode.",
            )
            .await
    }

    pub async fn click_inventory_button(&self) -> Result<(), AutoplayerError> {
        self.site
            .click_clickable_element(
                &self.site.locator(INVENTORY_LOCATOR),
                "We were unable to click the inventory button. Ensure that you are on the overworld.",
            )
            .await
    }

    pub async fn click_options_button(&self) -> Result<(), AutoplayerError> {
        self.site
            .click_clickable_element(
                &self.site.locator(OPTIONS_LOCATOR),
                "We were unable to click the options button. Ensure that you are on the overworld.",
            )
            .await
    }
}
