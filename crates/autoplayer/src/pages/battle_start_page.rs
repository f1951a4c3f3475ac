use tracing::info;

use super::site_page::SitePage;
use crate::errors::AutoplayerError;
use crate::page_parser;

const BATTLE_START_LOCATOR: &str = "img[alt='Begin the Fight!']";

/// The screen shown before the first turn of an encounter
#[derive(Clone)]
pub struct BattleStartPage {
    site: SitePage,
}

impl BattleStartPage {
    pub fn new(site: SitePage) -> Self {
        Self { site }
    }

    pub async fn is_battle_start(&self) -> Result<bool, AutoplayerError> {
        Ok(page_parser::is_battle_start_page(&self.site.content().await?))
    }

    /// Enter the battle. The resulting page is a battle page.
    pub async fn click_start_battle_button(&self) -> Result<(), AutoplayerError> {
        info!("Starting battle");
        self.site
            .click_clickable_element(
                &self.site.locator(BATTLE_START_LOCATOR),
                "We were unable to click the start battle button. Ensure that you are on a battle start page!",
            )
            .await
    }
}
