use super::site_page::SitePage;
use crate::errors::AutoplayerError;

const BATTLE_END_LOCATOR: &str = "a[href='nq2.phtml?finish=1']";

/// The screen after the last blow, linking back to the map
#[derive(Clone)]
pub struct BattleResultPage {
    site: SitePage,
}

impl BattleResultPage {
    pub fn new(site: SitePage) -> Self {
        Self { site }
    }

    pub async fn click_return_to_map_button(&self) -> Result<(), AutoplayerError> {
        self.site
            .click_clickable_element(
                &self.site.locator(BATTLE_END_LOCATOR),
                "We were unable to click the return to map button. Ensure that you are on a post battle page!",
            )
            .await
    }
}
