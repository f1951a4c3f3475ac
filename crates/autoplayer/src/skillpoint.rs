use tracing::{info, instrument};

use crate::errors::AutoplayerError;
use crate::pages::SitePage;
use crate::party::{skill_id, Ally, Skill};
use crate::urls;

/// Spends skill points by visiting the purchase URL.
///
/// Level-ups are not tracked, so a purchase without a free point is simply
/// ignored by the game.
#[derive(Clone)]
pub struct SkillpointHandler {
    site: SitePage,
}

impl SkillpointHandler {
    pub fn new(site: SitePage) -> Self {
        Self { site }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn try_spend_skillpoint(&self, ally: Ally, skill: Skill) -> Result<(), AutoplayerError> {
        let id = skill_id(ally, skill)?;
        self.site
            .go_to_url_and_wait_navigation(&urls::skill_purchase_url(ally, id))
            .await?;
        info!("Returning to main game page");
        self.site
            .go_to_url_and_wait_navigation(urls::MAIN_GAME_URL)
            .await
    }

    pub async fn try_spend_multiple_skillpoints(
        &self,
        ally: Ally,
        skill: Skill,
        times: u32,
    ) -> Result<(), AutoplayerError> {
        // Reject bad combinations before touching the page
        skill_id(ally, skill)?;
        for _ in 0..times {
            self.try_spend_skillpoint(ally, skill).await?;
        }
        Ok(())
    }
}
