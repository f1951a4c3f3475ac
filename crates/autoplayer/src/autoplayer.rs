use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::battle::{BattleHandler, BattleReport};
use crate::browser::BrowserPage;
use crate::config::{AutoplayerConfig, BattleSettings, Credentials};
use crate::errors::AutoplayerError;
use crate::inventory::InventoryHandler;
use crate::login::LoginHandler;
use crate::npc::{Npc, NpcHandler};
use crate::overworld::{Direction, MovementMode, OverworldHandler, Path, StepOutcome};
use crate::pages::SitePage;
use crate::party::{Ally, Skill};
use crate::skillpoint::SkillpointHandler;
use crate::urls;
use crate::walkthrough::{Chapter, Step};

/// Running totals for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub steps_taken: u32,
    pub battles_won: u32,
    pub turns: u32,
    pub potions_used: u32,
    pub spells_cast: u32,
}

impl RunStats {
    fn record_battle(&mut self, report: &BattleReport) {
        self.battles_won += 1;
        self.turns += report.turns;
        self.potions_used += report.potions_used;
        self.spells_cast += report.spells_cast;
    }
}

/// Plays the game on one logged-in session page.
pub struct Autoplayer {
    site: SitePage,
    overworld: OverworldHandler,
    battle: BattleHandler,
    skillpoints: SkillpointHandler,
    inventory: InventoryHandler,
    npcs: NpcHandler,
    stats: RunStats,
}

impl Autoplayer {
    /// Wrap a page that is already logged in.
    pub fn new(site: SitePage, battle_settings: BattleSettings) -> Self {
        Self {
            overworld: OverworldHandler::new(site.clone()),
            battle: BattleHandler::new(site.clone(), battle_settings),
            skillpoints: SkillpointHandler::new(site.clone()),
            inventory: InventoryHandler::new(site.clone()),
            npcs: NpcHandler::new(site.clone()),
            site,
            stats: RunStats::default(),
        }
    }

    /// Log in, open the game and make sure the party stands on the map.
    #[instrument(level = "info", skip_all, fields(user = credentials.username()))]
    pub async fn start(
        page: Arc<dyn BrowserPage>,
        credentials: Credentials,
        config: &AutoplayerConfig,
    ) -> Result<Self, AutoplayerError> {
        let site = SitePage::new(page, config.navigation.clone());
        site.go_to_url_and_wait_navigation(urls::HOME_PAGE_URL)
            .await?;

        let session = LoginHandler::new(site, credentials)
            .login_and_go_to_game()
            .await?;

        let mut autoplayer = Self::new(session, config.battle.clone());
        autoplayer.ensure_overworld().await?;
        info!("Successfully created all autoplayer components!");
        Ok(autoplayer)
    }

    pub fn site(&self) -> &SitePage {
        &self.site
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn battle_settings(&self) -> &BattleSettings {
        self.battle.settings()
    }

    /// Finish any battle on the current page, otherwise reload the game.
    /// Errors when neither gets us back to the map.
    pub async fn ensure_overworld(&mut self) -> Result<(), AutoplayerError> {
        if self.overworld.is_overworld().await? {
            return Ok(());
        }
        if !self.battle.is_in_battle().await? {
            info!("Not on the overworld, opening the main game page");
            self.site
                .go_to_url_and_wait_navigation(urls::MAIN_GAME_URL)
                .await?;
        }
        if self.battle.is_in_battle().await? {
            self.fight_encounter().await?;
        }

        if self.overworld.is_overworld().await? {
            Ok(())
        } else {
            Err(AutoplayerError::InvalidPageState(
                "Could not reach the overworld from the current page".to_string(),
            ))
        }
    }

    /// Win the encounter on the current page and return to the map.
    pub async fn fight_encounter(&mut self) -> Result<BattleReport, AutoplayerError> {
        let report = self.battle.fight().await?;
        self.stats.record_battle(&report);
        Ok(report)
    }

    /// Follow a path, fighting every encounter along the way.
    #[instrument(level = "info", skip_all, fields(path = %path))]
    pub async fn follow_path(&mut self, path: &Path) -> Result<(), AutoplayerError> {
        for direction in path.directions() {
            self.step(*direction).await?;
        }
        Ok(())
    }

    async fn step(&mut self, direction: Direction) -> Result<(), AutoplayerError> {
        let outcome = self.overworld.take_step(direction).await?;
        self.stats.steps_taken += 1;
        if outcome == StepOutcome::Encounter {
            self.fight_encounter().await?;
        }
        Ok(())
    }

    /// Walk back and forth in hunting mode for `steps` steps. The count must
    /// be even so the party ends on the tile it started from.
    #[instrument(level = "info", skip(self))]
    pub async fn grind_battles(
        &mut self,
        steps: u32,
        initial_path: Option<&Path>,
    ) -> Result<(), AutoplayerError> {
        if steps % 2 != 0 {
            return Err(AutoplayerError::InvalidArgument(format!(
                "The number of specified steps must be even so the battler returns to the tile it started on. Got: {steps}"
            )));
        }

        if let Some(path) = initial_path {
            info!("Walking down the specified initial path before grinding...");
            self.follow_path(path).await?;
        }

        self.overworld
            .switch_movement_mode(MovementMode::Hunting)
            .await?;
        let battles_before = self.stats.battles_won;
        for i in 0..steps {
            let direction = if i % 2 == 0 {
                Direction::West
            } else {
                Direction::East
            };
            self.step(direction).await?;
        }
        info!(
            "Grinding complete! {} battles fought",
            self.stats.battles_won - battles_before
        );

        info!("Returning to normal movement mode...");
        self.overworld
            .switch_movement_mode(MovementMode::Normal)
            .await?;

        if let Some(path) = initial_path {
            info!("Walking back from the specified initial path...");
            self.follow_path(&path.invert()).await?;
        }
        Ok(())
    }

    pub async fn spend_skillpoints(
        &self,
        ally: Ally,
        skill: Skill,
        times: u32,
    ) -> Result<(), AutoplayerError> {
        self.skillpoints
            .try_spend_multiple_skillpoints(ally, skill, times)
            .await
    }

    pub async fn equip(&self, item_id: u32, ally: Ally) -> Result<(), AutoplayerError> {
        self.inventory.equip(item_id, ally).await
    }

    pub async fn talk(&self, npc: Npc) -> Result<(), AutoplayerError> {
        self.npcs.talk(npc).await
    }

    pub fn enable_spell(&mut self, skill: Skill) {
        if !skill.is_castable() {
            warn!("{skill} is passive and is never cast");
        }
        self.battle.settings_mut().enable_spell(skill);
    }

    pub async fn run_step(&mut self, step: &Step) -> Result<(), AutoplayerError> {
        info!("Step: {step}");
        match step {
            Step::Walk(path) => self.follow_path(path).await,
            Step::Grind {
                steps,
                initial_path,
            } => self.grind_battles(*steps, initial_path.as_ref()).await,
            Step::SetMode(mode) => self.overworld.switch_movement_mode(*mode).await,
            Step::SpendSkill { ally, skill, times } => {
                self.spend_skillpoints(*ally, *skill, *times).await
            }
            Step::Talk(npc) => self.talk(*npc).await,
            Step::Equip { item, ally } => self.equip(*item, *ally).await,
            Step::EnableSpell(skill) => {
                self.enable_spell(*skill);
                Ok(())
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(chapter = %chapter.id))]
    pub async fn run_chapter(&mut self, chapter: &Chapter) -> Result<RunStats, AutoplayerError> {
        info!("Starting chapter: {}", chapter.title);
        let before = self.stats;
        for step in &chapter.steps {
            self.run_step(step).await?;
        }

        let after = self.stats;
        let delta = RunStats {
            steps_taken: after.steps_taken - before.steps_taken,
            battles_won: after.battles_won - before.battles_won,
            turns: after.turns - before.turns,
            potions_used: after.potions_used - before.potions_used,
            spells_cast: after.spells_cast - before.spells_cast,
        };
        info!(
            "Finished {}: {} steps, {} battles won",
            chapter.id, delta.steps_taken, delta.battles_won
        );
        Ok(delta)
    }
}
