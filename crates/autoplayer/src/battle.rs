//! The battle loop: read the screen, decide, submit a command URL, repeat.

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::BattleSettings;
use crate::errors::AutoplayerError;
use crate::page_parser;
use crate::pages::battle_page::{self, ActorHp, TurnType};
use crate::pages::{BattlePage, BattleResultPage, BattleStartPage, SitePage};
use crate::party::{skill_id, Ally, Skill, FIRST_ENEMY_ACTOR};
use crate::potion;
use crate::urls;

const FACT_CAST: u8 = 2;
const FACT_ATTACK: u8 = 3;
const FACT_USE_ITEM: u8 = 5;

/// What a party member does on their turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BattleAction {
    Attack { target: u8 },
    Cast { skill: Skill, target: u8 },
    UsePotion { id: u32 },
}

/// One submittable battle command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleCommand {
    /// Let the enemy with this actor id take its turn
    EnemyAdvance { enemy: u8 },
    Player { ally: Ally, action: BattleAction },
}

impl BattleCommand {
    pub fn url(&self) -> Result<String, AutoplayerError> {
        let url = match *self {
            BattleCommand::EnemyAdvance { enemy } => urls::enemy_turn_url(enemy),
            BattleCommand::Player { ally, action } => match action {
                BattleAction::Attack { target } => {
                    urls::player_turn_url(i32::from(target), FACT_ATTACK, "", "-1", ally.id())
                }
                BattleAction::Cast { skill, target } => urls::player_turn_url(
                    i32::from(target),
                    FACT_CAST,
                    &skill_id(ally, skill)?.to_string(),
                    "",
                    ally.id(),
                ),
                BattleAction::UsePotion { id } => {
                    urls::player_turn_url(-1, FACT_USE_ITEM, "", &id.to_string(), ally.id())
                }
            },
        };
        Ok(url)
    }
}

/// What the battle screen showed at the start of a party member's turn
#[derive(Debug, Clone, Default)]
pub struct BattleSnapshot {
    pub hp: Vec<ActorHp>,
    pub available_potions: Vec<&'static str>,
}

impl BattleSnapshot {
    pub fn from_html(page_html: &str) -> Self {
        Self {
            hp: battle_page::actor_hp(page_html),
            available_potions: potion::potions_in_page(page_html),
        }
    }

    pub fn ally_hp(&self, ally: Ally) -> Option<&ActorHp> {
        self.hp.iter().find(|entry| entry.ally == Some(ally))
    }

    /// Never a dead actor; the first enemy slot when nothing alive was parsed.
    pub fn first_living_enemy(&self) -> u8 {
        self.hp
            .iter()
            .find(|entry| entry.is_enemy() && entry.is_alive())
            .map(|entry| entry.actor_id)
            .unwrap_or(FIRST_ENEMY_ACTOR)
    }

    /// The living ally with the lowest HP ratio below `threshold`.
    pub fn most_wounded_ally(&self, threshold: f64) -> Option<&ActorHp> {
        self.hp
            .iter()
            .filter(|entry| entry.ally.is_some() && entry.is_alive())
            .filter(|entry| potion::needs_healing(entry.current, entry.max, threshold))
            .min_by(|a, b| hp_ratio(a).total_cmp(&hp_ratio(b)))
    }
}

fn hp_ratio(entry: &ActorHp) -> f64 {
    if entry.max <= 0 {
        return 1.0;
    }
    f64::from(entry.current) / f64::from(entry.max)
}

/// Pick the action for `ally`: potion heal, then a spell, then a basic attack.
pub fn choose_action(ally: Ally, snapshot: &BattleSnapshot, settings: &BattleSettings) -> BattleAction {
    let target = snapshot.first_living_enemy();
    let threshold = settings.heal_threshold;

    // Velm heals whoever is worst off, herself included, before drinking
    if ally == Ally::Velm && settings.can_cast(Skill::Heal) {
        if let Some(patient) = snapshot.most_wounded_ally(threshold) {
            return BattleAction::Cast {
                skill: Skill::Heal,
                target: patient.actor_id,
            };
        }
    }

    if let Some(own) = snapshot.ally_hp(ally) {
        if potion::needs_healing(own.current, own.max, threshold) {
            match potion::best_available(own.current, own.max, &snapshot.available_potions) {
                Some(best) => return BattleAction::UsePotion { id: best.id },
                None => debug!("{ally} needs healing but no potion is available"),
            }
        }
    }

    if ally == Ally::Mipsy && settings.can_cast(Skill::DirectDamage) {
        return BattleAction::Cast {
            skill: Skill::DirectDamage,
            target,
        };
    }

    BattleAction::Attack { target }
}

/// Counters for one or more battles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BattleReport {
    pub turns: u32,
    pub enemy_turns: u32,
    pub potions_used: u32,
    pub spells_cast: u32,
}

impl BattleReport {
    fn record(&mut self, action: &BattleAction) {
        match action {
            BattleAction::UsePotion { .. } => self.potions_used += 1,
            BattleAction::Cast { .. } => self.spells_cast += 1,
            BattleAction::Attack { .. } => {}
        }
    }
}

/// Runs an encounter from the start screen to the return-to-map link
#[derive(Clone)]
pub struct BattleHandler {
    site: SitePage,
    settings: BattleSettings,
}

impl BattleHandler {
    pub fn new(site: SitePage, settings: BattleSettings) -> Self {
        Self { site, settings }
    }

    pub fn settings(&self) -> &BattleSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut BattleSettings {
        &mut self.settings
    }

    /// Whether the current page belongs to an encounter.
    pub async fn is_in_battle(&self) -> Result<bool, AutoplayerError> {
        let html = self.site.content().await?;
        Ok(page_parser::is_battle_start_page(&html) || page_parser::is_battle_page(&html))
    }

    /// Press "Begin the Fight!" if we are on the start screen; otherwise the
    /// battle is already running and is picked up where it is.
    pub async fn start(&self) -> Result<(), AutoplayerError> {
        let start_page = BattleStartPage::new(self.site.clone());
        if start_page.is_battle_start().await? {
            info!("Found battle start. Starting battle...");
            start_page.click_start_battle_button().await
        } else {
            info!("Detected existing battle. Resuming...");
            Ok(())
        }
    }

    /// Play turns until the end-of-fight screen.
    #[instrument(level = "info", skip(self))]
    pub async fn win_battle(&self) -> Result<BattleReport, AutoplayerError> {
        let battle_page = BattlePage::new(self.site.clone());
        let mut report = BattleReport::default();
        let mut invalid_pages = 0u32;

        loop {
            if report.turns >= self.settings.max_turns {
                error!("Battle still running after {} turns", report.turns);
                return Err(AutoplayerError::BattleStuck(format!(
                    "exceeded {} turns",
                    self.settings.max_turns
                )));
            }

            let page_html = battle_page.site().content().await?;
            match self.play_turn(&battle_page, &page_html, &mut report).await {
                Ok(TurnType::BattleOver) => break,
                Ok(_) => invalid_pages = 0,
                Err(AutoplayerError::InvalidPageState(reason)) => {
                    invalid_pages += 1;
                    warn!(
                        "Unrecognized battle page ({invalid_pages}/{}): {reason}",
                        self.settings.max_invalid_pages
                    );
                    if invalid_pages > self.settings.max_invalid_pages {
                        error!("Giving up on battle after {invalid_pages} unrecognized pages");
                        return Err(AutoplayerError::BattleStuck(reason));
                    }
                    self.site
                        .go_to_url_and_wait_navigation(urls::MAIN_GAME_URL)
                        .await?;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Battle won in {} turns ({} potions, {} spells)",
            report.turns, report.potions_used, report.spells_cast
        );
        Ok(report)
    }

    async fn play_turn(
        &self,
        battle_page: &BattlePage,
        page_html: &str,
        report: &mut BattleReport,
    ) -> Result<TurnType, AutoplayerError> {
        let turn = battle_page::turn_type(page_html)?;
        let command = match turn {
            TurnType::BattleOver => return Ok(turn),
            TurnType::Enemy => {
                let enemy = battle_page::next_actor_id(page_html)?;
                report.enemy_turns += 1;
                BattleCommand::EnemyAdvance { enemy }
            }
            TurnType::Player => {
                let actor = battle_page::next_actor_id(page_html)?;
                let ally = Ally::from_actor_id(actor).ok_or_else(|| {
                    AutoplayerError::InvalidArgument(format!(
                        "Expected an ally ID between 1-4. Got: {actor}"
                    ))
                })?;
                let snapshot = BattleSnapshot::from_html(page_html);
                let action = choose_action(ally, &snapshot, &self.settings);
                debug!("{ally} chooses {:?}", action);
                BattleCommand::Player { ally, action }
            }
        };

        battle_page.submit_command(&command.url()?).await?;
        if let BattleCommand::Player { action, .. } = &command {
            report.record(action);
        }
        report.turns += 1;
        Ok(turn)
    }

    /// Leave the result screen for the overworld.
    pub async fn end_battle(&self) -> Result<(), AutoplayerError> {
        BattleResultPage::new(self.site.clone())
            .click_return_to_map_button()
            .await
    }

    /// Start, win and leave a battle.
    pub async fn fight(&self) -> Result<BattleReport, AutoplayerError> {
        self.start().await?;
        let report = self.win_battle().await?;
        self.end_battle().await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::browser::{BrowserPage, ClickKind};
    use crate::config::NavigationSettings;
    use crate::selector::Selector;

    const LOW_HP_TURN: &str = r#"<div class="contentModule phpGamesNonPortalView">
        <table><tr><td><b>Rohane</b><br><font size=1>30/120</font></td></tr>
        <tr><td>Giant Spider<br><font size=1>20/20</font></td></tr></table>
        <form name="ff"><input type="hidden" name="nxactor" value="1">
        <img src="//images.neopets.com/nq2/x/com_atk.gif"> <img src="//images.neopets.com/nq2/x/com_flee.gif">
        <select name="use_id"><option value="30011">Healing Vial (1)</option></select></form>
        </div>"#;

    /// A tab whose connection dropped: it still shows the last page but
    /// every navigation fails.
    struct DisconnectedPage;

    #[async_trait::async_trait]
    impl BrowserPage for DisconnectedPage {
        async fn goto(&self, _url: &str, _timeout: Duration) -> Result<(), AutoplayerError> {
            Err(AutoplayerError::Browser("connection closed".to_string()))
        }

        async fn reload(&self, _timeout: Duration) -> Result<(), AutoplayerError> {
            Err(AutoplayerError::Browser("connection closed".to_string()))
        }

        async fn content(&self) -> Result<String, AutoplayerError> {
            Ok(LOW_HP_TURN.to_string())
        }

        async fn url(&self) -> Result<String, AutoplayerError> {
            Ok(urls::MAIN_GAME_URL.to_string())
        }

        async fn evaluate(&self, _script: &str) -> Result<serde_json::Value, AutoplayerError> {
            Ok(serde_json::Value::Null)
        }

        async fn count(&self, _selector: &Selector) -> Result<usize, AutoplayerError> {
            Ok(0)
        }

        async fn click(
            &self,
            _selector: &Selector,
            _kind: ClickKind,
            _wait_for_navigation: Option<Duration>,
        ) -> Result<(), AutoplayerError> {
            Err(AutoplayerError::Browser("connection closed".to_string()))
        }

        async fn fill(&self, _selector: &Selector, _text: &str) -> Result<(), AutoplayerError> {
            Err(AutoplayerError::Browser("connection closed".to_string()))
        }

        async fn click_expect_popup(
            &self,
            _selector: &Selector,
            _timeout: Duration,
        ) -> Result<Arc<dyn BrowserPage>, AutoplayerError> {
            Err(AutoplayerError::Browser("connection closed".to_string()))
        }
    }

    fn hp(actor_id: u8, current: i32, max: i32) -> ActorHp {
        ActorHp {
            actor_id,
            ally: Ally::from_actor_id(actor_id),
            current,
            max,
        }
    }

    fn snapshot(hp: Vec<ActorHp>, potions: &[&'static str]) -> BattleSnapshot {
        BattleSnapshot {
            hp,
            available_potions: potions.to_vec(),
        }
    }

    fn settings_with(spells: &[Skill]) -> BattleSettings {
        let mut settings = BattleSettings::default();
        for spell in spells {
            settings.enable_spell(*spell);
        }
        settings
    }

    #[tokio::test]
    async fn test_failed_submission_is_not_counted() {
        let site = SitePage::new(Arc::new(DisconnectedPage), NavigationSettings::default());
        let handler = BattleHandler::new(site.clone(), BattleSettings::default());
        let battle_page = BattlePage::new(site);
        let mut report = BattleReport::default();

        let result = handler
            .play_turn(&battle_page, LOW_HP_TURN, &mut report)
            .await;

        assert!(matches!(result, Err(AutoplayerError::Browser(_))));
        assert_eq!(report.potions_used, 0);
        assert_eq!(report.turns, 0);
    }

    #[test]
    fn test_command_urls() {
        let advance = BattleCommand::EnemyAdvance { enemy: 5 };
        assert_eq!(
            advance.url().unwrap(),
            "https://www.neopets.com/games/nq2/nq2.phtml?target=-1&fact=1&parm=&use_id=&nxactor=5"
        );

        let attack = BattleCommand::Player {
            ally: Ally::Rohane,
            action: BattleAction::Attack { target: 6 },
        };
        assert_eq!(
            attack.url().unwrap(),
            "https://www.neopets.com/games/nq2/nq2.phtml?target=6&fact=3&parm=&use_id=-1&nxactor=1"
        );

        let drink = BattleCommand::Player {
            ally: Ally::Rohane,
            action: BattleAction::UsePotion { id: 30011 },
        };
        assert_eq!(
            drink.url().unwrap(),
            "https://www.neopets.com/games/nq2/nq2.phtml?target=-1&fact=5&parm=&use_id=30011&nxactor=1"
        );

        let cast = BattleCommand::Player {
            ally: Ally::Velm,
            action: BattleAction::Cast { skill: Skill::Heal, target: 2 },
        };
        assert_eq!(
            cast.url().unwrap(),
            "https://www.neopets.com/games/nq2/nq2.phtml?target=2&fact=2&parm=9401&use_id=&nxactor=4"
        );
    }

    #[test]
    fn test_cast_of_foreign_skill_is_rejected() {
        let cast = BattleCommand::Player {
            ally: Ally::Rohane,
            action: BattleAction::Cast { skill: Skill::Heal, target: 1 },
        };
        assert!(matches!(cast.url(), Err(AutoplayerError::InvalidArgument(_))));
    }

    #[test]
    fn test_wounded_ally_drinks_best_available_potion() {
        let snap = snapshot(
            vec![hp(1, 30, 100), hp(5, 20, 20)],
            &["Healing Vial", "Potion of Fortitude"],
        );
        let action = choose_action(Ally::Rohane, &snap, &BattleSettings::default());
        assert_eq!(action, BattleAction::UsePotion { id: 30022 });
    }

    #[test]
    fn test_wounded_ally_without_potions_attacks() {
        let snap = snapshot(vec![hp(1, 30, 100), hp(5, 20, 20)], &[]);
        let action = choose_action(Ally::Rohane, &snap, &BattleSettings::default());
        assert_eq!(action, BattleAction::Attack { target: 5 });
    }

    #[test]
    fn test_attack_skips_dead_enemies() {
        let snap = snapshot(vec![hp(1, 90, 100), hp(5, 0, 20), hp(6, 4, 20)], &[]);
        let action = choose_action(Ally::Talinia, &snap, &BattleSettings::default());
        assert_eq!(action, BattleAction::Attack { target: 6 });

        let nothing_parsed = BattleSnapshot::default();
        assert_eq!(
            choose_action(Ally::Rohane, &nothing_parsed, &BattleSettings::default()),
            BattleAction::Attack { target: 5 }
        );
    }

    #[test]
    fn test_velm_heals_most_wounded_before_drinking() {
        let snap = snapshot(
            vec![hp(1, 40, 100), hp(2, 10, 58), hp(4, 30, 80), hp(5, 20, 20)],
            &["Healing Potion"],
        );
        let settings = settings_with(&[Skill::Heal]);
        assert_eq!(
            choose_action(Ally::Velm, &snap, &settings),
            BattleAction::Cast { skill: Skill::Heal, target: 2 }
        );

        // Without the spell she drinks like everyone else
        assert_eq!(
            choose_action(Ally::Velm, &snap, &BattleSettings::default()),
            BattleAction::UsePotion { id: 30013 }
        );
    }

    #[test]
    fn test_velm_does_not_heal_the_dead() {
        let snap = snapshot(vec![hp(1, 0, 100), hp(4, 80, 80), hp(5, 9, 20)], &[]);
        let settings = settings_with(&[Skill::Heal]);
        assert_eq!(
            choose_action(Ally::Velm, &snap, &settings),
            BattleAction::Attack { target: 5 }
        );
    }

    #[test]
    fn test_mipsy_casts_direct_damage_when_enabled() {
        let snap = snapshot(vec![hp(2, 58, 58), hp(5, 0, 30), hp(6, 30, 30)], &[]);
        assert_eq!(
            choose_action(Ally::Mipsy, &snap, &settings_with(&[Skill::DirectDamage])),
            BattleAction::Cast { skill: Skill::DirectDamage, target: 6 }
        );
        assert_eq!(
            choose_action(Ally::Mipsy, &snap, &BattleSettings::default()),
            BattleAction::Attack { target: 6 }
        );
    }

    #[test]
    fn test_report_counts_actions() {
        let mut report = BattleReport::default();
        report.record(&BattleAction::UsePotion { id: 30011 });
        report.record(&BattleAction::Cast { skill: Skill::Heal, target: 1 });
        report.record(&BattleAction::Attack { target: 5 });
        assert_eq!(report.potions_used, 1);
        assert_eq!(report.spells_cast, 1);
    }
}
