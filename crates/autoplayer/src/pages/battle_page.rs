use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::overworld_page::GAME_CONTAINER_CLASS;
use super::site_page::SitePage;
use crate::errors::AutoplayerError;
use crate::html;
use crate::page_parser::{END_FIGHT_IMAGE_SRC, ENEMY_TURN_IMAGE_SRC, PLAYER_TURN_IMAGE_SRC};
use crate::party::{is_enemy_actor, Ally, FIRST_ENEMY_ACTOR};
use crate::potion;

static HP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").expect("static regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnType {
    Enemy,
    Player,
    BattleOver,
}

/// One `current/max` health entry read from the battle screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActorHp {
    pub actor_id: u8,
    pub ally: Option<Ally>,
    pub current: i32,
    pub max: i32,
}

impl ActorHp {
    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn is_enemy(&self) -> bool {
        self.ally.is_none()
    }
}

/// Whose turn it is. The enemy marker wins over the attack button because
/// both can be present while an enemy acts.
pub fn turn_type(page_html: &str) -> Result<TurnType, AutoplayerError> {
    let has_src = |src: &str| html::has_tag_with(page_html, None, &[("src", src)]);
    if has_src(ENEMY_TURN_IMAGE_SRC) {
        Ok(TurnType::Enemy)
    } else if has_src(PLAYER_TURN_IMAGE_SRC) {
        Ok(TurnType::Player)
    } else if has_src(END_FIGHT_IMAGE_SRC) {
        Ok(TurnType::BattleOver)
    } else {
        Err(AutoplayerError::InvalidPageState(
            "It is neither the player or enemy's turn. You are likely not on a battle page!"
                .to_string(),
        ))
    }
}

/// The hidden `nxactor` input: actor id of whoever acts next.
pub fn next_actor_id(page_html: &str) -> Result<u8, AutoplayerError> {
    let input = html::find_tag_with(
        page_html,
        Some("input"),
        &[("type", "hidden"), ("name", "nxactor")],
    )
    .ok_or_else(|| {
        AutoplayerError::InvalidPageState(
            "Could not find nxactor hidden input on the battle page.".to_string(),
        )
    })?;

    let raw = input.attr("value").unwrap_or_default();
    raw.trim().parse::<u8>().map_err(|_| {
        AutoplayerError::InvalidPageState(format!("nxactor value '{raw}' is not an actor id"))
    })
}

/// Health of everyone on the battle screen, in page order.
///
/// An entry belongs to an ally when that ally's name appeared since the
/// previous entry and has not been claimed yet; an entry with no such name
/// is an enemy, numbered from actor 5. Entries preceded only by names that
/// were already claimed are repeats and skipped.
pub fn actor_hp(page_html: &str) -> Vec<ActorHp> {
    let game_html = html::from_class(page_html, GAME_CONTAINER_CLASS);
    let mut entries: Vec<ActorHp> = Vec::new();
    let mut names_seen: Vec<Ally> = Vec::new();
    let mut next_enemy = FIRST_ENEMY_ACTOR;

    for segment in html::text_segments(game_html) {
        let Some(caps) = HP_RE.captures(&segment) else {
            names_seen.extend(
                Ally::ALL
                    .into_iter()
                    .filter(|ally| mentions(&segment, ally.name())),
            );
            continue;
        };
        let (Ok(current), Ok(max)) = (caps[1].parse::<i32>(), caps[2].parse::<i32>()) else {
            continue;
        };

        let claimed = |ally: &Ally| entries.iter().any(|e| e.ally == Some(*ally));
        let unclaimed = names_seen.iter().copied().find(|ally| !claimed(ally));
        match unclaimed {
            Some(ally) => entries.push(ActorHp {
                actor_id: ally.id(),
                ally: Some(ally),
                current,
                max,
            }),
            None if names_seen.is_empty() && is_enemy_actor(next_enemy) => {
                entries.push(ActorHp {
                    actor_id: next_enemy,
                    ally: None,
                    current,
                    max,
                });
                next_enemy += 1;
            }
            None => debug!("Skipping repeated HP entry {current}/{max}"),
        }
        names_seen.clear();
    }

    debug!("Parsed HP entries: {:?}", entries);
    entries
}

fn mentions(segment: &str, name: &str) -> bool {
    segment
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == name)
}

/// A battle in progress
#[derive(Clone)]
pub struct BattlePage {
    site: SitePage,
}

impl BattlePage {
    pub fn new(site: SitePage) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SitePage {
        &self.site
    }

    pub async fn get_turn_type(&self) -> Result<TurnType, AutoplayerError> {
        turn_type(&self.site.content().await?)
    }

    pub async fn get_next_actor_id(&self) -> Result<u8, AutoplayerError> {
        next_actor_id(&self.site.content().await?)
    }

    pub async fn get_actor_hp(&self) -> Result<Vec<ActorHp>, AutoplayerError> {
        Ok(actor_hp(&self.site.content().await?))
    }

    /// Names of healing potions listed on the page.
    pub async fn get_available_healing_potions(&self) -> Result<Vec<&'static str>, AutoplayerError> {
        Ok(potion::potions_in_page(&self.site.content().await?))
    }

    /// Submit a command URL and wait for the next battle screen.
    pub async fn submit_command(&self, command_url: &str) -> Result<(), AutoplayerError> {
        self.site.go_to_url_and_wait_navigation(command_url).await
    }
}
