use serde::Serialize;

use crate::html;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageType {
    Home,
    NeopassLogin,
    NeopassAccountView,
    NeopassAccountSelection,
    TraditionalLogin,
    GameIndex,
    GameOverworld,
    GameSkills,
    GameInventory,
    GameNpcTrade,
    GameBattleStart,
    GameBattle,
    Unrecognized,
}

pub const BATTLE_START_IMAGE_SRC: &str = "//images.neopets.com/nq2/x/com_begin.gif";
pub const BATTLE_START_IMAGE_ALT: &str = "Begin the Fight!";
pub const ENEMY_TURN_IMAGE_SRC: &str = "//images.neopets.com/nq2/x/com_next.gif";
pub const PLAYER_TURN_IMAGE_SRC: &str = "//images.neopets.com/nq2/x/com_atk.gif";
pub const END_FIGHT_IMAGE_SRC: &str = "//images.neopets.com/nq2/x/com_end.gif";

/// Identify the page from its HTML. Only pages with a distinctive marker are
/// recognised; the other variants are for callers that know where they are.
pub fn classify(page_html: &str) -> PageType {
    if is_neopass_login_page(page_html) {
        PageType::NeopassLogin
    } else if is_traditional_login_page(page_html) {
        PageType::TraditionalLogin
    } else if is_home_page(page_html) {
        PageType::Home
    } else if is_overworld_page(page_html) {
        PageType::GameOverworld
    } else if is_battle_start_page(page_html) {
        PageType::GameBattleStart
    } else if is_battle_page(page_html) {
        PageType::GameBattle
    } else {
        PageType::Unrecognized
    }
}

pub fn is_neopass_login_page(page_html: &str) -> bool {
    html::has_tag_with(page_html, None, &[("type", "email")])
        && html::has_tag_with(page_html, None, &[("for", "email")])
}

pub fn is_traditional_login_page(page_html: &str) -> bool {
    html::has_tag_with(page_html, None, &[("class", "login-form")])
}

pub fn is_home_page(page_html: &str) -> bool {
    html::has_tag_with(page_html, None, &[("class", "container theme-bg")])
}

pub fn is_overworld_page(page_html: &str) -> bool {
    html::has_tag_with(page_html, None, &[("name", "navmap")])
}

pub fn is_battle_start_page(page_html: &str) -> bool {
    html::has_tag_with(page_html, Some("img"), &[("alt", BATTLE_START_IMAGE_ALT)])
        || html::has_tag_with(page_html, Some("img"), &[("src", BATTLE_START_IMAGE_SRC)])
}

pub fn is_battle_page(page_html: &str) -> bool {
    html::has_tag_with(
        page_html,
        Some("input"),
        &[("type", "hidden"), ("name", "nxactor")],
    ) || [ENEMY_TURN_IMAGE_SRC, PLAYER_TURN_IMAGE_SRC, END_FIGHT_IMAGE_SRC]
        .iter()
        .any(|src| html::has_tag_with(page_html, None, &[("src", src)]))
}
