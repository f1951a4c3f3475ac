//! Every site and game URL the autoplayer visits.

use crate::party::Ally;

// Site
pub const LOGIN_TRADITIONAL_URL: &str = "https://www.neopets.com/login/";
pub const LOGIN_NEOPASS_URL: &str = "https://neopass.neopets.com/login";
/// After NeoPass authentication but before picking a Neopets account
pub const NEOPASS_ACCOUNTS_URL: &str = "https://account.neopets.com/";
pub const NEOPASS_ACCOUNTS_SELECTION_URL: &str = "https://account.neopets.com/classic/login";
pub const HOME_PAGE_URL: &str = "https://www.neopets.com/home/";
pub const BLANK_PAGE_URL: &str = "about:blank";

// Game
pub const GAME_INDEX_URL: &str = "https://www.neopets.com/games/nq2/index.phtml";
pub const MAIN_GAME_URL: &str = "https://www.neopets.com/games/nq2/nq2.phtml";
pub const INVENTORY_URL: &str = "https://www.neopets.com/games/nq2/nq2.phtml?act=inv";
pub const MOVEMENT_NORMAL_URL: &str = "https://www.neopets.com/games/nq2/nq2.phtml?act=travel&mode=1";
pub const MOVEMENT_HUNTING_URL: &str =
    "https://www.neopets.com/games/nq2/nq2.phtml?act=travel&mode=2";
pub const BATTLE_START_URL: &str = "https://www.neopets.com/games/nq2/nq2.phtml?start=1";

/// Skill page of one party member
pub fn skills_url(ally: Ally) -> String {
    format!("{MAIN_GAME_URL}?act=skills&show_char={}", ally.id())
}

/// Overworld step in one direction (1-8)
pub fn movement_url(direction: u8) -> String {
    format!("{MAIN_GAME_URL}?act=move&dir={direction}")
}

/// Advance the battle through an enemy's turn
pub fn enemy_turn_url(enemy_actor: u8) -> String {
    format!("{MAIN_GAME_URL}?target=-1&fact=1&parm=&use_id=&nxactor={enemy_actor}")
}

/// Submit a party member's action. Empty `parm`/`use_id` are sent as-is.
pub fn player_turn_url(target: i32, fact: u8, parm: &str, use_id: &str, ally_actor: u8) -> String {
    format!(
        "{MAIN_GAME_URL}?target={target}&fact={fact}&parm={parm}&use_id={use_id}&nxactor={ally_actor}"
    )
}

pub fn skill_purchase_url(ally: Ally, skill_id: u32) -> String {
    format!(
        "{MAIN_GAME_URL}?act=skills&buy_char={}&confirm=1&skopt_{skill_id}=1",
        ally.id()
    )
}

pub fn equip_url(item_id: u32, ally: Ally) -> String {
    format!(
        "{MAIN_GAME_URL}?act=inv&iact=equip&targ_item={item_id}&targ_char={}",
        ally.id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        assert_eq!(
            movement_url(7),
            "https://www.neopets.com/games/nq2/nq2.phtml?act=move&dir=7"
        );
        assert_eq!(
            enemy_turn_url(6),
            "https://www.neopets.com/games/nq2/nq2.phtml?target=-1&fact=1&parm=&use_id=&nxactor=6"
        );
        assert_eq!(
            player_turn_url(-1, 5, "", "30011", 1),
            "https://www.neopets.com/games/nq2/nq2.phtml?target=-1&fact=5&parm=&use_id=30011&nxactor=1"
        );
        assert_eq!(
            skill_purchase_url(Ally::Rohane, 9502),
            "https://www.neopets.com/games/nq2/nq2.phtml?act=skills&buy_char=1&confirm=1&skopt_9502=1"
        );
        assert_eq!(
            equip_url(10011, Ally::Rohane),
            "https://www.neopets.com/games/nq2/nq2.phtml?act=inv&iact=equip&targ_item=10011&targ_char=1"
        );
        assert_eq!(
            skills_url(Ally::Velm),
            "https://www.neopets.com/games/nq2/nq2.phtml?act=skills&show_char=4"
        );
    }
}
