//! Page objects for the site and the game screens.
//!
//! Each page object wraps the shared session tab; none of them own browser
//! state of their own, so they are cheap to build on demand.

pub mod battle_page;
pub mod battle_result_page;
pub mod battle_start_page;
pub mod overworld_page;
pub mod site_page;

pub use battle_page::{ActorHp, BattlePage, TurnType};
pub use battle_result_page::BattleResultPage;
pub use battle_start_page::BattleStartPage;
pub use overworld_page::OverworldPage;
pub use site_page::SitePage;
