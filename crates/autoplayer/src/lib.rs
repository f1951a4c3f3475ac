//! NeoQuest II autoplayer
//!
//! Drives a Chrome tab over the DevTools Protocol to play NeoQuest II: logs
//! into Neopets, walks the overworld, fights battles turn by turn, spends
//! skill points, talks to NPCs and follows scripted chapters of the game.
//! Page state is read from raw HTML; every game action is a URL visit or a
//! click.

pub mod autoplayer;
pub mod battle;
pub mod browser;
pub mod config;
pub mod errors;
pub mod html;
pub mod inventory;
pub mod locator;
pub mod logging;
pub mod login;
pub mod npc;
pub mod overworld;
pub mod page_parser;
pub mod pages;
pub mod party;
pub mod potion;
pub mod selector;
pub mod skillpoint;
pub mod urls;
pub mod walkthrough;

pub use autoplayer::{Autoplayer, RunStats};
pub use battle::{BattleHandler, BattleReport};
pub use browser::{BrowserLauncher, BrowserPage, CdpPage, ClickKind};
pub use config::{
    AutoplayerConfig, BattleSettings, BrowserSettings, Credentials, LoginMethod, NavigationSettings,
};
pub use errors::AutoplayerError;
pub use locator::Locator;
pub use npc::Npc;
pub use overworld::{Direction, MovementMode, Path};
pub use page_parser::PageType;
pub use party::{Ally, Skill};
pub use selector::Selector;
pub use walkthrough::{Chapter, ChapterId, Step};
