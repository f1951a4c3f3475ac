use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::AutoplayerError;
use crate::pages::SitePage;
use crate::urls;

/// Characters the walkthrough talks to or trades with. Being in range on
/// the map is enough; each conversation is a fixed list of game URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Npc {
    /// Rests the party at home
    Mother,
    /// Opens the shop page
    Pongoras,
    Tebor,
    Mipsy,
    Potraddo,
    WitheredGhost,
    Uthare,
    Patannis,
    GuardThyet,
    Talinia,
    Allden,
    Sabaliz,
    Velm,
    Lifira,
    LifiraPart2,
    Bukaru,
    Medallion,
    MedallionCentrepiece,
    MedallionGemstone,
    Coltzan,
    BrainTree,
    AugurFaunt,
    Caereli,
    Deleri,
    Mekava,
    Lusina,
    Stenvela,
    Vitrini,
    VitriniKey,
    Lyra,
}

impl Npc {
    pub const ALL: [Npc; 30] = [
        Npc::Mother,
        Npc::Pongoras,
        Npc::Tebor,
        Npc::Mipsy,
        Npc::Potraddo,
        Npc::WitheredGhost,
        Npc::Uthare,
        Npc::Patannis,
        Npc::GuardThyet,
        Npc::Talinia,
        Npc::Allden,
        Npc::Sabaliz,
        Npc::Velm,
        Npc::Lifira,
        Npc::LifiraPart2,
        Npc::Bukaru,
        Npc::Medallion,
        Npc::MedallionCentrepiece,
        Npc::MedallionGemstone,
        Npc::Coltzan,
        Npc::BrainTree,
        Npc::AugurFaunt,
        Npc::Caereli,
        Npc::Deleri,
        Npc::Mekava,
        Npc::Lusina,
        Npc::Stenvela,
        Npc::Vitrini,
        Npc::VitriniKey,
        Npc::Lyra,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Npc::Mother => "mother",
            Npc::Pongoras => "pongoras",
            Npc::Tebor => "tebor",
            Npc::Mipsy => "mipsy",
            Npc::Potraddo => "potraddo",
            Npc::WitheredGhost => "withered-ghost",
            Npc::Uthare => "uthare",
            Npc::Patannis => "patannis",
            Npc::GuardThyet => "guard-thyet",
            Npc::Talinia => "talinia",
            Npc::Allden => "allden",
            Npc::Sabaliz => "sabaliz",
            Npc::Velm => "velm",
            Npc::Lifira => "lifira",
            Npc::LifiraPart2 => "lifira-part2",
            Npc::Bukaru => "bukaru",
            Npc::Medallion => "medallion",
            Npc::MedallionCentrepiece => "medallion-centrepiece",
            Npc::MedallionGemstone => "medallion-gemstone",
            Npc::Coltzan => "coltzan",
            Npc::BrainTree => "brain-tree",
            Npc::AugurFaunt => "augur-faunt",
            Npc::Caereli => "caereli",
            Npc::Deleri => "deleri",
            Npc::Mekava => "mekava",
            Npc::Lusina => "lusina",
            Npc::Stenvela => "stenvela",
            Npc::Vitrini => "vitrini",
            Npc::VitriniKey => "vitrini-key",
            Npc::Lyra => "lyra",
        }
    }

    /// Query strings of the conversation, in order.
    fn dialogue(self) -> &'static [&'static str] {
        match self {
            Npc::Mother => &["act=talk&targ=10201&say=rest"],
            Npc::Pongoras => &["act=merch&targ=10202&greet=1"],
            Npc::Tebor => &[
                "act=merch&targ=10401&greet=1",
                "act=merch&targ=10401&mact=buy&targ_item=10011&quant=1",
            ],
            Npc::Mipsy => &["act=talk&targ=10408&say=join"],
            Npc::Potraddo => &[
                "act=talk&targ=10718",
                "act=talk&targ=10718&say=city",
                "act=talk&targ=10718&say=no",
                "act=talk&targ=10718&say=about",
                "act=talk&targ=10718&say=east",
                "act=talk&targ=10718&say=enter",
            ],
            Npc::WitheredGhost => &["act=talk&targ=10801", "act=talk&targ=10801&say=key"],
            Npc::Uthare => &[
                "act=merch&targ=11201&greet=1",
                "act=merch&targ=11201&mact=buy&targ_item=30400&quant=10",
            ],
            Npc::Patannis => &[
                "act=merch&targ=11203&greet=1",
                "act=merch&targ=11203&mact=buy&targ_item=10017&quant=1",
                "act=merch&targ=11203&mact=buy&targ_item=20017&quant=1",
                "act=merch&targ=11203&mact=buy&targ_item=20116&quant=1",
            ],
            Npc::GuardThyet => &["act=talk&targ=11001&say=rest"],
            Npc::Talinia => &["act=talk&targ=20510", "act=talk&targ=20510&say=join"],
            Npc::Allden => &["act=talk&targ=20701&say=rest"],
            Npc::Sabaliz => &[
                "act=merch&targ=30203&greet=1",
                "act=merch&targ=30203&mact=buy&targ_item=10030&quant=1",
                "act=merch&targ=30203&mact=buy&targ_item=10230&quant=1",
                "act=merch&targ=30203&mact=buy&targ_item=20030&quant=1",
                "act=merch&targ=30203&mact=buy&targ_item=20130&quant=1",
                "act=merch&targ=30203&mact=buy&targ_item=20230&quant=1",
            ],
            Npc::Velm => &["act=talk&targ=30504&say=join"],
            Npc::Lifira => &[
                "act=talk&targ=30510",
                "act=talk&targ=30510&say=calm",
                "act=talk&targ=30510&say=home",
            ],
            Npc::LifiraPart2 => &[
                "act=talk&targ=30510",
                "act=talk&targ=30510&say=curious",
                "act=talk&targ=30510&say=purpose",
                "act=talk&targ=30510&say=find",
                "act=talk&targ=30510&say=fates",
            ],
            Npc::Bukaru => &[
                "act=talk&targ=30101",
                "act=talk&targ=30101&say=code",
                "act=talk&targ=30101&say=medallion",
            ],
            Npc::Medallion | Npc::MedallionCentrepiece | Npc::MedallionGemstone => &["continue=1"],
            Npc::Coltzan => &["act=talk&targ=30701"],
            Npc::BrainTree => &[
                "act=talk&targ=40501",
                "act=talk&targ=40501&say=adventurers",
                "act=talk&targ=40501&say=yes",
                "act=talk&targ=40501&say=how",
                "act=talk&targ=40501&say=anything",
            ],
            Npc::AugurFaunt => &[
                "act=talk&targ=40510&say=rest",
                "act=merch&targ=40510&greet=1",
                "act=merch&targ=40510&mact=buy&targ_item=30208&quant=10",
                "act=merch&targ=40510&mact=buy&targ_item=30208&quant=10",
                "act=merch&targ=40510&mact=buy&targ_item=30403&quant=5",
                "act=merch&targ=40510&mact=buy&targ_item=30308&quant=10",
                "act=merch&targ=40510&mact=buy&targ_item=30308&quant=10",
                "act=merch&targ=40510&mact=buy&targ_item=30109&quant=10",
                "act=merch&targ=40510&mact=buy&targ_item=30109&quant=10",
            ],
            Npc::Caereli => &[
                "act=merch&targ=50703&greet=1",
                "act=merch&targ=50703&mact=buy&targ_item=10053&quant=1",
                "act=merch&targ=50703&mact=buy&targ_item=10253&quant=1",
            ],
            Npc::Deleri => &["act=talk&targ=50701&say=rest"],
            Npc::Mekava => &[
                "act=merch&targ=50704&greet=1",
                "act=merch&targ=50704&mact=buy&targ_item=30111&quant=10",
                "act=merch&targ=50704&mact=buy&targ_item=30111&quant=10",
                "act=merch&targ=50704&mact=buy&targ_item=30210&quant=10",
                "act=merch&targ=50704&mact=buy&targ_item=30210&quant=10",
                "act=merch&targ=50704&mact=buy&targ_item=30310&quant=10",
                "act=merch&targ=50704&mact=buy&targ_item=30310&quant=10",
            ],
            Npc::Lusina => &[
                "act=talk&targ=50501",
                "act=talk&targ=50501&say=who",
                "act=talk&targ=50501&say=what",
                "act=talk&targ=50501&say=faerie",
            ],
            Npc::Stenvela => &[
                "act=talk&targ=50602",
                "act=talk&targ=50602&say=who",
                "act=talk&targ=50602&say=you",
            ],
            Npc::Vitrini => &[
                "act=talk&targ=50605",
                "act=talk&targ=50605&say=not",
                "act=talk&targ=50605&say=rest",
            ],
            Npc::VitriniKey => &["act=talk&targ=50605&say=devil3"],
            Npc::Lyra => &[
                "act=talk&targ=50606",
                "act=talk&targ=50606&say=who",
                "act=talk&targ=50606&say=help",
                "act=talk&targ=50606&say=rest",
            ],
        }
    }

    pub fn dialogue_urls(self) -> Vec<String> {
        self.dialogue()
            .iter()
            .map(|query| format!("{}?{query}", urls::MAIN_GAME_URL))
            .collect()
    }
}

impl fmt::Display for Npc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Npc {
    type Err = AutoplayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Npc::ALL
            .into_iter()
            .find(|npc| npc.name() == wanted)
            .ok_or_else(|| AutoplayerError::InvalidArgument(format!("Unknown NPC: {s}")))
    }
}

/// Walks through NPC conversations link by link
#[derive(Clone)]
pub struct NpcHandler {
    site: SitePage,
}

impl NpcHandler {
    pub fn new(site: SitePage) -> Self {
        Self { site }
    }

    /// Visit each dialogue link in order, then return to the map.
    #[instrument(level = "info", skip(self))]
    pub async fn talk(&self, npc: Npc) -> Result<(), AutoplayerError> {
        for link in npc.dialogue_urls() {
            info!("Visiting NPC link: {link}");
            self.site.go_to_url_and_wait_navigation(&link).await?;
        }
        info!("NPC interactions completed, returning to Overworld.");
        self.site
            .go_to_url_and_wait_navigation(urls::MAIN_GAME_URL)
            .await
    }
}
