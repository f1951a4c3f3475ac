use tracing::info;

use crate::errors::AutoplayerError;
use crate::pages::SitePage;
use crate::party::Ally;
use crate::urls;

pub const IRON_SHORTSWORD_ID: u32 = 10011;
pub const RUSTY_CHAIN_TUNIC_ID: u32 = 20010;

/// Equipment with a known item id
pub const KNOWN_EQUIPMENT: &[(&str, u32)] = &[
    ("iron-shortsword", IRON_SHORTSWORD_ID),
    ("rusty-chain-tunic", RUSTY_CHAIN_TUNIC_ID),
];

/// Resolve an item given by known name or numeric id.
pub fn equipment_id(item: &str) -> Result<u32, AutoplayerError> {
    let wanted = item.trim().to_ascii_lowercase().replace(['_', ' '], "-");
    KNOWN_EQUIPMENT
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, id)| *id)
        .or_else(|| wanted.parse().ok())
        .ok_or_else(|| AutoplayerError::InvalidArgument(format!("Unknown equipment: {item}")))
}

/// Equips items through the inventory URL; the inventory page itself is
/// never modelled.
#[derive(Clone)]
pub struct InventoryHandler {
    site: SitePage,
}

impl InventoryHandler {
    pub fn new(site: SitePage) -> Self {
        Self { site }
    }

    pub async fn equip(&self, item_id: u32, ally: Ally) -> Result<(), AutoplayerError> {
        info!("Equipping item with id {item_id} on {ally}");
        self.site
            .go_to_url_and_wait_navigation(&urls::equip_url(item_id, ally))
            .await?;
        info!("Navigating back to the overworld page...");
        self.site
            .go_to_url_and_wait_navigation(urls::MAIN_GAME_URL)
            .await
    }
}
