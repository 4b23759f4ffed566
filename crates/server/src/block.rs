//! Block and item classification for permission checks.
//!
//! Matching is done on the namespace-less id path (`chest`, `oak_button`), so
//! modded namespaces classify the same way as vanilla ones. Both Bedrock ids
//! (`bed`, `lit_furnace`) and Java ids (`red_bed`, `furnace`) are listed.

use claim_engine::capability::Capability;
use claim_engine::world::block::BlockType;

/// Which interaction family a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCategory {
    Container,
    Button,
    Sign,
    Workstation,
    Redstone,
    Other,
}

impl BlockCategory {
    /// The capability an interaction with this kind of block requires.
    pub fn capability(self) -> Capability {
        match self {
            BlockCategory::Container => Capability::OpenChest,
            BlockCategory::Button => Capability::UseButton,
            BlockCategory::Sign => Capability::UseSign,
            BlockCategory::Workstation => Capability::UseSmelting,
            BlockCategory::Redstone => Capability::UseRedstone,
            BlockCategory::Other => Capability::UseBlock,
        }
    }
}

const CONTAINERS: &[&str] = &["chest", "trapped_chest", "ender_chest", "barrel"];

const WORKSTATIONS: &[&str] = &[
    "furnace",
    "lit_furnace",
    "blast_furnace",
    "lit_blast_furnace",
    "smoker",
    "lit_smoker",
    "bed",
    "crafting_table",
    "anvil",
    "chipped_anvil",
    "damaged_anvil",
    "enchanting_table",
    "brewing_stand",
    "smithing_table",
    "cartography_table",
    "fletching_table",
    "loom",
    "stonecutter",
    "grindstone",
];

const REDSTONE: &[&str] = &[
    "observer",
    "dispenser",
    "dropper",
    "hopper",
    "daylight_detector",
    "crafter",
];

/// First match wins: containers, buttons, signs, workstations, redstone.
pub fn classify(block: &BlockType) -> BlockCategory {
    let path = block.path();
    if CONTAINERS.contains(&path) || path.ends_with("shulker_box") {
        BlockCategory::Container
    } else if path.ends_with("_button") || path == "lever" {
        BlockCategory::Button
    } else if path.ends_with("_sign") {
        BlockCategory::Sign
    } else if WORKSTATIONS.contains(&path) || path.ends_with("_bed") {
        BlockCategory::Workstation
    } else if REDSTONE.contains(&path) || path.contains("repeater") || path.contains("comparator") {
        BlockCategory::Redstone
    } else {
        BlockCategory::Other
    }
}

/// Blocks the burn sweep clears out of lands that forbid burning.
pub fn is_burning(block: &BlockType) -> bool {
    matches!(block.path(), "fire" | "soul_fire" | "lava" | "flowing_lava")
}

/// Items whose use against a block is treated as breaking it.
pub fn is_banned_item(item: &str) -> bool {
    let path = item.rsplit_once(':').map_or(item, |(_, path)| path);
    matches!(path, "flint_and_steel" | "fire_charge" | "lava_bucket" | "water_bucket")
}
