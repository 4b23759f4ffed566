//! Typed "before" signals raised by the host.
//!
//! A signal arrives before its action takes effect. The interceptor may set
//! its cancel flag; the host checks the flag once every handler has run.

use claim_engine::capability::Capability;
use claim_engine::land::Actor;
use claim_engine::world::block::BlockType;
use claim_engine::world::position::{BlockPos, DimensionId, Location};

use crate::block;

/// A signal caused by a player, checked against the land at its location.
pub trait ActorSignal {
    fn actor(&self) -> &Actor;

    fn dimension(&self) -> &DimensionId;

    fn location(&self) -> Location;

    /// The capability this action needs, or `None` if land flags do not
    /// govern it.
    fn capability(&self) -> Option<Capability>;

    fn cancel(&mut self);

    fn is_cancelled(&self) -> bool;
}

/// A player is about to break a block.
#[derive(Debug, Clone)]
pub struct BlockBreak {
    pub actor: Actor,
    pub dimension: DimensionId,
    pub pos: BlockPos,
    pub block: BlockType,
    /// Item id in the player's main hand, if any.
    pub held_item: Option<String>,
    cancelled: bool,
}

impl BlockBreak {
    pub fn new(actor: Actor, dimension: DimensionId, pos: BlockPos, block: BlockType) -> Self {
        Self {
            actor,
            dimension,
            pos,
            block,
            held_item: None,
            cancelled: false,
        }
    }

    pub fn with_held_item(mut self, item: impl Into<String>) -> Self {
        self.held_item = Some(item.into());
        self
    }
}

/// A player is about to place a block.
#[derive(Debug, Clone)]
pub struct BlockPlace {
    pub actor: Actor,
    pub dimension: DimensionId,
    pub pos: BlockPos,
    pub block: BlockType,
    cancelled: bool,
}

impl BlockPlace {
    pub fn new(actor: Actor, dimension: DimensionId, pos: BlockPos, block: BlockType) -> Self {
        Self {
            actor,
            dimension,
            pos,
            block,
            cancelled: false,
        }
    }
}

/// A player is about to interact with (right-click) a block.
#[derive(Debug, Clone)]
pub struct BlockInteract {
    pub actor: Actor,
    pub dimension: DimensionId,
    pub pos: BlockPos,
    pub block: BlockType,
    cancelled: bool,
}

impl BlockInteract {
    pub fn new(actor: Actor, dimension: DimensionId, pos: BlockPos, block: BlockType) -> Self {
        Self {
            actor,
            dimension,
            pos,
            block,
            cancelled: false,
        }
    }
}

/// A player is about to interact with an entity.
#[derive(Debug, Clone)]
pub struct EntityInteract {
    pub actor: Actor,
    pub dimension: DimensionId,
    /// Where the target entity stands.
    pub location: Location,
    pub entity: String,
    cancelled: bool,
}

impl EntityInteract {
    pub fn new(actor: Actor, dimension: DimensionId, location: Location, entity: impl Into<String>) -> Self {
        Self {
            actor,
            dimension,
            location,
            entity: entity.into(),
            cancelled: false,
        }
    }
}

/// A player is about to use the held item against a block.
#[derive(Debug, Clone)]
pub struct ItemUseOn {
    pub actor: Actor,
    pub dimension: DimensionId,
    pub pos: BlockPos,
    pub item: String,
    cancelled: bool,
}

impl ItemUseOn {
    pub fn new(actor: Actor, dimension: DimensionId, pos: BlockPos, item: impl Into<String>) -> Self {
        Self {
            actor,
            dimension,
            pos,
            item: item.into(),
            cancelled: false,
        }
    }
}

impl ActorSignal for BlockBreak {
    fn actor(&self) -> &Actor {
        &self.actor
    }
    fn dimension(&self) -> &DimensionId {
        &self.dimension
    }
    fn location(&self) -> Location {
        self.pos.to_location()
    }
    fn capability(&self) -> Option<Capability> {
        Some(Capability::Break)
    }
    fn cancel(&mut self) {
        self.cancelled = true;
    }
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl ActorSignal for BlockPlace {
    fn actor(&self) -> &Actor {
        &self.actor
    }
    fn dimension(&self) -> &DimensionId {
        &self.dimension
    }
    fn location(&self) -> Location {
        self.pos.to_location()
    }
    fn capability(&self) -> Option<Capability> {
        Some(Capability::Place)
    }
    fn cancel(&mut self) {
        self.cancelled = true;
    }
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl ActorSignal for BlockInteract {
    fn actor(&self) -> &Actor {
        &self.actor
    }
    fn dimension(&self) -> &DimensionId {
        &self.dimension
    }
    fn location(&self) -> Location {
        self.pos.to_location()
    }
    fn capability(&self) -> Option<Capability> {
        Some(block::classify(&self.block).capability())
    }
    fn cancel(&mut self) {
        self.cancelled = true;
    }
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl ActorSignal for EntityInteract {
    fn actor(&self) -> &Actor {
        &self.actor
    }
    fn dimension(&self) -> &DimensionId {
        &self.dimension
    }
    fn location(&self) -> Location {
        self.location
    }
    fn capability(&self) -> Option<Capability> {
        Some(Capability::UseEntity)
    }
    fn cancel(&mut self) {
        self.cancelled = true;
    }
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl ActorSignal for ItemUseOn {
    fn actor(&self) -> &Actor {
        &self.actor
    }
    fn dimension(&self) -> &DimensionId {
        &self.dimension
    }
    fn location(&self) -> Location {
        self.pos.to_location()
    }
    /// Fire starters and liquid buckets count as breaking the block; other
    /// items are left to the block-interact signal.
    fn capability(&self) -> Option<Capability> {
        block::is_banned_item(&self.item).then_some(Capability::Break)
    }
    fn cancel(&mut self) {
        self.cancelled = true;
    }
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// An explosion is about to destroy `impacted`. Handlers may shrink the list;
/// blocks removed from it survive.
#[derive(Debug, Clone)]
pub struct Explosion {
    pub dimension: DimensionId,
    /// Entity or block id of whatever went off.
    pub source: Option<String>,
    pub impacted: Vec<BlockPos>,
}

impl Explosion {
    pub fn new(dimension: DimensionId, source: Option<String>, impacted: Vec<BlockPos>) -> Self {
        Self {
            dimension,
            source,
            impacted,
        }
    }
}
