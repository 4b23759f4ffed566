//! The unit of ownership: a named, owned cuboid with an access policy.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::capability::CapabilityFlags;
use crate::volume::Cuboid;
use crate::world::position::{BlockPos, DimensionId};

/// Stable actor identifier as reported by the host (the player name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An actor as seen by permission checks: identity plus administrative role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub admin: bool,
}

impl Actor {
    pub fn player(id: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            admin: false,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            admin: true,
        }
    }
}

/// The two corners exactly as the claimant picked them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vectors {
    pub start: BlockPos,
    pub end: BlockPos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Land {
    pub name: String,
    pub owner: ActorId,
    #[serde(default)]
    pub members: IndexSet<ActorId>,
    pub dimension: DimensionId,
    #[serde(default)]
    pub public_auth: CapabilityFlags,
    #[serde(default)]
    pub config_public_auth: CapabilityFlags,
    pub vectors: Vectors,
}

impl Land {
    /// A fresh land: no members, every capability denied.
    pub fn new(
        name: impl Into<String>,
        owner: ActorId,
        dimension: DimensionId,
        start: BlockPos,
        end: BlockPos,
    ) -> Self {
        Self {
            name: name.into(),
            owner,
            members: IndexSet::new(),
            dimension,
            public_auth: CapabilityFlags::denied(),
            config_public_auth: CapabilityFlags::denied(),
            vectors: Vectors { start, end },
        }
    }

    /// The normalized volume covered by this land.
    pub fn cuboid(&self) -> Cuboid {
        Cuboid::from_corners(self.vectors.start, self.vectors.end)
    }

    pub fn capacity(&self) -> u64 {
        self.cuboid().capacity()
    }

    pub fn is_owner(&self, actor: &ActorId) -> bool {
        self.owner == *actor
    }

    pub fn is_member(&self, actor: &ActorId) -> bool {
        self.members.contains(actor)
    }
}
