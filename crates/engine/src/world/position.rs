use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a world partition (`minecraft:overworld`, `minecraft:nether`, ...).
///
/// Coordinates in different dimensions never interact: containment and overlap
/// are only ever evaluated between things that share a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionId(pub String);

impl DimensionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DimensionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute block position in a dimension.
///
/// Serializes as `{ "x": .., "y": .., "z": .. }`, which is also the layout of
/// the corner vectors in persisted land records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The chunk column this block belongs to.
    pub const fn chunk(&self) -> ChunkPos {
        ChunkPos {
            x: (self.x >> 4) as i32,
            z: (self.z >> 4) as i32,
        }
    }

    /// Position within the chunk column (x, z in 0..16; y unchanged).
    pub const fn local(&self) -> LocalBlockPos {
        LocalBlockPos {
            x: (self.x & 0xF) as u8,
            y: self.y,
            z: (self.z & 0xF) as u8,
        }
    }

    /// The block directly above.
    pub const fn up(&self) -> BlockPos {
        Self::new(self.x, self.y + 1, self.z)
    }

    /// Component-wise minimum.
    pub fn min(self, other: BlockPos) -> BlockPos {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn max(self, other: BlockPos) -> BlockPos {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn to_location(self) -> Location {
        Location::new(self.x as f64, self.y as f64, self.z as f64)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Continuous world position (entities, players, explosion centres).
///
/// Also used as a plain 3-vector for velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub const ZERO: Location = Location::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Snap to block granularity by rounding each axis to the nearest integer.
    /// Halves round towards positive infinity, as the host's scripting
    /// runtime does.
    pub fn block(&self) -> BlockPos {
        BlockPos::new(round_half_up(self.x), round_half_up(self.y), round_half_up(self.z))
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

impl From<BlockPos> for Location {
    fn from(pos: BlockPos) -> Self {
        pos.to_location()
    }
}

/// Chunk column position (each chunk is 16x16 blocks horizontally).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Absolute position of a chunk-local coordinate.
    pub const fn block(&self, local: LocalBlockPos) -> BlockPos {
        BlockPos::new(
            ((self.x as i64) << 4) + local.x as i64,
            local.y,
            ((self.z as i64) << 4) + local.z as i64,
        )
    }
}

/// Block position local to a chunk column (x, z in 0..16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalBlockPos {
    pub x: u8,
    pub y: i64,
    pub z: u8,
}
