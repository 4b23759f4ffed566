use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespaced block type identifier as reported by the host (`minecraft:chest`).
///
/// The engine does not interpret these beyond one rule: `minecraft:air` is the
/// "empty" block, and writing air to a position removes it from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockType(String);

impl BlockType {
    pub const AIR_ID: &'static str = "minecraft:air";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The universal "empty" block.
    pub fn air() -> Self {
        Self::new(Self::AIR_ID)
    }

    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier without its namespace: `minecraft:oak_sign` -> `oak_sign`.
    pub fn path(&self) -> &str {
        self.0.rsplit_once(':').map_or(self.0.as_str(), |(_, path)| path)
    }
}

impl From<&str> for BlockType {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
