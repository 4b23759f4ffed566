//! Capability names and per-land flag sets.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One named permission bit governing a category of interaction.
///
/// Serialized names match the persisted record keys (`break`, `useBlock`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "break")]
    Break,
    #[serde(rename = "place")]
    Place,
    #[serde(rename = "useBlock")]
    UseBlock,
    #[serde(rename = "isChestOpen")]
    OpenChest,
    #[serde(rename = "useEntity")]
    UseEntity,
    #[serde(rename = "useButton")]
    UseButton,
    #[serde(rename = "explode")]
    Explode,
    #[serde(rename = "burn")]
    Burn,
    #[serde(rename = "useSign")]
    UseSign,
    #[serde(rename = "useSmelting")]
    UseSmelting,
    #[serde(rename = "useRedstone")]
    UseRedstone,
}

impl Capability {
    pub const ALL: [Capability; 11] = [
        Capability::Break,
        Capability::Place,
        Capability::UseBlock,
        Capability::OpenChest,
        Capability::UseEntity,
        Capability::UseButton,
        Capability::Explode,
        Capability::Burn,
        Capability::UseSign,
        Capability::UseSmelting,
        Capability::UseRedstone,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::Break => "break",
            Capability::Place => "place",
            Capability::UseBlock => "useBlock",
            Capability::OpenChest => "isChestOpen",
            Capability::UseEntity => "useEntity",
            Capability::UseButton => "useButton",
            Capability::Explode => "explode",
            Capability::Burn => "burn",
            Capability::UseSign => "useSign",
            Capability::UseSmelting => "useSmelting",
            Capability::UseRedstone => "useRedstone",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// Capability → allowed map. Anything absent is denied.
///
/// Kept in [`Capability::ALL`] order so persisted records read the same way
/// every time they are rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityFlags(IndexMap<Capability, bool>);

impl CapabilityFlags {
    /// Every capability explicitly denied.
    pub fn denied() -> Self {
        Self(Capability::ALL.into_iter().map(|cap| (cap, false)).collect())
    }

    pub fn get(&self, capability: Capability) -> bool {
        self.0.get(&capability).copied().unwrap_or(false)
    }

    pub fn set(&mut self, capability: Capability, allowed: bool) {
        self.0.insert(capability, allowed);
        self.0.sort_unstable_keys();
    }

    pub fn with(mut self, capability: Capability, allowed: bool) -> Self {
        self.set(capability, allowed);
        self
    }

    /// Capabilities currently allowed.
    pub fn allowed(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().filter(|(_, on)| **on).map(|(cap, _)| *cap)
    }
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        Self::denied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flags_deny_everything() {
        let flags = CapabilityFlags::default();
        for cap in Capability::ALL {
            assert!(!flags.get(cap), "{cap} should start denied");
        }
        assert_eq!(flags.allowed().count(), 0);
    }

    #[test]
    fn serializes_with_record_key_names() {
        let flags = CapabilityFlags::denied().with(Capability::OpenChest, true);
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json["isChestOpen"], true);
        assert_eq!(json["break"], false);
        assert_eq!(json.as_object().unwrap().len(), 11);
    }

    #[test]
    fn missing_keys_read_as_denied() {
        let flags: CapabilityFlags = serde_json::from_str(r#"{"place": true}"#).unwrap();
        assert!(flags.get(Capability::Place));
        assert!(!flags.get(Capability::Break));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("useRedstone".parse::<Capability>(), Ok(Capability::UseRedstone));
        assert_eq!("ISCHESTOPEN".parse::<Capability>(), Ok(Capability::OpenChest));
        assert!("fly".parse::<Capability>().is_err());
    }
}
