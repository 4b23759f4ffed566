//! Add-on configuration, loaded from a JSON file.
//!
//! Every section carries `#[serde(default)]`, so a partial file (or no file at
//! all) falls back to the built-in values field by field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use claim_engine::land::ActorId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    pub economy: EconomyConfig,
    pub limits: LimitsConfig,
    pub admins: Vec<ActorId>,
    pub marking: MarkingConfig,
    pub monitor: MonitorConfig,
    pub messages: Messages,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
    pub log_level: LogLevel,
}

impl ClaimConfig {
    /// Read the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn is_admin(&self, actor: &ActorId) -> bool {
        self.admins.contains(actor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub enabled: bool,
    pub price_per_block: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            price_per_block: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_claims_per_player: usize,
    pub max_claim_volume: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_claims_per_player: 3,
            max_claim_volume: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkingConfig {
    /// Item id of the marking tool.
    pub tool: String,
    pub debounce_ms: u64,
    pub timeout_secs: u64,
}

impl MarkingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MarkingConfig {
    fn default() -> Self {
        Self {
            tool: "minecraft:stick".into(),
            debounce_ms: 250,
            timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub presence_interval_ms: u64,
    pub burn_sweep_interval_ms: u64,
    pub mark_sweep_interval_ms: u64,
    /// How long an entered land's outline stays visible, in game ticks.
    pub highlight_ticks: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            presence_interval_ms: 250,
            burn_sweep_interval_ms: 1000,
            mark_sweep_interval_ms: 1000,
            highlight_ticks: 60,
        }
    }
}

/// Player-facing templates. `{owner}`, `{name}` and `{price}` are substituted
/// by [`render`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub land_denied: String,
    pub entered: String,
    pub left: String,
    pub mark_start: String,
    pub mark_end: String,
    pub mark_expired: String,
    pub claim_prompt: String,
    pub claim_created: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            land_denied: "This is {owner}'s land".into(),
            entered: "Entered {name}".into(),
            left: "Left {name}".into(),
            mark_start: "First corner set".into(),
            mark_end: "Second corner set".into(),
            mark_expired: "Your land selection expired".into(),
            claim_prompt: "Claim {name} for {price}?".into(),
            claim_created: "Land {name} claimed".into(),
        }
    }
}

/// Substitute `{key}` placeholders in `template`.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ClaimConfig = serde_json::from_str(
            r#"{ "economy": { "price_per_block": 5 }, "admins": ["Root"] }"#,
        )
        .unwrap();
        assert!(config.economy.enabled);
        assert_eq!(config.economy.price_per_block, 5);
        assert_eq!(config.marking.timeout_secs, 600);
        assert_eq!(config.monitor.presence_interval_ms, 250);
        assert!(config.is_admin(&ActorId::new("Root")));
        assert!(!config.is_admin(&ActorId::new("Alice")));
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("claim_config_does_not_exist.json");
        let _ = std::fs::remove_file(&path);
        let config = ClaimConfig::load(&path).unwrap();
        assert_eq!(config.dashboard.port, 8000);
        assert_eq!(config.log_level.0, "info");
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let text = render("Claim {name} from {owner} for {price}?", &[
            ("name", "Home"),
            ("owner", "Alice"),
            ("price", "847"),
        ]);
        assert_eq!(text, "Claim Home from Alice for 847?");
        assert_eq!(render("This is {owner}'s land", &[]), "This is {owner}'s land");
    }
}
