//! Ambient monitor framework.
//!
//! Each [`AmbientLayer`] runs on its own tokio task and ticks on a fixed
//! interval for the lifetime of the process. Three layers ship with the
//! add-on:
//!
//! - [`PresenceLayer`]: enter/leave notifications for moving players.
//! - [`BurnSweepLayer`]: clears fire and lava from lands that forbid burning.
//! - [`MarkSweepLayer`]: expires stale selections and renders live ones.
//!
//! # Adding a new layer
//!
//! 1. Implement [`AmbientLayer`] for your struct.
//! 2. Push a `Box::new(YourLayer)` into the layer list passed to [`start`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use claim_engine::capability::Capability;
use claim_engine::land::ActorId;
use claim_engine::repository::LandRepository;
use claim_engine::world::block::BlockType;
use dashmap::DashMap;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;

use crate::block;
use crate::config::{Messages, render};
use crate::dashboard::Metrics;
use crate::host::{Notifier, WorldAccess};
use crate::marking::MarkBook;
use crate::player_registry::{PlayerEvent, PlayerRegistry};

/// A pluggable monitor that does a bounded amount of work on a timer.
pub trait AmbientLayer: Send + Sync + 'static {
    /// Human-readable name (used for logging).
    fn name(&self) -> &'static str;

    /// How often this layer ticks.
    fn interval(&self) -> Duration;

    fn tick(&self, now: Instant);
}

/// Spawn one tokio task per layer.
pub fn start(layers: Vec<Box<dyn AmbientLayer>>) {
    for layer in layers {
        tokio::spawn(async move {
            let name = layer.name();
            let mut interval = tokio::time::interval(layer.interval());
            // The first tick fires immediately; skip it so startup settles first.
            interval.tick().await;

            tracing::info!("Ambient layer '{}' started (interval {:?})", name, layer.interval());

            loop {
                interval.tick().await;
                layer.tick(Instant::now());
            }
        });
    }
}

// ── Presence ────────────────────────────────────────────────────────────

pub struct PresenceLayer {
    lands: Arc<LandRepository>,
    players: Arc<PlayerRegistry>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<Metrics>,
    messages: Messages,
    interval: Duration,
    highlight_ticks: u32,
    /// The land each player was last seen inside.
    inside: DashMap<ActorId, String>,
    /// Registry events; a `Left` drops that player's presence state.
    events: Mutex<Receiver<PlayerEvent>>,
}

impl PresenceLayer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lands: Arc<LandRepository>,
        players: Arc<PlayerRegistry>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<Metrics>,
        messages: Messages,
        interval: Duration,
        highlight_ticks: u32,
    ) -> Self {
        let events = Mutex::new(players.subscribe());
        Self {
            lands,
            players,
            notifier,
            metrics,
            messages,
            interval,
            highlight_ticks,
            inside: DashMap::new(),
            events,
        }
    }

    /// The land a player is currently recorded inside, if any.
    pub fn current_land(&self, actor: &ActorId) -> Option<String> {
        self.inside.get(actor).map(|name| name.clone())
    }

    /// Forget everyone who left since the last tick. A player who leaves and
    /// rejoins in between is announced afresh. If the receiver lagged, fall
    /// back to keeping only players that are online now.
    fn forget_departed(&self, online: &HashSet<&ActorId>) {
        let mut events = self.events.lock().expect("presence events poisoned");
        loop {
            match events.try_recv() {
                Ok(PlayerEvent::Left { actor }) => {
                    self.inside.remove(&actor);
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("Presence missed {} player events, reconciling", skipped);
                    self.inside.retain(|actor, _| online.contains(actor));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

impl AmbientLayer for PresenceLayer {
    fn name(&self) -> &'static str {
        "presence"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&self, _now: Instant) {
        let players = self.players.snapshot();
        let online: HashSet<&ActorId> = players.iter().map(|p| &p.actor.id).collect();
        self.forget_departed(&online);

        for player in players.iter().filter(|p| p.is_moving()) {
            let actor = &player.actor.id;
            let here = self
                .lands
                .with_land_at(&player.dimension, player.location, |land| (land.name.clone(), land.cuboid()));
            let before = self.current_land(actor);
            if before.as_deref() == here.as_ref().map(|(name, _)| name.as_str()) {
                continue;
            }

            if let Some(left) = before {
                self.inside.remove(actor);
                self.notifier
                    .action_bar(actor, &render(&self.messages.left, &[("name", left.as_str())]));
                self.metrics.land_left();
                tracing::debug!("{} left '{}'", actor, left);
            }
            if let Some((entered, cuboid)) = here {
                self.notifier
                    .action_bar(actor, &render(&self.messages.entered, &[("name", entered.as_str())]));
                self.notifier
                    .outline(actor, &player.dimension, &cuboid, self.highlight_ticks);
                self.metrics.land_entered();
                tracing::debug!("{} entered '{}'", actor, entered);
                self.inside.insert(actor.clone(), entered);
            }
        }
    }
}

// ── Burn sweep ──────────────────────────────────────────────────────────

pub struct BurnSweepLayer {
    lands: Arc<LandRepository>,
    world: Arc<dyn WorldAccess>,
    metrics: Arc<Metrics>,
    interval: Duration,
}

impl BurnSweepLayer {
    pub fn new(
        lands: Arc<LandRepository>,
        world: Arc<dyn WorldAccess>,
        metrics: Arc<Metrics>,
        interval: Duration,
    ) -> Self {
        Self {
            lands,
            world,
            metrics,
            interval,
        }
    }

    /// Clear burning blocks from every land with `burn` off. Returns the
    /// number of blocks cleared.
    pub fn sweep(&self) -> usize {
        let air = BlockType::air();
        let mut cleared = 0;
        for land in self.lands.list_all() {
            if land.public_auth.get(Capability::Burn) {
                continue;
            }
            let n = self
                .world
                .replace_in_volume(&land.dimension, &land.cuboid(), &block::is_burning, &air);
            if n > 0 {
                tracing::debug!("Cleared {} burning blocks in '{}'", n, land.name);
            }
            cleared += n;
        }
        self.metrics.burn_cleared(cleared as u64);
        cleared
    }
}

impl AmbientLayer for BurnSweepLayer {
    fn name(&self) -> &'static str {
        "burn-sweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&self, _now: Instant) {
        self.sweep();
    }
}

// ── Mark sweep ──────────────────────────────────────────────────────────

pub struct MarkSweepLayer {
    marks: Arc<MarkBook>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<Metrics>,
    messages: Messages,
    interval: Duration,
    highlight_ticks: u32,
}

impl MarkSweepLayer {
    pub fn new(
        marks: Arc<MarkBook>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<Metrics>,
        messages: Messages,
        interval: Duration,
        highlight_ticks: u32,
    ) -> Self {
        Self {
            marks,
            notifier,
            metrics,
            messages,
            interval,
            highlight_ticks,
        }
    }
}

impl AmbientLayer for MarkSweepLayer {
    fn name(&self) -> &'static str {
        "mark-sweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&self, now: Instant) {
        for actor in self.marks.sweep(now) {
            self.notifier.message(&actor, &self.messages.mark_expired);
            self.metrics.mark_expired();
        }

        for (actor, mark) in self.marks.snapshot() {
            for corner in [mark.start, mark.end].into_iter().flatten() {
                self.notifier.marker(&actor, &mark.dimension, corner);
            }
            if let Some(cuboid) = mark.cuboid() {
                self.notifier
                    .outline(&actor, &mark.dimension, &cuboid, self.highlight_ticks);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim_engine::land::{Actor, Land};
    use claim_engine::store::MemoryStore;
    use claim_engine::world::World;
    use claim_engine::world::position::{BlockPos, DimensionId, Location};

    use crate::config::MarkingConfig;
    use crate::event_bus::{BusNotifier, Notification};
    use crate::player_registry::PlayerInfo;

    fn lands_with_home() -> Arc<LandRepository> {
        let lands = Arc::new(LandRepository::open(Arc::new(MemoryStore::new())).unwrap());
        lands
            .create(Land::new(
                "Home",
                ActorId::new("Alice"),
                DimensionId::new("main"),
                BlockPos::new(0, 64, 0),
                BlockPos::new(10, 70, 10),
            ))
            .unwrap();
        lands
    }

    fn texts(rx: &mut tokio::sync::broadcast::Receiver<Notification>) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(note) => {
                    if let Some(text) = note.text() {
                        out.push(text.to_string());
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        out
    }

    #[test]
    fn presence_reports_enter_and_leave_once() {
        let lands = lands_with_home();
        let players = Arc::new(PlayerRegistry::new());
        let bus = BusNotifier::new();
        let mut rx = bus.subscribe();
        let layer = PresenceLayer::new(
            lands,
            players.clone(),
            Arc::new(bus.clone()),
            Arc::new(Metrics::new()),
            Messages::default(),
            Duration::from_millis(250),
            60,
        );
        let bob = Actor::player("Bob");
        let main = DimensionId::new("main");
        players.register(PlayerInfo::new(bob.clone(), main.clone(), Location::new(-5.0, 65.0, 5.0)));

        let step = |x: f64| {
            players.update_motion(&bob.id, main.clone(), Location::new(x, 65.0, 5.0), [0.3, 0.0, 0.0], false);
            layer.tick(Instant::now());
        };
        step(-2.0);
        step(1.0);
        step(2.0);
        step(12.0);
        assert_eq!(texts(&mut rx), vec!["Entered Home", "Left Home"]);

        // Standing still inside the land does not re-announce it.
        step(5.0);
        players.update_motion(&bob.id, main, Location::new(5.0, 65.0, 5.0), [0.0; 3], false);
        layer.tick(Instant::now());
        assert_eq!(texts(&mut rx), vec!["Entered Home"]);
        assert_eq!(layer.current_land(&bob.id).as_deref(), Some("Home"));

        players.deregister(&bob.id);
        layer.tick(Instant::now());
        assert_eq!(layer.current_land(&bob.id), None);
    }

    #[test]
    fn rejoining_player_is_announced_again() {
        let lands = lands_with_home();
        let players = Arc::new(PlayerRegistry::new());
        let bus = BusNotifier::new();
        let mut rx = bus.subscribe();
        let layer = PresenceLayer::new(
            lands,
            players.clone(),
            Arc::new(bus.clone()),
            Arc::new(Metrics::new()),
            Messages::default(),
            Duration::from_millis(250),
            60,
        );
        let bob = Actor::player("Bob");
        let main = DimensionId::new("main");
        let inside = Location::new(5.0, 65.0, 5.0);

        players.register(PlayerInfo::new(bob.clone(), main.clone(), inside));
        players.update_motion(&bob.id, main.clone(), inside, [0.1, 0.0, 0.0], false);
        layer.tick(Instant::now());
        assert_eq!(texts(&mut rx), vec!["Entered Home"]);

        // Leaves and comes back between two ticks.
        players.deregister(&bob.id);
        players.register(PlayerInfo::new(bob.clone(), main.clone(), inside));
        players.update_motion(&bob.id, main, inside, [0.1, 0.0, 0.0], false);
        layer.tick(Instant::now());
        assert_eq!(texts(&mut rx), vec!["Entered Home"]);
    }

    #[test]
    fn burn_sweep_respects_flag() {
        let lands = lands_with_home();
        let world = Arc::new(World::new());
        let main = DimensionId::new("main");
        world.set_block(&main, BlockPos::new(3, 65, 3), BlockType::new("minecraft:fire"));
        world.set_block(&main, BlockPos::new(4, 65, 3), BlockType::new("minecraft:lava"));
        world.set_block(&main, BlockPos::new(20, 65, 3), BlockType::new("minecraft:fire"));
        let layer = BurnSweepLayer::new(lands.clone(), world.clone(), Arc::new(Metrics::new()), Duration::from_secs(1));

        assert_eq!(layer.sweep(), 2);
        assert!(world.get_block(&main, BlockPos::new(3, 65, 3)).is_air());
        assert_eq!(world.get_block(&main, BlockPos::new(20, 65, 3)).path(), "fire");

        let mut flags = lands.get("Home").unwrap().public_auth;
        flags.set(Capability::Burn, true);
        lands.set_public_auth("Home", flags).unwrap();
        world.set_block(&main, BlockPos::new(3, 65, 3), BlockType::new("minecraft:fire"));
        assert_eq!(layer.sweep(), 0);
    }

    #[test]
    fn mark_sweep_expires_and_renders() {
        let marks = Arc::new(MarkBook::new(&MarkingConfig::default()));
        let bus = BusNotifier::new();
        let mut rx = bus.subscribe();
        let layer = MarkSweepLayer::new(
            marks.clone(),
            Arc::new(bus.clone()),
            Arc::new(Metrics::new()),
            Messages::default(),
            Duration::from_secs(1),
            20,
        );
        let alice = ActorId::new("Alice");
        let main = DimensionId::new("main");
        let t0 = Instant::now();
        marks.on_hit_block(&alice, &main, Some("minecraft:stick"), BlockPos::new(0, 63, 0), false, t0);
        marks.on_hit_block(&alice, &main, Some("minecraft:stick"), BlockPos::new(4, 66, 4), true, t0 + Duration::from_secs(1));

        layer.tick(t0 + Duration::from_secs(2));
        let kinds: Vec<&'static str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|note| match note {
                Notification::Marker { .. } => "marker",
                Notification::Outline { .. } => "outline",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["marker", "marker", "outline"]);

        layer.tick(t0 + Duration::from_secs(700));
        assert_eq!(texts(&mut rx), vec!["Your land selection expired"]);
        assert!(marks.is_empty());
    }
}
