//! Wiring: builds every component from the config and the host's
//! collaborators, and exposes the entry points a host adapter calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use claim_engine::error::RepositoryError;
use claim_engine::guard::Verdict;
use claim_engine::land::{Actor, ActorId};
use claim_engine::permission::PermissionEngine;
use claim_engine::repository::LandRepository;
use claim_engine::store::KvStore;
use claim_engine::world::position::{BlockPos, DimensionId};

use crate::ambient::{self, AmbientLayer, BurnSweepLayer, MarkSweepLayer, PresenceLayer};
use crate::config::ClaimConfig;
use crate::dashboard::{DashboardState, Metrics};
use crate::event_bus::BusNotifier;
use crate::host::{Dialog, Economy, Notifier, WorldAccess};
use crate::interceptor::Interceptor;
use crate::manage::LandManager;
use crate::marking::{MarkBook, MarkOutcome};
use crate::player_registry::{PlayerInfo, PlayerRegistry};
use crate::signals::BlockBreak;
use crate::workflow::ClaimWorkflow;

/// Everything the add-on needs from its host.
pub struct Collaborators {
    pub store: Arc<dyn KvStore>,
    pub economy: Arc<dyn Economy>,
    pub dialog: Arc<dyn Dialog>,
    pub world: Arc<dyn WorldAccess>,
    pub bus: BusNotifier,
}

pub struct LandClaims {
    pub config: ClaimConfig,
    pub lands: Arc<LandRepository>,
    pub engine: PermissionEngine,
    pub interceptor: Interceptor,
    pub workflow: ClaimWorkflow,
    pub manager: LandManager,
    pub marks: Arc<MarkBook>,
    pub players: Arc<PlayerRegistry>,
    pub metrics: Arc<Metrics>,
    pub bus: BusNotifier,
    notifier: Arc<dyn Notifier>,
    world: Arc<dyn WorldAccess>,
}

impl LandClaims {
    pub fn new(config: ClaimConfig, host: Collaborators) -> Result<Self, RepositoryError> {
        let lands = Arc::new(LandRepository::open(host.store)?);
        let engine = PermissionEngine::new(lands.clone());
        let metrics = Arc::new(Metrics::new());
        let notifier: Arc<dyn Notifier> = Arc::new(host.bus.clone());
        let marks = Arc::new(MarkBook::new(&config.marking));

        let mut interceptor = Interceptor::new(engine.clone(), &config.messages, notifier.clone(), metrics.clone());
        // Swinging the marking tool selects a corner; it never breaks the block.
        let tool_marks = marks.clone();
        interceptor.break_guards().add(move |signal: &BlockBreak| {
            match signal.held_item.as_deref() {
                Some(item) if tool_marks.is_tool(item) => Verdict::silent_deny(),
                _ => Verdict::Allow,
            }
        });

        let economy = config.economy.enabled.then_some(host.economy);
        let workflow = ClaimWorkflow::new(
            lands.clone(),
            economy,
            host.dialog,
            notifier.clone(),
            marks.clone(),
            metrics.clone(),
            config.limits.clone(),
            config.messages.clone(),
        );
        let manager = LandManager::new(lands.clone(), metrics.clone());

        tracing::info!(
            "Land claims ready: {} lands, economy {}",
            lands.len(),
            if config.economy.enabled { "on" } else { "off" }
        );

        Ok(Self {
            config,
            lands,
            engine,
            interceptor,
            workflow,
            manager,
            marks,
            players: Arc::new(PlayerRegistry::new()),
            metrics,
            bus: host.bus,
            notifier,
            world: host.world,
        })
    }

    /// Resolve an actor id, applying the configured admin list.
    pub fn actor(&self, id: &str) -> Actor {
        let id = ActorId::new(id);
        Actor {
            admin: self.config.is_admin(&id),
            id,
        }
    }

    // ── Players ─────────────────────────────────────────────────────────

    pub fn player_joined(&self, info: PlayerInfo) {
        tracing::info!("{} joined in {}", info.actor.id, info.dimension);
        self.players.register(info);
        self.metrics.player_joined();
    }

    pub fn player_left(&self, actor: &ActorId) {
        if self.players.is_online(actor) {
            self.players.deregister(actor);
            self.metrics.player_left();
        }
        self.marks.clear(actor);
    }

    /// A player struck a block. Drives the marking tool; the stance last
    /// reported to the player registry picks the corner.
    pub fn on_hit_block(
        &self,
        actor: &ActorId,
        dimension: &DimensionId,
        item: Option<&str>,
        pos: BlockPos,
    ) -> MarkOutcome {
        let crouching = self.players.get(actor).is_some_and(|player| player.crouching);
        let outcome = self
            .marks
            .on_hit_block(actor, dimension, item, pos, crouching, Instant::now());
        let messages = &self.config.messages;
        match outcome {
            MarkOutcome::StartSet(corner) => {
                self.notifier.action_bar(actor, &messages.mark_start);
                self.notifier.marker(actor, dimension, corner);
            }
            MarkOutcome::EndSet(corner) => {
                self.notifier.action_bar(actor, &messages.mark_end);
                self.notifier.marker(actor, dimension, corner);
            }
            MarkOutcome::Ignored | MarkOutcome::Debounced => {}
        }
        outcome
    }

    // ── Monitors ────────────────────────────────────────────────────────

    pub fn layers(&self) -> Vec<Box<dyn AmbientLayer>> {
        let monitor = &self.config.monitor;
        let mut layers: Vec<Box<dyn AmbientLayer>> = Vec::with_capacity(3);
        layers.push(Box::new(PresenceLayer::new(
            self.lands.clone(),
            self.players.clone(),
            self.notifier.clone(),
            self.metrics.clone(),
            self.config.messages.clone(),
            Duration::from_millis(monitor.presence_interval_ms),
            monitor.highlight_ticks,
        )));
        layers.push(Box::new(BurnSweepLayer::new(
            self.lands.clone(),
            self.world.clone(),
            self.metrics.clone(),
            Duration::from_millis(monitor.burn_sweep_interval_ms),
        )));
        layers.push(Box::new(MarkSweepLayer::new(
            self.marks.clone(),
            self.notifier.clone(),
            self.metrics.clone(),
            self.config.messages.clone(),
            Duration::from_millis(monitor.mark_sweep_interval_ms),
            monitor.highlight_ticks,
        )));
        layers
    }

    /// Spawn the ambient layers. Must be called inside a tokio runtime.
    pub fn start_monitors(&self) {
        ambient::start(self.layers());
    }

    pub fn dashboard_state(&self) -> Arc<DashboardState> {
        Arc::new(DashboardState::new(
            self.metrics.clone(),
            self.lands.clone(),
            self.bus.clone(),
        ))
    }
}
