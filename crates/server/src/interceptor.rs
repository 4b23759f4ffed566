//! Event interceptor: one guard set per signal category.
//!
//! Every set starts with the land guard, which asks the permission engine
//! about the capability the signal needs. Further guards (the marking tool,
//! host-specific rules) can be appended; the first denial wins and cancels
//! the signal.

use std::sync::Arc;

use claim_engine::guard::{GuardSet, Verdict};
use claim_engine::permission::{Decision, PermissionEngine};

use crate::config::{Messages, render};
use crate::dashboard::Metrics;
use crate::host::Notifier;
use crate::signals::{ActorSignal, BlockBreak, BlockInteract, BlockPlace, EntityInteract, Explosion, ItemUseOn};

/// Guard that consults the land at the signal's location.
pub fn land_guard<S>(engine: PermissionEngine, template: String) -> impl Fn(&S) -> Verdict + Send + Sync + 'static
where
    S: ActorSignal + 'static,
{
    move |signal: &S| {
        let Some(capability) = signal.capability() else {
            return Verdict::Allow;
        };
        match engine.decide(signal.actor(), signal.location(), signal.dimension(), capability) {
            Decision::Allow => Verdict::Allow,
            Decision::Deny { land, owner } => {
                tracing::debug!(
                    "Denied {} to {} in land '{}' at {:?}",
                    capability,
                    signal.actor().id,
                    land,
                    signal.location()
                );
                Verdict::deny(render(&template, &[("owner", owner.as_str()), ("name", land.as_str())]))
            }
        }
    }
}

pub struct Interceptor {
    engine: PermissionEngine,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<Metrics>,
    breaks: GuardSet<BlockBreak>,
    places: GuardSet<BlockPlace>,
    interacts: GuardSet<BlockInteract>,
    entities: GuardSet<EntityInteract>,
    item_uses: GuardSet<ItemUseOn>,
}

impl Interceptor {
    pub fn new(
        engine: PermissionEngine,
        messages: &Messages,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let denied = &messages.land_denied;
        let mut breaks = GuardSet::new();
        breaks.add(land_guard(engine.clone(), denied.clone()));
        let mut places = GuardSet::new();
        places.add(land_guard(engine.clone(), denied.clone()));
        let mut interacts = GuardSet::new();
        interacts.add(land_guard(engine.clone(), denied.clone()));
        let mut entities = GuardSet::new();
        entities.add(land_guard(engine.clone(), denied.clone()));
        let mut item_uses = GuardSet::new();
        item_uses.add(land_guard(engine.clone(), denied.clone()));

        Self {
            engine,
            notifier,
            metrics,
            breaks,
            places,
            interacts,
            entities,
            item_uses,
        }
    }

    pub fn break_guards(&mut self) -> &mut GuardSet<BlockBreak> {
        &mut self.breaks
    }

    pub fn place_guards(&mut self) -> &mut GuardSet<BlockPlace> {
        &mut self.places
    }

    pub fn interact_guards(&mut self) -> &mut GuardSet<BlockInteract> {
        &mut self.interacts
    }

    // ── Signal entry points ─────────────────────────────────────────────
    //
    // All of these run to completion synchronously: the host needs the
    // cancel flag set before it applies the action.

    pub fn on_block_break(&self, signal: &mut BlockBreak) -> Verdict {
        self.intercept(&self.breaks, signal)
    }

    pub fn on_block_place(&self, signal: &mut BlockPlace) -> Verdict {
        self.intercept(&self.places, signal)
    }

    pub fn on_block_interact(&self, signal: &mut BlockInteract) -> Verdict {
        self.intercept(&self.interacts, signal)
    }

    pub fn on_entity_interact(&self, signal: &mut EntityInteract) -> Verdict {
        self.intercept(&self.entities, signal)
    }

    pub fn on_item_use_on(&self, signal: &mut ItemUseOn) -> Verdict {
        self.intercept(&self.item_uses, signal)
    }

    /// Drop every impacted block that sits in a land forbidding explosions.
    /// Returns how many blocks were spared.
    pub fn on_explosion(&self, signal: &mut Explosion) -> usize {
        let before = signal.impacted.len();
        signal
            .impacted
            .retain(|pos| self.engine.explosion_may_affect(&signal.dimension, *pos));
        let spared = before - signal.impacted.len();
        if spared > 0 {
            tracing::debug!(
                "Explosion from {} spared {} claimed blocks",
                signal.source.as_deref().unwrap_or("unknown"),
                spared
            );
            self.metrics.explosion_filtered(spared as u64);
        }
        spared
    }

    fn intercept<S: ActorSignal>(&self, guards: &GuardSet<S>, signal: &mut S) -> Verdict {
        let verdict = guards.evaluate(signal);
        self.metrics.record_verdict(!verdict.is_denied());
        if let Verdict::Deny(reason) = &verdict {
            signal.cancel();
            if let Some(reason) = reason {
                self.notifier.message(&signal.actor().id, reason);
            }
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim_engine::capability::Capability;
    use claim_engine::land::{Actor, ActorId, Land};
    use claim_engine::repository::LandRepository;
    use claim_engine::store::MemoryStore;
    use claim_engine::world::block::BlockType;
    use claim_engine::world::position::{BlockPos, DimensionId, Location};

    use crate::event_bus::BusNotifier;

    fn setup() -> (Arc<LandRepository>, Interceptor, BusNotifier) {
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
        let bus = BusNotifier::new();
        let interceptor = Interceptor::new(
            PermissionEngine::new(lands.clone()),
            &Messages::default(),
            Arc::new(bus.clone()),
            Arc::new(Metrics::new()),
        );
        (lands, interceptor, bus)
    }

    fn main_dim() -> DimensionId {
        DimensionId::new("main")
    }

    #[test]
    fn public_break_is_cancelled_with_owner_message() {
        let (_, interceptor, bus) = setup();
        let mut rx = bus.subscribe();
        let mut signal = BlockBreak::new(
            Actor::player("Bob"),
            main_dim(),
            BlockPos::new(5, 65, 5),
            BlockType::new("minecraft:stone"),
        );
        let verdict = interceptor.on_block_break(&mut signal);
        assert!(verdict.is_denied());
        assert!(signal.is_cancelled());
        let note = rx.try_recv().unwrap();
        assert_eq!(note.actor(), &ActorId::new("Bob"));
        assert_eq!(note.text(), Some("This is Alice's land"));
    }

    #[test]
    fn interactions_use_block_category() {
        let (lands, interceptor, _) = setup();
        let mut flags = lands.get("Home").unwrap().public_auth;
        flags.set(Capability::OpenChest, true);
        lands.set_public_auth("Home", flags).unwrap();

        let bob = Actor::player("Bob");
        let pos = BlockPos::new(2, 65, 2);
        let mut chest = BlockInteract::new(bob.clone(), main_dim(), pos, BlockType::new("minecraft:chest"));
        assert_eq!(interceptor.on_block_interact(&mut chest), Verdict::Allow);
        let mut furnace = BlockInteract::new(bob, main_dim(), pos, BlockType::new("minecraft:furnace"));
        assert!(interceptor.on_block_interact(&mut furnace).is_denied());
    }

    #[test]
    fn only_banned_items_are_gated() {
        let (_, interceptor, _) = setup();
        let bob = Actor::player("Bob");
        let pos = BlockPos::new(2, 65, 2);
        let mut flint = ItemUseOn::new(bob.clone(), main_dim(), pos, "minecraft:flint_and_steel");
        assert!(interceptor.on_item_use_on(&mut flint).is_denied());
        let mut bread = ItemUseOn::new(bob, main_dim(), pos, "minecraft:bread");
        assert_eq!(interceptor.on_item_use_on(&mut bread), Verdict::Allow);
        assert!(!bread.is_cancelled());
    }

    #[test]
    fn entity_interaction_outside_claims_is_allowed() {
        let (_, interceptor, _) = setup();
        let mut signal = EntityInteract::new(
            Actor::player("Bob"),
            main_dim(),
            Location::new(50.0, 65.0, 50.0),
            "minecraft:villager",
        );
        assert_eq!(interceptor.on_entity_interact(&mut signal), Verdict::Allow);
    }

    #[test]
    fn extra_guards_merge_deny_wins() {
        let (_, mut interceptor, _) = setup();
        interceptor
            .place_guards()
            .add(|signal: &BlockPlace| {
                if signal.block.path() == "tnt" {
                    Verdict::silent_deny()
                } else {
                    Verdict::Allow
                }
            });

        // Alice owns the land, but the extra guard still vetoes TNT.
        let mut tnt = BlockPlace::new(
            Actor::player("Alice"),
            main_dim(),
            BlockPos::new(1, 65, 1),
            BlockType::new("minecraft:tnt"),
        );
        assert_eq!(interceptor.on_block_place(&mut tnt), Verdict::Deny(None));
        assert!(tnt.is_cancelled());
    }

    #[test]
    fn explosion_keeps_only_unprotected_blocks() {
        let (_, interceptor, _) = setup();
        let mut blast = Explosion::new(
            main_dim(),
            Some("minecraft:tnt".into()),
            vec![BlockPos::new(9, 65, 9), BlockPos::new(10, 65, 10), BlockPos::new(12, 65, 12)],
        );
        assert_eq!(interceptor.on_explosion(&mut blast), 2);
        assert_eq!(blast.impacted, vec![BlockPos::new(12, 65, 12)]);
    }
}
