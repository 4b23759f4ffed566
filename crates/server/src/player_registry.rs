//! Shared registry of connected players.
//!
//! The host adapter feeds joins, leaves, movement and stance in here. The
//! presence sweep reads snapshots and drops per-player state on `Left`; the
//! marking tool reads the crouching stance.

use std::collections::HashMap;
use std::sync::RwLock;

use claim_engine::land::{Actor, ActorId};
use claim_engine::world::position::{DimensionId, Location};
use tokio::sync::broadcast;

/// Information about a connected player, stored in the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerInfo {
    pub actor: Actor,
    pub dimension: DimensionId,
    pub location: Location,
    /// Blocks per tick on each axis.
    pub velocity: [f64; 3],
    pub crouching: bool,
}

impl PlayerInfo {
    pub fn new(actor: Actor, dimension: DimensionId, location: Location) -> Self {
        Self {
            actor,
            dimension,
            location,
            velocity: [0.0; 3],
            crouching: false,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.velocity.iter().any(|v| *v != 0.0)
    }
}

/// Lifecycle events broadcast to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    Joined {
        actor: ActorId,
        dimension: DimensionId,
        location: Location,
    },
    Left {
        actor: ActorId,
    },
    /// A player moved. Sent at high frequency.
    Moved {
        actor: ActorId,
        dimension: DimensionId,
        location: Location,
    },
}

/// Thread-safe registry of all connected players.
///
/// Uses `std::sync::RwLock` because every operation is brief (no awaits while
/// the lock is held) and the access pattern is read-heavy.
pub struct PlayerRegistry {
    players: RwLock<HashMap<ActorId, PlayerInfo>>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        // Movement events dominate; leave room for a few ticks of them.
        let (event_tx, _) = broadcast::channel(512);
        Self {
            players: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Register a player and broadcast `PlayerEvent::Joined`.
    pub fn register(&self, info: PlayerInfo) {
        let event = PlayerEvent::Joined {
            actor: info.actor.id.clone(),
            dimension: info.dimension.clone(),
            location: info.location,
        };
        self.players
            .write()
            .expect("player registry poisoned")
            .insert(info.actor.id.clone(), info);
        // Best-effort: if no subscribers yet, the send fails silently.
        let _ = self.event_tx.send(event);
    }

    /// Update position, velocity and stance, broadcasting `PlayerEvent::Moved`.
    pub fn update_motion(
        &self,
        actor: &ActorId,
        dimension: DimensionId,
        location: Location,
        velocity: [f64; 3],
        crouching: bool,
    ) {
        {
            let mut players = self.players.write().expect("player registry poisoned");
            let Some(info) = players.get_mut(actor) else {
                return;
            };
            info.dimension = dimension.clone();
            info.location = location;
            info.velocity = velocity;
            info.crouching = crouching;
        }
        let _ = self.event_tx.send(PlayerEvent::Moved {
            actor: actor.clone(),
            dimension,
            location,
        });
    }

    /// Remove a player and broadcast `PlayerEvent::Left`.
    pub fn deregister(&self, actor: &ActorId) {
        let removed = self
            .players
            .write()
            .expect("player registry poisoned")
            .remove(actor);
        if removed.is_some() {
            let _ = self.event_tx.send(PlayerEvent::Left {
                actor: actor.clone(),
            });
        }
    }

    pub fn get(&self, actor: &ActorId) -> Option<PlayerInfo> {
        self.players
            .read()
            .expect("player registry poisoned")
            .get(actor)
            .cloned()
    }

    pub fn is_online(&self, actor: &ActorId) -> bool {
        self.players
            .read()
            .expect("player registry poisoned")
            .contains_key(actor)
    }

    /// Snapshot of all currently registered players.
    pub fn snapshot(&self) -> Vec<PlayerInfo> {
        self.players
            .read()
            .expect("player registry poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn player_count(&self) -> usize {
        self.players
            .read()
            .expect("player registry poisoned")
            .len()
    }

    /// Subscribe to player lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_is_broadcast() {
        let registry = PlayerRegistry::new();
        let mut rx = registry.subscribe();
        let alice = Actor::player("Alice");
        let main = DimensionId::new("main");

        registry.register(PlayerInfo::new(alice.clone(), main.clone(), Location::new(0.0, 64.0, 0.0)));
        registry.update_motion(&alice.id, main.clone(), Location::new(1.0, 64.0, 0.0), [0.2, 0.0, 0.0], false);
        assert!(registry.get(&alice.id).unwrap().is_moving());
        registry.deregister(&alice.id);
        registry.deregister(&alice.id);

        assert!(matches!(rx.try_recv().unwrap(), PlayerEvent::Joined { .. }));
        assert!(matches!(rx.try_recv().unwrap(), PlayerEvent::Moved { location, .. } if location.x == 1.0));
        assert_eq!(rx.try_recv().unwrap(), PlayerEvent::Left { actor: alice.id.clone() });
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.player_count(), 0);
    }

    #[test]
    fn motion_for_unknown_player_is_ignored() {
        let registry = PlayerRegistry::new();
        let mut rx = registry.subscribe();
        registry.update_motion(&ActorId::new("Ghost"), DimensionId::new("main"), Location::ZERO, [1.0; 3], false);
        assert!(rx.try_recv().is_err());
        assert!(!registry.is_online(&ActorId::new("Ghost")));
    }
}
