//! Notification bus.
//!
//! Every piece of player feedback (denials, enter/leave messages, markers and
//! outlines) is published as a [`Notification`] on a shared
//! `tokio::sync::broadcast` channel. The host adapter forwards them to its
//! clients; the dashboard streams them to browsers.

use claim_engine::land::ActorId;
use claim_engine::volume::Cuboid;
use claim_engine::world::position::{BlockPos, DimensionId};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::host::Notifier;

/// Recommended capacity for the broadcast channel.
/// Presence sweeps can emit a burst of messages per tick on a busy server.
pub const BUS_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Message {
        actor: ActorId,
        text: String,
    },
    ActionBar {
        actor: ActorId,
        text: String,
    },
    Marker {
        actor: ActorId,
        dimension: DimensionId,
        pos: BlockPos,
    },
    Outline {
        actor: ActorId,
        dimension: DimensionId,
        cuboid: Cuboid,
        ticks: u32,
    },
}

impl Notification {
    pub fn actor(&self) -> &ActorId {
        match self {
            Notification::Message { actor, .. }
            | Notification::ActionBar { actor, .. }
            | Notification::Marker { actor, .. }
            | Notification::Outline { actor, .. } => actor,
        }
    }

    /// The text of a chat or action-bar notification.
    pub fn text(&self) -> Option<&str> {
        match self {
            Notification::Message { text, .. } | Notification::ActionBar { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// [`Notifier`] that publishes onto the broadcast bus.
#[derive(Clone)]
pub struct BusNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BusNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    fn publish(&self, notification: Notification) {
        // No subscribers is fine; nobody is listening yet.
        let _ = self.tx.send(notification);
    }
}

impl Default for BusNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BusNotifier {
    fn message(&self, actor: &ActorId, text: &str) {
        self.publish(Notification::Message {
            actor: actor.clone(),
            text: text.to_string(),
        });
    }

    fn action_bar(&self, actor: &ActorId, text: &str) {
        self.publish(Notification::ActionBar {
            actor: actor.clone(),
            text: text.to_string(),
        });
    }

    fn marker(&self, actor: &ActorId, dimension: &DimensionId, pos: BlockPos) {
        self.publish(Notification::Marker {
            actor: actor.clone(),
            dimension: dimension.clone(),
            pos,
        });
    }

    fn outline(&self, actor: &ActorId, dimension: &DimensionId, cuboid: &Cuboid, ticks: u32) {
        self.publish(Notification::Outline {
            actor: actor.clone(),
            dimension: dimension.clone(),
            cuboid: *cuboid,
            ticks,
        });
    }
}
