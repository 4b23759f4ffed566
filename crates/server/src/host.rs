//! Collaborators the add-on talks to but does not own: the economy, the
//! dialog UI, player notifications and world access.
//!
//! Each is a trait so a real host can plug in its own module. The in-memory
//! implementations here back the demo binary and the tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use claim_engine::land::ActorId;
use claim_engine::volume::Cuboid;
use claim_engine::world::World;
use claim_engine::world::block::BlockType;
use claim_engine::world::position::{BlockPos, DimensionId};
use dashmap::DashMap;
use tokio::sync::oneshot;

// ── Economy ─────────────────────────────────────────────────────────────

pub trait Economy: Send + Sync {
    /// Price of claiming `capacity` blocks.
    fn price_for_volume(&self, capacity: u64) -> u64;

    fn balance(&self, actor: &ActorId) -> u64;

    /// Take `amount` from the actor. Returns false (and takes nothing) if the
    /// debit could not be made.
    fn debit(&self, actor: &ActorId, amount: u64, reason: &str) -> bool;

    fn credit(&self, actor: &ActorId, amount: u64, reason: &str);
}

/// In-memory wallet book with a flat per-block price.
pub struct Ledger {
    price_per_block: u64,
    balances: DashMap<ActorId, u64>,
}

impl Ledger {
    pub fn new(price_per_block: u64) -> Self {
        Self {
            price_per_block,
            balances: DashMap::new(),
        }
    }

    pub fn deposit(&self, actor: &ActorId, amount: u64) {
        *self.balances.entry(actor.clone()).or_default() += amount;
    }
}

impl Economy for Ledger {
    fn price_for_volume(&self, capacity: u64) -> u64 {
        capacity.saturating_mul(self.price_per_block)
    }

    fn balance(&self, actor: &ActorId) -> u64 {
        self.balances.get(actor).map_or(0, |b| *b)
    }

    fn debit(&self, actor: &ActorId, amount: u64, reason: &str) -> bool {
        let Some(mut balance) = self.balances.get_mut(actor) else {
            return amount == 0;
        };
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        tracing::debug!("Debited {} from {} ({})", amount, actor, reason);
        true
    }

    fn credit(&self, actor: &ActorId, amount: u64, reason: &str) {
        self.deposit(actor, amount);
        tracing::debug!("Credited {} to {} ({})", amount, actor, reason);
    }
}

// ── Dialog ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResponse {
    Confirmed,
    Cancelled,
    /// The player already had another form open.
    Busy,
}

pub trait Dialog: Send + Sync {
    /// Show a confirm/cancel prompt. The answer arrives on the returned
    /// channel; a dropped sender counts as a cancel.
    fn confirm(&self, actor: &ActorId, prompt: ConfirmPrompt) -> oneshot::Receiver<DialogResponse>;
}

/// Answers every prompt immediately with a fixed response.
pub struct AutoDialog {
    pub answer: DialogResponse,
}

impl AutoDialog {
    pub fn confirming() -> Self {
        Self {
            answer: DialogResponse::Confirmed,
        }
    }
}

impl Dialog for AutoDialog {
    fn confirm(&self, actor: &ActorId, prompt: ConfirmPrompt) -> oneshot::Receiver<DialogResponse> {
        tracing::debug!("Auto-answering '{}' for {} with {:?}", prompt.title, actor, self.answer);
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(self.answer);
        rx
    }
}

/// Holds prompts until someone answers them, oldest first.
#[derive(Default)]
pub struct QueuedDialog {
    pending: Mutex<VecDeque<(ActorId, ConfirmPrompt, oneshot::Sender<DialogResponse>)>>,
}

impl QueuedDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("dialog queue poisoned").len()
    }

    /// Answer the oldest open prompt. Returns who it was for and what it
    /// said, or `None` when nothing is waiting.
    pub fn answer_next(&self, response: DialogResponse) -> Option<(ActorId, ConfirmPrompt)> {
        let (actor, prompt, tx) = self.pending.lock().expect("dialog queue poisoned").pop_front()?;
        let _ = tx.send(response);
        Some((actor, prompt))
    }

    /// Close the oldest prompt without answering, as a disconnect would.
    pub fn dismiss_next(&self) -> bool {
        self.pending
            .lock()
            .expect("dialog queue poisoned")
            .pop_front()
            .is_some()
    }
}

impl Dialog for QueuedDialog {
    fn confirm(&self, actor: &ActorId, prompt: ConfirmPrompt) -> oneshot::Receiver<DialogResponse> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("dialog queue poisoned")
            .push_back((actor.clone(), prompt, tx));
        rx
    }
}

// ── Notifications ───────────────────────────────────────────────────────

/// Fire-and-forget feedback to players.
pub trait Notifier: Send + Sync {
    fn message(&self, actor: &ActorId, text: &str);

    fn action_bar(&self, actor: &ActorId, text: &str);

    fn marker(&self, actor: &ActorId, dimension: &DimensionId, pos: BlockPos);

    fn outline(&self, actor: &ActorId, dimension: &DimensionId, cuboid: &Cuboid, ticks: u32);
}

// ── World access ────────────────────────────────────────────────────────

pub type BlockMatcher<'a> = &'a (dyn Fn(&BlockType) -> bool + Sync);

pub trait WorldAccess: Send + Sync {
    fn block_at(&self, dimension: &DimensionId, pos: BlockPos) -> BlockType;

    /// Replace every block in `cuboid` accepted by `matches`. Returns how many
    /// blocks changed.
    fn replace_in_volume(
        &self,
        dimension: &DimensionId,
        cuboid: &Cuboid,
        matches: BlockMatcher<'_>,
        with: &BlockType,
    ) -> usize;
}

impl WorldAccess for World {
    fn block_at(&self, dimension: &DimensionId, pos: BlockPos) -> BlockType {
        self.get_block(dimension, pos)
    }

    fn replace_in_volume(
        &self,
        dimension: &DimensionId,
        cuboid: &Cuboid,
        matches: BlockMatcher<'_>,
        with: &BlockType,
    ) -> usize {
        World::replace_in_volume(self, dimension, cuboid, matches, with)
    }
}
