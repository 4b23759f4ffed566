//! Two-corner selection with the marking tool.
//!
//! Striking a block with the tool sets the first corner; striking while
//! crouching sets the second. Both land one block above the struck block so
//! the claim starts at the surface the player is standing on. Marks expire
//! after the configured timeout without changes.

use std::time::{Duration, Instant};

use claim_engine::land::ActorId;
use claim_engine::volume::Cuboid;
use claim_engine::world::position::{BlockPos, DimensionId};
use dashmap::DashMap;

use crate::config::MarkingConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimMark {
    pub dimension: DimensionId,
    pub start: Option<BlockPos>,
    pub end: Option<BlockPos>,
    pub last_change: Instant,
}

impl ClaimMark {
    fn empty(dimension: DimensionId, now: Instant) -> Self {
        Self {
            dimension,
            start: None,
            end: None,
            last_change: now,
        }
    }

    pub fn corners(&self) -> Option<(BlockPos, BlockPos)> {
        Some((self.start?, self.end?))
    }

    pub fn cuboid(&self) -> Option<Cuboid> {
        self.corners().map(|(a, b)| Cuboid::from_corners(a, b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Not the marking tool.
    Ignored,
    /// Repeated within the debounce window and dropped.
    Debounced,
    StartSet(BlockPos),
    EndSet(BlockPos),
}

pub struct MarkBook {
    tool: String,
    debounce: Duration,
    timeout: Duration,
    marks: DashMap<ActorId, ClaimMark>,
    last_action: DashMap<ActorId, Instant>,
}

impl MarkBook {
    pub fn new(config: &MarkingConfig) -> Self {
        Self {
            tool: config.tool.clone(),
            debounce: config.debounce(),
            timeout: config.timeout(),
            marks: DashMap::new(),
            last_action: DashMap::new(),
        }
    }

    pub fn is_tool(&self, item: &str) -> bool {
        item == self.tool
    }

    /// Handle a block hit. Marks in another dimension are discarded when the
    /// player starts marking somewhere new.
    pub fn on_hit_block(
        &self,
        actor: &ActorId,
        dimension: &DimensionId,
        item: Option<&str>,
        pos: BlockPos,
        crouching: bool,
        now: Instant,
    ) -> MarkOutcome {
        if !item.is_some_and(|item| self.is_tool(item)) {
            return MarkOutcome::Ignored;
        }
        if let Some(last) = self.last_action.get(actor) {
            if now.saturating_duration_since(*last) < self.debounce {
                return MarkOutcome::Debounced;
            }
        }
        self.last_action.insert(actor.clone(), now);

        let corner = pos.up();
        let mut mark = self
            .marks
            .entry(actor.clone())
            .or_insert_with(|| ClaimMark::empty(dimension.clone(), now));
        if mark.dimension != *dimension {
            *mark = ClaimMark::empty(dimension.clone(), now);
        }
        mark.last_change = now;
        if crouching {
            mark.end = Some(corner);
            MarkOutcome::EndSet(corner)
        } else {
            mark.start = Some(corner);
            MarkOutcome::StartSet(corner)
        }
    }

    pub fn get(&self, actor: &ActorId) -> Option<ClaimMark> {
        self.marks.get(actor).map(|mark| mark.clone())
    }

    pub fn clear(&self, actor: &ActorId) -> Option<ClaimMark> {
        self.last_action.remove(actor);
        self.marks.remove(actor).map(|(_, mark)| mark)
    }

    /// Drop marks untouched for longer than the timeout and return their
    /// owners.
    pub fn sweep(&self, now: Instant) -> Vec<ActorId> {
        let expired: Vec<ActorId> = self
            .marks
            .iter()
            .filter(|entry| now.saturating_duration_since(entry.last_change) > self.timeout)
            .map(|entry| entry.key().clone())
            .collect();
        for actor in &expired {
            self.marks
                .remove_if(actor, |_, mark| now.saturating_duration_since(mark.last_change) > self.timeout);
            self.last_action.remove(actor);
        }
        expired
    }

    /// Every live mark, for rendering.
    pub fn snapshot(&self) -> Vec<(ActorId, ClaimMark)> {
        self.marks
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
