//! Lock-free activity counters.
//!
//! Signal handlers and ambient layers bump these with relaxed atomics; no
//! locks, no allocations on the hot path. The dashboard reads them at its own
//! pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Instant;

pub struct Metrics {
    // Claim lifecycle
    claims_created: AtomicU64,
    claims_aborted: AtomicU64,
    lands_deleted: AtomicU64,

    // Interceptor verdicts
    actions_allowed: AtomicU64,
    actions_denied: AtomicU64,
    explosion_blocks_filtered: AtomicU64,

    // Ambient layers
    burn_blocks_cleared: AtomicU64,
    lands_entered: AtomicU64,
    lands_left: AtomicU64,
    marks_expired: AtomicU64,

    // Gauges
    players_online: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            claims_created: AtomicU64::new(0),
            claims_aborted: AtomicU64::new(0),
            lands_deleted: AtomicU64::new(0),
            actions_allowed: AtomicU64::new(0),
            actions_denied: AtomicU64::new(0),
            explosion_blocks_filtered: AtomicU64::new(0),
            burn_blocks_cleared: AtomicU64::new(0),
            lands_entered: AtomicU64::new(0),
            lands_left: AtomicU64::new(0),
            marks_expired: AtomicU64::new(0),
            players_online: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn claim_created(&self) {
        self.claims_created.fetch_add(1, Relaxed);
    }

    pub fn claim_aborted(&self) {
        self.claims_aborted.fetch_add(1, Relaxed);
    }

    pub fn land_deleted(&self) {
        self.lands_deleted.fetch_add(1, Relaxed);
    }

    pub fn record_verdict(&self, allowed: bool) {
        if allowed {
            self.actions_allowed.fetch_add(1, Relaxed);
        } else {
            self.actions_denied.fetch_add(1, Relaxed);
        }
    }

    pub fn explosion_filtered(&self, blocks: u64) {
        self.explosion_blocks_filtered.fetch_add(blocks, Relaxed);
    }

    pub fn burn_cleared(&self, blocks: u64) {
        self.burn_blocks_cleared.fetch_add(blocks, Relaxed);
    }

    pub fn land_entered(&self) {
        self.lands_entered.fetch_add(1, Relaxed);
    }

    pub fn land_left(&self) {
        self.lands_left.fetch_add(1, Relaxed);
    }

    pub fn mark_expired(&self) {
        self.marks_expired.fetch_add(1, Relaxed);
    }

    pub fn player_joined(&self) {
        self.players_online.fetch_add(1, Relaxed);
    }

    pub fn player_left(&self) {
        self.players_online.fetch_sub(1, Relaxed);
    }

    /// Read all counters into a serializable snapshot.
    pub fn snapshot(&self, lands: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            lands,
            players: self.players_online.load(Relaxed),
            claims_created: self.claims_created.load(Relaxed),
            claims_aborted: self.claims_aborted.load(Relaxed),
            lands_deleted: self.lands_deleted.load(Relaxed),
            actions_allowed: self.actions_allowed.load(Relaxed),
            actions_denied: self.actions_denied.load(Relaxed),
            explosion_blocks_filtered: self.explosion_blocks_filtered.load(Relaxed),
            burn_blocks_cleared: self.burn_blocks_cleared.load(Relaxed),
            lands_entered: self.lands_entered.load(Relaxed),
            lands_left: self.lands_left.load(Relaxed),
            marks_expired: self.marks_expired.load(Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all metrics at a point in time.
/// The client computes rates by diffing consecutive snapshots.
#[derive(Clone, Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub lands: u64,
    pub players: u64,
    pub claims_created: u64,
    pub claims_aborted: u64,
    pub lands_deleted: u64,
    pub actions_allowed: u64,
    pub actions_denied: u64,
    pub explosion_blocks_filtered: u64,
    pub burn_blocks_cleared: u64,
    pub lands_entered: u64,
    pub lands_left: u64,
    pub marks_expired: u64,
}
