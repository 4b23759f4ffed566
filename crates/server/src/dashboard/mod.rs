//! Live web dashboard: activity counters, the land registry and the
//! notification stream.
//!
//! The web server runs on its own tokio tasks and only ever reads shared
//! state: counters via relaxed atomic loads, lands via repository snapshots,
//! notifications via its own broadcast subscription.

pub mod metrics;
pub mod server;

use std::sync::Arc;

use claim_engine::repository::LandRepository;

use crate::event_bus::BusNotifier;

pub use metrics::Metrics;

/// Central state shared via `Arc<DashboardState>`.
pub struct DashboardState {
    pub metrics: Arc<Metrics>,
    pub lands: Arc<LandRepository>,
    pub bus: BusNotifier,
}

impl DashboardState {
    pub fn new(metrics: Arc<Metrics>, lands: Arc<LandRepository>, bus: BusNotifier) -> Self {
        Self { metrics, lands, bus }
    }
}
