//! Land-claim add-on host.
//!
//! Adapts host signals onto the claim engine: intercepts world mutations,
//! runs the claim workflow and marking tool, and keeps the ambient monitors
//! and dashboard going.

pub mod addon;
pub mod ambient;
pub mod block;
pub mod config;
pub mod dashboard;
pub mod event_bus;
pub mod host;
pub mod interceptor;
pub mod manage;
pub mod marking;
pub mod persistence;
pub mod player_registry;
pub mod signals;
pub mod workflow;
