//! Game-agnostic land-claim core.
//!
//! Volumes, the land registry, and the permission rules that decide who may
//! do what inside a claim. Nothing in here knows about a particular host; the
//! server crate adapts host signals onto these types.

pub mod capability;
pub mod error;
pub mod guard;
pub mod land;
pub mod permission;
pub mod repository;
pub mod store;
pub mod volume;
pub mod world;
