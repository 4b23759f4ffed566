//! The authoritative land registry.
//!
//! Every record lives in the `lands` table of the persistence collaborator and
//! is mirrored in memory together with two derived indices: owner → names and
//! a chunk-column grid for point lookups. Writes go to the store first and
//! only touch the mirror once the store accepted them, so a failed write
//! leaves the registry unchanged.
//!
//! There is no optimistic concurrency: every mutation re-reads the record,
//! applies the change and rewrites the whole record. The last writer wins.

mod grid;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::{IndexMap, IndexSet};

use crate::capability::CapabilityFlags;
use crate::error::RepositoryError;
use crate::land::{ActorId, Land};
use crate::store::KvStore;
use crate::world::position::{DimensionId, Location};
use grid::SpatialGrid;

/// Table name used in the persistence collaborator.
pub const LANDS_TABLE: &str = "lands";

#[derive(Default)]
struct Registry {
    lands: IndexMap<String, Land>,
    by_owner: HashMap<ActorId, IndexSet<String>>,
    grid: SpatialGrid,
}

impl Registry {
    fn insert(&mut self, land: Land) {
        self.by_owner
            .entry(land.owner.clone())
            .or_default()
            .insert(land.name.clone());
        self.grid.insert(&land);
        self.lands.insert(land.name.clone(), land);
    }

    fn remove(&mut self, name: &str) -> Option<Land> {
        let land = self.lands.shift_remove(name)?;
        self.unindex_owner(&land.owner, name);
        self.grid.remove(&land);
        Some(land)
    }

    /// Swap in a rewritten record. The volume never changes after creation,
    /// so only the owner index needs maintenance.
    fn replace(&mut self, land: Land) {
        let Some(slot) = self.lands.get_mut(&land.name) else {
            return;
        };
        let previous_owner = std::mem::replace(slot, land.clone()).owner;
        if previous_owner != land.owner {
            self.unindex_owner(&previous_owner, &land.name);
            self.by_owner
                .entry(land.owner.clone())
                .or_default()
                .insert(land.name);
        }
    }

    fn count_by_owner(&self, owner: &ActorId) -> usize {
        self.by_owner.get(owner).map_or(0, IndexSet::len)
    }

    fn overlaps_with(&self, candidate: &Land) -> Vec<Land> {
        let cuboid = candidate.cuboid();
        self.lands
            .values()
            .filter(|land| land.dimension == candidate.dimension && land.name != candidate.name)
            .filter(|land| land.cuboid().touches(&cuboid))
            .cloned()
            .collect()
    }

    fn unindex_owner(&mut self, owner: &ActorId, name: &str) {
        if let Some(names) = self.by_owner.get_mut(owner) {
            names.shift_remove(name);
            if names.is_empty() {
                self.by_owner.remove(owner);
            }
        }
    }
}

/// Read-only view of the registry handed to checks that must see a
/// consistent state, either under the read lock ([`LandRepository::inspect`])
/// or under the write lock right before an insert
/// ([`LandRepository::create_checked`]).
pub struct RegistryView<'a> {
    registry: &'a Registry,
}

impl RegistryView<'_> {
    pub fn exists(&self, name: &str) -> bool {
        self.registry.lands.contains_key(name)
    }

    pub fn count_by_owner(&self, owner: &ActorId) -> usize {
        self.registry.count_by_owner(owner)
    }

    /// Every land in the candidate's dimension that touches it.
    pub fn overlaps_with(&self, candidate: &Land) -> Vec<Land> {
        self.registry.overlaps_with(candidate)
    }
}

/// Keyed store of [`Land`] records with uniqueness and per-owner indices.
///
/// Uses `std::sync::RwLock` because every operation is brief and never awaits
/// while the lock is held.
pub struct LandRepository {
    store: Arc<dyn KvStore>,
    state: RwLock<Registry>,
}

impl LandRepository {
    /// Load every record from the store and build the indices.
    ///
    /// Records that fail to decode are skipped with a warning rather than
    /// refusing to start.
    pub fn open(store: Arc<dyn KvStore>) -> Result<Self, RepositoryError> {
        let mut registry = Registry::default();
        for (key, value) in store.get_all(LANDS_TABLE)? {
            match serde_json::from_str::<Land>(&value) {
                Ok(land) if land.name == key => registry.insert(land),
                Ok(land) => tracing::warn!(
                    "Skipping land '{}' stored under mismatched key '{}'",
                    land.name,
                    key
                ),
                Err(e) => tracing::warn!("Skipping unreadable land record '{}': {}", key, e),
            }
        }
        tracing::info!(
            "Land registry ready: {} lands, {} grid cells",
            registry.lands.len(),
            registry.grid.cell_count()
        );
        Ok(Self {
            store,
            state: RwLock::new(registry),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.state.read().expect("land registry poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.state.write().expect("land registry poisoned")
    }

    fn persist(&self, land: &Land) -> Result<(), RepositoryError> {
        let record = serde_json::to_string(land).map_err(|source| RepositoryError::Codec {
            name: land.name.clone(),
            source,
        })?;
        self.store.set(LANDS_TABLE, &land.name, record)?;
        Ok(())
    }

    // ── CRUD ────────────────────────────────────────────────────────────

    /// Register a new land. Fails if the name is taken; callers are expected
    /// to have validated geometry and quota already.
    pub fn create(&self, land: Land) -> Result<(), RepositoryError> {
        self.create_checked(land, |_| Ok::<(), RepositoryError>(()))
    }

    /// Register a new land after `check` accepted the registry as it stands.
    ///
    /// `check` runs under the same write lock as the insert, so no other
    /// writer can slip a conflicting land in between the two.
    pub fn create_checked<E>(
        &self,
        land: Land,
        check: impl FnOnce(&RegistryView<'_>) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<RepositoryError>,
    {
        let mut state = self.write();
        check(&RegistryView { registry: &state })?;
        if state.lands.contains_key(&land.name)
            || self.store.has(LANDS_TABLE, &land.name).map_err(RepositoryError::from)?
        {
            return Err(RepositoryError::AlreadyExists(land.name).into());
        }
        self.persist(&land)?;
        tracing::debug!("Land '{}' registered for {}", land.name, land.owner);
        state.insert(land);
        Ok(())
    }

    /// Run `f` against a consistent snapshot of the registry.
    pub fn inspect<R>(&self, f: impl FnOnce(&RegistryView<'_>) -> R) -> R {
        let state = self.read();
        f(&RegistryView { registry: &state })
    }

    pub fn get(&self, name: &str) -> Option<Land> {
        self.read().lands.get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.read().lands.contains_key(name)
    }

    /// Remove a land and drop it from every index. Returns the removed record.
    pub fn delete(&self, name: &str) -> Result<Land, RepositoryError> {
        let mut state = self.write();
        if !state.lands.contains_key(name) {
            return Err(RepositoryError::NotFound(name.to_string()));
        }
        self.store.delete(LANDS_TABLE, name)?;
        state
            .remove(name)
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))
    }

    pub fn list_all(&self) -> Vec<Land> {
        self.read().lands.values().cloned().collect()
    }

    pub fn list_by_owner(&self, owner: &ActorId) -> Vec<Land> {
        let state = self.read();
        state
            .by_owner
            .get(owner)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| state.lands.get(name).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count_by_owner(&self, owner: &ActorId) -> usize {
        self.read().count_by_owner(owner)
    }

    pub fn len(&self) -> usize {
        self.read().lands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().lands.is_empty()
    }

    // ── Full-record rewrites ────────────────────────────────────────────

    fn update(&self, name: &str, mutate: impl FnOnce(&mut Land)) -> Result<Land, RepositoryError> {
        let mut state = self.write();
        let mut land = state
            .lands
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
        mutate(&mut land);
        self.persist(&land)?;
        state.replace(land.clone());
        Ok(land)
    }

    pub fn set_members(&self, name: &str, members: IndexSet<ActorId>) -> Result<Land, RepositoryError> {
        self.update(name, |land| land.members = members)
    }

    pub fn set_public_auth(&self, name: &str, flags: CapabilityFlags) -> Result<Land, RepositoryError> {
        self.update(name, |land| land.public_auth = flags)
    }

    pub fn set_config_public_auth(
        &self,
        name: &str,
        flags: CapabilityFlags,
    ) -> Result<Land, RepositoryError> {
        self.update(name, |land| land.config_public_auth = flags)
    }

    /// Hand the land to a new owner. The new owner stops being a member.
    pub fn transfer_owner(&self, name: &str, new_owner: ActorId) -> Result<Land, RepositoryError> {
        self.update(name, |land| {
            land.members.shift_remove(&new_owner);
            land.owner = new_owner;
        })
    }

    // ── Spatial queries ─────────────────────────────────────────────────

    /// Every registered land in the candidate's dimension whose cuboid
    /// intersects or is face-adjacent to the candidate's.
    pub fn overlaps_with(&self, candidate: &Land) -> Vec<Land> {
        self.read().overlaps_with(candidate)
    }

    /// Run `f` against the land containing `point`, if any.
    pub fn with_land_at<R>(
        &self,
        dimension: &DimensionId,
        point: Location,
        f: impl FnOnce(&Land) -> R,
    ) -> Option<R> {
        let state = self.read();
        state
            .grid
            .candidates(dimension, point.block().chunk())
            .iter()
            .filter_map(|name| state.lands.get(name))
            .find(|land| land.cuboid().contains(point))
            .map(f)
    }

    pub fn land_at(&self, dimension: &DimensionId, point: Location) -> Option<Land> {
        self.with_land_at(dimension, point, Land::clone)
    }
}
