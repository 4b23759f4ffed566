//! Land registry behaviour against the in-memory store: uniqueness, indices,
//! full-record rewrites and spatial lookups.

use std::sync::Arc;

use anyhow::anyhow;
use indexmap::IndexSet;

use claim_engine::capability::{Capability, CapabilityFlags};
use claim_engine::error::RepositoryError;
use claim_engine::land::{ActorId, Land};
use claim_engine::repository::{LANDS_TABLE, LandRepository};
use claim_engine::store::{KvStore, MemoryStore};
use claim_engine::world::position::{BlockPos, DimensionId, Location};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn main_dim() -> DimensionId {
    DimensionId::new("main")
}

fn land(name: &str, owner: &str, a: (i64, i64, i64), b: (i64, i64, i64)) -> Land {
    Land::new(
        name,
        ActorId::new(owner),
        main_dim(),
        BlockPos::new(a.0, a.1, a.2),
        BlockPos::new(b.0, b.1, b.2),
    )
}

fn empty_repo() -> (Arc<MemoryStore>, LandRepository) {
    let store = Arc::new(MemoryStore::new());
    let repo = LandRepository::open(store.clone()).unwrap();
    (store, repo)
}

/// A store that accepts reads but refuses every write.
struct ReadOnlyStore(MemoryStore);

impl KvStore for ReadOnlyStore {
    fn get(&self, table: &str, key: &str) -> anyhow::Result<Option<String>> {
        self.0.get(table, key)
    }
    fn set(&self, _: &str, _: &str, _: String) -> anyhow::Result<()> {
        Err(anyhow!("disk full"))
    }
    fn delete(&self, _: &str, _: &str) -> anyhow::Result<bool> {
        Err(anyhow!("disk full"))
    }
    fn get_all(&self, table: &str) -> anyhow::Result<Vec<(String, String)>> {
        self.0.get_all(table)
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[test]
fn create_then_get() {
    let (store, repo) = empty_repo();
    repo.create(land("Home", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();

    let home = repo.get("Home").expect("Home registered");
    assert_eq!(home.owner, ActorId::new("Alice"));
    for cap in Capability::ALL {
        assert!(!home.public_auth.get(cap));
        assert!(!home.config_public_auth.get(cap));
    }
    assert!(store.has(LANDS_TABLE, "Home").unwrap());
    assert_eq!(repo.len(), 1);
}

#[test]
fn duplicate_name_is_rejected_anywhere() {
    let (_, repo) = empty_repo();
    repo.create(land("Home", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();

    // Same name, different owner, far away, different dimension.
    let mut other = land("Home", "Bob", (500, 64, 500), (510, 70, 510));
    other.dimension = DimensionId::new("nether");
    let err = repo.create(other).unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists(ref n) if n == "Home"));
    assert_eq!(repo.get("Home").unwrap().owner, ActorId::new("Alice"));
}

#[test]
fn delete_clears_owner_index_and_grid() {
    let (store, repo) = empty_repo();
    repo.create(land("Home", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();
    repo.create(land("Farm", "Alice", (40, 64, 0), (50, 70, 10))).unwrap();
    assert_eq!(repo.list_by_owner(&ActorId::new("Alice")).len(), 2);

    let removed = repo.delete("Home").unwrap();
    assert_eq!(removed.name, "Home");

    let names: Vec<String> = repo
        .list_by_owner(&ActorId::new("Alice"))
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["Farm"]);
    assert!(repo.land_at(&main_dim(), Location::new(5.0, 65.0, 5.0)).is_none());
    assert!(!store.has(LANDS_TABLE, "Home").unwrap());
    assert!(matches!(repo.delete("Home"), Err(RepositoryError::NotFound(_))));
}

#[test]
fn public_auth_round_trips() {
    let (_, repo) = empty_repo();
    repo.create(land("Home", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();

    let flags = CapabilityFlags::denied()
        .with(Capability::Place, true)
        .with(Capability::UseButton, true);
    repo.set_public_auth("Home", flags.clone()).unwrap();
    assert_eq!(repo.get("Home").unwrap().public_auth, flags);

    let meta = CapabilityFlags::denied().with(Capability::Break, true);
    repo.set_config_public_auth("Home", meta.clone()).unwrap();
    let home = repo.get("Home").unwrap();
    assert_eq!(home.config_public_auth, meta);
    assert_eq!(home.public_auth, flags);
}

#[test]
fn transfer_moves_owner_index() {
    let (_, repo) = empty_repo();
    repo.create(land("Home", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();
    let members: IndexSet<ActorId> = [ActorId::new("Bob"), ActorId::new("Carol")].into_iter().collect();
    repo.set_members("Home", members).unwrap();

    let home = repo.transfer_owner("Home", ActorId::new("Bob")).unwrap();
    assert_eq!(home.owner, ActorId::new("Bob"));
    assert!(!home.is_member(&ActorId::new("Bob")));
    assert!(home.is_member(&ActorId::new("Carol")));
    assert_eq!(repo.count_by_owner(&ActorId::new("Alice")), 0);
    assert_eq!(repo.count_by_owner(&ActorId::new("Bob")), 1);
}

#[test]
fn records_survive_reopen() {
    let store = Arc::new(MemoryStore::new());
    {
        let repo = LandRepository::open(store.clone()).unwrap();
        repo.create(land("Home", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();
        repo.set_public_auth("Home", CapabilityFlags::denied().with(Capability::Burn, true))
            .unwrap();
    }
    store.set(LANDS_TABLE, "Broken", "{not json".into()).unwrap();

    let repo = LandRepository::open(store).unwrap();
    assert_eq!(repo.len(), 1);
    let home = repo.get("Home").unwrap();
    assert!(home.public_auth.get(Capability::Burn));
    assert!(repo.land_at(&main_dim(), Location::new(1.0, 65.0, 1.0)).is_some());
}

#[test]
fn failed_write_leaves_registry_unchanged() {
    let seed = MemoryStore::new();
    let home = land("Home", "Alice", (0, 64, 0), (10, 70, 10));
    seed.set(LANDS_TABLE, "Home", serde_json::to_string(&home).unwrap()).unwrap();

    let repo = LandRepository::open(Arc::new(ReadOnlyStore(seed))).unwrap();
    assert!(repo.create(land("Farm", "Alice", (40, 64, 0), (50, 70, 10))).is_err());
    assert!(repo.get("Farm").is_none());

    assert!(repo
        .set_public_auth("Home", CapabilityFlags::denied().with(Capability::Break, true))
        .is_err());
    assert!(!repo.get("Home").unwrap().public_auth.get(Capability::Break));

    assert!(repo.delete("Home").is_err());
    assert!(repo.exists("Home"));
}

// ---------------------------------------------------------------------------
// Spatial queries
// ---------------------------------------------------------------------------

#[test]
fn overlaps_reports_every_conflict() {
    let (_, repo) = empty_repo();
    repo.create(land("West", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();
    repo.create(land("East", "Bob", (20, 64, 0), (30, 70, 10))).unwrap();
    repo.create(land("FarAway", "Bob", (100, 64, 0), (110, 70, 10))).unwrap();

    let bridge = land("Bridge", "Carol", (5, 64, 5), (25, 70, 8));
    let mut names: Vec<String> = repo.overlaps_with(&bridge).into_iter().map(|l| l.name).collect();
    names.sort();
    assert_eq!(names, vec!["East", "West"]);

    // Flush against West's x face still conflicts.
    let flush = land("Flush", "Carol", (11, 64, 0), (15, 70, 10));
    assert_eq!(repo.overlaps_with(&flush).len(), 1);

    // The same box in another dimension does not.
    let mut elsewhere = bridge.clone();
    elsewhere.dimension = DimensionId::new("nether");
    assert!(repo.overlaps_with(&elsewhere).is_empty());
}

#[test]
fn checked_create_sees_the_registry_under_its_lock() {
    let (store, repo) = empty_repo();
    repo.create(land("West", "Alice", (0, 64, 0), (10, 70, 10))).unwrap();

    let rival = land("Rival", "Bob", (5, 64, 5), (15, 70, 15));
    let err = repo
        .create_checked(rival.clone(), |registry| {
            match registry.overlaps_with(&rival).first() {
                Some(other) => Err(RepositoryError::AlreadyExists(other.name.clone())),
                None => Ok(()),
            }
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists(name) if name == "West"));
    assert!(!repo.exists("Rival"));
    assert!(!store.has(LANDS_TABLE, "Rival").unwrap());

    let east = land("East", "Bob", (20, 64, 0), (30, 70, 10));
    repo.create_checked(east, |registry| {
        assert_eq!(registry.count_by_owner(&ActorId::new("Alice")), 1);
        assert!(registry.exists("West"));
        Ok::<(), RepositoryError>(())
    })
    .unwrap();
    assert_eq!(repo.inspect(|registry| registry.count_by_owner(&ActorId::new("Bob"))), 1);
}

#[test]
fn land_at_spans_chunk_boundaries() {
    let (_, repo) = empty_repo();
    repo.create(land("Wide", "Alice", (-20, 64, -20), (40, 70, 40))).unwrap();

    for (x, z) in [(-20.0, -20.0), (0.0, 0.0), (15.6, 16.2), (40.0, 40.0)] {
        let found = repo.land_at(&main_dim(), Location::new(x, 66.0, z));
        assert_eq!(found.map(|l| l.name), Some("Wide".to_string()), "at ({x}, {z})");
    }
    assert!(repo.land_at(&main_dim(), Location::new(41.0, 66.0, 0.0)).is_none());
    assert!(repo.land_at(&DimensionId::new("nether"), Location::new(0.0, 66.0, 0.0)).is_none());
}
