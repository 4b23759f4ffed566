//! Allow/deny decisions for actions inside claimed land.

use std::sync::Arc;

use crate::capability::Capability;
use crate::land::{Actor, ActorId, Land};
use crate::repository::LandRepository;
use crate::world::position::{BlockPos, DimensionId, Location};

/// How an actor relates to a particular land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    Member,
    Public,
}

impl Role {
    pub fn of(actor: &Actor, land: &Land) -> Role {
        if land.is_owner(&actor.id) {
            Role::Owner
        } else if actor.admin {
            Role::Admin
        } else if land.is_member(&actor.id) {
            Role::Member
        } else {
            Role::Public
        }
    }

    /// Owners and admins may transfer, delete and edit meta-permissions.
    pub fn is_administrative(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { land: String, owner: ActorId },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide `capability` for `actor` against the land covering the location
/// (`None` when the location is unclaimed).
///
/// Owner, admin and members may do anything; the public falls back to the
/// land's `public_auth` flags.
pub fn decide_in(land: Option<&Land>, actor: &Actor, capability: Capability) -> Decision {
    let Some(land) = land else {
        return Decision::Allow;
    };
    match Role::of(actor, land) {
        Role::Owner | Role::Admin | Role::Member => Decision::Allow,
        Role::Public if land.public_auth.get(capability) => Decision::Allow,
        Role::Public => Decision::Deny {
            land: land.name.clone(),
            owner: land.owner.clone(),
        },
    }
}

/// Whether `actor` may flip the `public_auth` entry for `capability`.
///
/// Distinct from using the land: members may use everything but only edit the
/// flags their `config_public_auth` entry opens up.
pub fn can_configure(actor: &Actor, land: &Land, capability: Capability) -> bool {
    match Role::of(actor, land) {
        Role::Owner | Role::Admin => true,
        Role::Member => land.config_public_auth.get(capability),
        Role::Public => false,
    }
}

/// Repository-backed decisions for live world signals.
#[derive(Clone)]
pub struct PermissionEngine {
    lands: Arc<LandRepository>,
}

impl PermissionEngine {
    pub fn new(lands: Arc<LandRepository>) -> Self {
        Self { lands }
    }

    pub fn decide(
        &self,
        actor: &Actor,
        location: Location,
        dimension: &DimensionId,
        capability: Capability,
    ) -> Decision {
        self.lands
            .with_land_at(dimension, location, |land| decide_in(Some(land), actor, capability))
            .unwrap_or(Decision::Allow)
    }

    /// Explosions have no acting player: a block may be destroyed if it is
    /// unclaimed or its land allows `explode`.
    pub fn explosion_may_affect(&self, dimension: &DimensionId, pos: BlockPos) -> bool {
        self.lands
            .with_land_at(dimension, pos.to_location(), |land| {
                land.public_auth.get(Capability::Explode)
            })
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Land {
        let mut land = Land::new(
            "Home",
            ActorId::new("Alice"),
            DimensionId::new("main"),
            BlockPos::new(0, 64, 0),
            BlockPos::new(10, 70, 10),
        );
        land.members.insert(ActorId::new("Carol"));
        land
    }

    #[test]
    fn unclaimed_always_allows() {
        assert_eq!(decide_in(None, &Actor::player("Bob"), Capability::Break), Decision::Allow);
    }

    #[test]
    fn owner_admin_member_bypass_flags() {
        let land = home();
        for actor in [Actor::player("Alice"), Actor::admin("Root"), Actor::player("Carol")] {
            for cap in Capability::ALL {
                assert!(decide_in(Some(&land), &actor, cap).is_allowed());
            }
        }
    }

    #[test]
    fn public_follows_flags() {
        let mut land = home();
        let bob = Actor::player("Bob");
        assert_eq!(
            decide_in(Some(&land), &bob, Capability::Break),
            Decision::Deny {
                land: "Home".into(),
                owner: ActorId::new("Alice"),
            }
        );
        land.public_auth.set(Capability::Break, true);
        assert!(decide_in(Some(&land), &bob, Capability::Break).is_allowed());
        assert!(!decide_in(Some(&land), &bob, Capability::Place).is_allowed());
    }

    #[test]
    fn configure_rights_by_role() {
        let mut land = home();
        let carol = Actor::player("Carol");
        assert!(can_configure(&Actor::player("Alice"), &land, Capability::Place));
        assert!(can_configure(&Actor::admin("Root"), &land, Capability::Place));
        assert!(!can_configure(&carol, &land, Capability::Place));
        land.config_public_auth.set(Capability::Place, true);
        assert!(can_configure(&carol, &land, Capability::Place));
        assert!(!can_configure(&carol, &land, Capability::Break));
        assert!(!can_configure(&Actor::player("Bob"), &land, Capability::Place));
    }

    #[test]
    fn admin_owner_is_still_owner() {
        let land = home();
        assert_eq!(Role::of(&Actor::admin("Alice"), &land), Role::Owner);
        assert_eq!(Role::of(&Actor::admin("Root"), &land), Role::Admin);
        assert!(Role::Admin.is_administrative());
        assert!(!Role::Member.is_administrative());
    }
}
