//! Owner-facing land management: members, ownership, flags, deletion.
//!
//! Every operation checks the caller's role first and then performs a full
//! read-modify-write of the record through the repository.

use std::sync::Arc;

use claim_engine::capability::Capability;
use claim_engine::error::RepositoryError;
use claim_engine::land::{Actor, ActorId, Land};
use claim_engine::permission::{Role, can_configure};
use claim_engine::repository::LandRepository;
use claim_engine::volume::Cuboid;
use claim_engine::world::position::{DimensionId, Location};
use serde::Serialize;
use thiserror::Error;

use crate::dashboard::Metrics;

#[derive(Debug, Error)]
pub enum ManageError {
    #[error("no land named '{0}'")]
    NotFound(String),

    #[error("only the owner or an admin may {0}")]
    NotAdministrator(&'static str),

    #[error("you may not change '{0}' on this land")]
    NotPermitted(Capability),

    #[error("{0} is already a member")]
    AlreadyMember(ActorId),

    #[error("{0} is not a member")]
    NotMember(ActorId),

    #[error("{0} already owns this land")]
    AlreadyOwner(ActorId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read-only summary of a land.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandInfo {
    pub name: String,
    pub owner: ActorId,
    pub dimension: DimensionId,
    pub members: Vec<ActorId>,
    pub bounds: Cuboid,
    pub capacity: u64,
    pub public: Vec<Capability>,
    pub member_configurable: Vec<Capability>,
}

impl From<&Land> for LandInfo {
    fn from(land: &Land) -> Self {
        Self {
            name: land.name.clone(),
            owner: land.owner.clone(),
            dimension: land.dimension.clone(),
            members: land.members.iter().cloned().collect(),
            bounds: land.cuboid(),
            capacity: land.capacity(),
            public: land.public_auth.allowed().collect(),
            member_configurable: land.config_public_auth.allowed().collect(),
        }
    }
}

pub struct LandManager {
    lands: Arc<LandRepository>,
    metrics: Arc<Metrics>,
}

impl LandManager {
    pub fn new(lands: Arc<LandRepository>, metrics: Arc<Metrics>) -> Self {
        Self { lands, metrics }
    }

    fn load(&self, name: &str) -> Result<Land, ManageError> {
        self.lands
            .get(name)
            .ok_or_else(|| ManageError::NotFound(name.to_string()))
    }

    fn load_as_administrator(&self, actor: &Actor, name: &str, action: &'static str) -> Result<Land, ManageError> {
        let land = self.load(name)?;
        if !Role::of(actor, &land).is_administrative() {
            return Err(ManageError::NotAdministrator(action));
        }
        Ok(land)
    }

    // ── Members ─────────────────────────────────────────────────────────

    pub fn add_member(&self, actor: &Actor, name: &str, member: ActorId) -> Result<Land, ManageError> {
        let land = self.load_as_administrator(actor, name, "add members")?;
        if land.is_owner(&member) {
            return Err(ManageError::AlreadyOwner(member));
        }
        let mut members = land.members;
        if !members.insert(member.clone()) {
            return Err(ManageError::AlreadyMember(member));
        }
        let land = self.lands.set_members(name, members)?;
        tracing::info!("{} added {} to land '{}'", actor.id, member, name);
        Ok(land)
    }

    pub fn remove_member(&self, actor: &Actor, name: &str, member: &ActorId) -> Result<Land, ManageError> {
        let land = self.load_as_administrator(actor, name, "remove members")?;
        let mut members = land.members;
        if !members.shift_remove(member) {
            return Err(ManageError::NotMember(member.clone()));
        }
        let land = self.lands.set_members(name, members)?;
        tracing::info!("{} removed {} from land '{}'", actor.id, member, name);
        Ok(land)
    }

    // ── Ownership ───────────────────────────────────────────────────────

    pub fn transfer(&self, actor: &Actor, name: &str, new_owner: ActorId) -> Result<Land, ManageError> {
        let land = self.load_as_administrator(actor, name, "transfer ownership")?;
        if land.is_owner(&new_owner) {
            return Err(ManageError::AlreadyOwner(new_owner));
        }
        let land = self.lands.transfer_owner(name, new_owner)?;
        tracing::info!("Land '{}' transferred to {} by {}", name, land.owner, actor.id);
        Ok(land)
    }

    pub fn delete(&self, actor: &Actor, name: &str) -> Result<Land, ManageError> {
        self.load_as_administrator(actor, name, "delete the land")?;
        let land = self.lands.delete(name)?;
        self.metrics.land_deleted();
        tracing::info!("Land '{}' deleted by {}", name, actor.id);
        Ok(land)
    }

    // ── Flags ───────────────────────────────────────────────────────────

    /// Toggle what the public may do. Members need the matching
    /// `config_public_auth` entry.
    pub fn set_public_flag(
        &self,
        actor: &Actor,
        name: &str,
        capability: Capability,
        allowed: bool,
    ) -> Result<Land, ManageError> {
        let land = self.load(name)?;
        if !can_configure(actor, &land, capability) {
            return Err(ManageError::NotPermitted(capability));
        }
        let flags = land.public_auth.with(capability, allowed);
        let land = self.lands.set_public_auth(name, flags)?;
        tracing::debug!("{} set {}={} on land '{}'", actor.id, capability, allowed, name);
        Ok(land)
    }

    /// Toggle which public flags members may edit.
    pub fn set_config_flag(
        &self,
        actor: &Actor,
        name: &str,
        capability: Capability,
        allowed: bool,
    ) -> Result<Land, ManageError> {
        let land = self.load_as_administrator(actor, name, "change member permissions")?;
        let flags = land.config_public_auth.with(capability, allowed);
        Ok(self.lands.set_config_public_auth(name, flags)?)
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    pub fn info(&self, name: &str) -> Option<LandInfo> {
        self.lands.get(name).as_ref().map(LandInfo::from)
    }

    pub fn lands_of(&self, owner: &ActorId) -> Vec<LandInfo> {
        self.lands.list_by_owner(owner).iter().map(LandInfo::from).collect()
    }

    pub fn land_at(&self, dimension: &DimensionId, location: Location) -> Option<LandInfo> {
        self.lands.with_land_at(dimension, location, |land| LandInfo::from(land))
    }
}
