//! Claim workflow: validate, price, confirm, commit.
//!
//! ```text
//! Validating ──▶ PricingConfirmPending ──▶ Committed
//!      │                   │
//!      └────────▶ Aborted ◀┘
//! ```
//!
//! The confirmation prompt is the only suspension point. Validation is run
//! once up front and again at commit, so a land created (or a quota filled)
//! while the player was reading the prompt still aborts the claim before any
//! money moves.

use std::fmt::Write as _;
use std::sync::Arc;

use claim_engine::error::RepositoryError;
use claim_engine::land::{Actor, ActorId, Land};
use claim_engine::repository::{LandRepository, RegistryView};
use claim_engine::world::position::{BlockPos, DimensionId};
use thiserror::Error;

use crate::config::{LimitsConfig, Messages, render};
use crate::dashboard::Metrics;
use crate::host::{ConfirmPrompt, Dialog, DialogResponse, Economy, Notifier};
use crate::marking::MarkBook;

#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub actor: Actor,
    pub name: String,
    pub dimension: DimensionId,
    pub start: BlockPos,
    pub end: BlockPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPhase {
    Validating,
    PricingConfirmPending,
    Committed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub capacity: u64,
    pub price: u64,
}

/// A claim that passed validation, with the land it would create.
#[derive(Debug, Clone)]
pub struct PendingClaim {
    pub request: ClaimRequest,
    pub land: Land,
    pub quote: Quote,
    pub phase: ClaimPhase,
}

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("land name cannot be empty")]
    EmptyName,

    #[error("a land named '{0}' already exists")]
    DuplicateName(String),

    #[error("the corners must differ on every axis")]
    Degenerate,

    #[error("overlaps existing land: {}", describe_conflicts(.conflicts))]
    Overlap { conflicts: Vec<(String, ActorId)> },

    #[error("you already own {owned} lands (limit {limit})")]
    QuotaExceeded { owned: usize, limit: usize },

    #[error("a claim of {capacity} blocks exceeds the limit of {limit}")]
    TooLarge { capacity: u64, limit: u64 },

    #[error("claim cancelled")]
    Cancelled,

    #[error("another form is already open")]
    DialogBusy,

    #[error("this claim costs {price} but your balance is {balance}")]
    InsufficientFunds { price: u64, balance: u64 },

    #[error("the payment of {0} could not be taken")]
    DebitFailed(u64),

    #[error("mark both corners with the marking tool first")]
    IncompleteMark,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn describe_conflicts(conflicts: &[(String, ActorId)]) -> String {
    let mut text = String::new();
    for (i, (name, owner)) in conflicts.iter().enumerate() {
        if i > 0 {
            text.push_str(", ");
        }
        let _ = write!(text, "{name} (owned by {owner})");
    }
    text
}

pub struct ClaimWorkflow {
    lands: Arc<LandRepository>,
    economy: Option<Arc<dyn Economy>>,
    dialog: Arc<dyn Dialog>,
    notifier: Arc<dyn Notifier>,
    marks: Arc<MarkBook>,
    metrics: Arc<Metrics>,
    limits: LimitsConfig,
    messages: Messages,
}

impl ClaimWorkflow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lands: Arc<LandRepository>,
        economy: Option<Arc<dyn Economy>>,
        dialog: Arc<dyn Dialog>,
        notifier: Arc<dyn Notifier>,
        marks: Arc<MarkBook>,
        metrics: Arc<Metrics>,
        limits: LimitsConfig,
        messages: Messages,
    ) -> Self {
        Self {
            lands,
            economy,
            dialog,
            notifier,
            marks,
            metrics,
            limits,
            messages,
        }
    }

    // ── Validating ──────────────────────────────────────────────────────

    /// Run every check against the current registry. Nothing is written.
    pub fn validate(&self, request: &ClaimRequest) -> Result<PendingClaim, ClaimError> {
        self.lands.inspect(|registry| self.check(registry, request))
    }

    fn check(&self, registry: &RegistryView<'_>, request: &ClaimRequest) -> Result<PendingClaim, ClaimError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ClaimError::EmptyName);
        }
        if registry.exists(name) {
            return Err(ClaimError::DuplicateName(name.to_string()));
        }

        let land = Land::new(
            name,
            request.actor.id.clone(),
            request.dimension.clone(),
            request.start,
            request.end,
        );
        if land.cuboid().is_degenerate() {
            return Err(ClaimError::Degenerate);
        }

        let conflicts: Vec<(String, ActorId)> = registry
            .overlaps_with(&land)
            .into_iter()
            .map(|other| (other.name, other.owner))
            .collect();
        if !conflicts.is_empty() {
            return Err(ClaimError::Overlap { conflicts });
        }

        if !request.actor.admin {
            let owned = registry.count_by_owner(&request.actor.id);
            if owned >= self.limits.max_claims_per_player {
                return Err(ClaimError::QuotaExceeded {
                    owned,
                    limit: self.limits.max_claims_per_player,
                });
            }
        }

        let capacity = land.capacity();
        if capacity > self.limits.max_claim_volume {
            return Err(ClaimError::TooLarge {
                capacity,
                limit: self.limits.max_claim_volume,
            });
        }

        Ok(PendingClaim {
            request: request.clone(),
            land,
            quote: self.quote(capacity),
            phase: ClaimPhase::Validating,
        })
    }

    pub fn quote(&self, capacity: u64) -> Quote {
        let price = self
            .economy
            .as_ref()
            .map_or(0, |economy| economy.price_for_volume(capacity));
        Quote { capacity, price }
    }

    // ── PricingConfirmPending ───────────────────────────────────────────

    /// Ask the player to confirm the price. Without an economy the claim is
    /// free and confirmed without asking.
    pub async fn confirm(&self, pending: &mut PendingClaim) -> Result<(), ClaimError> {
        pending.phase = ClaimPhase::PricingConfirmPending;
        let Some(economy) = &self.economy else {
            return Ok(());
        };

        let actor = &pending.request.actor.id;
        let balance = economy.balance(actor);
        let price = pending.quote.price.to_string();
        let prompt = ConfirmPrompt {
            title: pending.land.name.clone(),
            body: format!(
                "{}\nBalance: {}",
                render(&self.messages.claim_prompt, &[
                    ("name", pending.land.name.as_str()),
                    ("price", price.as_str()),
                ]),
                balance
            ),
        };

        let answer = match self.dialog.confirm(actor, prompt).await {
            Ok(DialogResponse::Confirmed) => Ok(()),
            Ok(DialogResponse::Busy) => Err(ClaimError::DialogBusy),
            Ok(DialogResponse::Cancelled) | Err(_) => Err(ClaimError::Cancelled),
        };
        if answer.is_err() {
            pending.phase = ClaimPhase::Aborted;
        }
        answer
    }

    // ── Committed ───────────────────────────────────────────────────────

    /// Re-validate, take payment and write the land. The checks run once more
    /// under the registry's write lock together with the insert; if they fail
    /// there, or the write itself fails, the payment is refunded.
    pub fn commit(&self, pending: &mut PendingClaim) -> Result<Land, ClaimError> {
        match self.settle(&pending.request) {
            Ok(fresh) => {
                let land = fresh.land.clone();
                *pending = PendingClaim {
                    phase: ClaimPhase::Committed,
                    ..fresh
                };
                Ok(land)
            }
            Err(e) => {
                pending.phase = ClaimPhase::Aborted;
                Err(e)
            }
        }
    }

    fn settle(&self, request: &ClaimRequest) -> Result<PendingClaim, ClaimError> {
        let fresh = self.validate(request)?;
        let actor = &request.actor.id;
        let price = fresh.quote.price;
        let economy = self.economy.as_ref().filter(|_| price > 0);

        if let Some(economy) = economy {
            let balance = economy.balance(actor);
            if balance < price {
                return Err(ClaimError::InsufficientFunds { price, balance });
            }
            if !economy.debit(actor, price, "land claim") {
                return Err(ClaimError::DebitFailed(price));
            }
        }

        let written = self
            .lands
            .create_checked(fresh.land.clone(), |registry| self.check(registry, request).map(|_| ()));
        if let Err(e) = written {
            if let Some(economy) = economy {
                economy.credit(actor, price, "land claim refund");
            }
            match &e {
                ClaimError::Repository(inner) => {
                    tracing::error!("Writing land '{}' failed: {}", fresh.land.name, inner)
                }
                _ => tracing::warn!("Land '{}' lost a race at commit: {}", fresh.land.name, e),
            }
            return Err(e);
        }

        self.marks.clear(actor);
        self.metrics.claim_created();
        self.notifier.message(
            actor,
            &render(&self.messages.claim_created, &[("name", fresh.land.name.as_str())]),
        );
        tracing::info!(
            "Land '{}' claimed by {} ({} blocks, paid {})",
            fresh.land.name,
            actor,
            fresh.quote.capacity,
            price
        );
        Ok(fresh)
    }

    /// Drive a request through the whole workflow.
    pub async fn submit(&self, request: ClaimRequest) -> Result<Land, ClaimError> {
        let result = self.run(&request).await;
        if let Err(e) = &result {
            self.metrics.claim_aborted();
            tracing::warn!("Claim '{}' by {} aborted: {}", request.name, request.actor.id, e);
        }
        result
    }

    async fn run(&self, request: &ClaimRequest) -> Result<Land, ClaimError> {
        let mut pending = self.validate(request)?;
        self.confirm(&mut pending).await?;
        self.commit(&mut pending)
    }

    /// Claim the box the actor selected with the marking tool.
    pub async fn claim_from_mark(&self, actor: &Actor, name: &str) -> Result<Land, ClaimError> {
        let mark = self.marks.get(&actor.id).ok_or(ClaimError::IncompleteMark)?;
        let (start, end) = mark.corners().ok_or(ClaimError::IncompleteMark)?;
        self.submit(ClaimRequest {
            actor: actor.clone(),
            name: name.to_string(),
            dimension: mark.dimension,
            start,
            end,
        })
        .await
    }
}
