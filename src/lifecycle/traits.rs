// Traits for dependency injection - the engine only sees these seams

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::GatepassError;
use super::types::*;

/// Persistent store of gatepasses, their items and the audit trail.
///
/// Every mutating method is atomic. The transition methods are conditional
/// writes: they report `false` when the persisted state no longer matches
/// the expectation, and in that case nothing (audit entry included) is
/// written.
#[async_trait]
pub trait GatepassStore: Send + Sync {
    /// Insert a pending gatepass with its items and creation audit entry.
    async fn insert_gatepass(
        &self,
        gatepass_number: &str,
        created_by: UserId,
        fields: &GatepassFields,
        items: &[ItemLine],
        audit: &NewAuditEntry,
        at: DateTime<Utc>,
    ) -> Result<GatepassId, GatepassError>;

    /// Minimal state for the transition guard
    async fn load_guard_view(&self, id: GatepassId) -> Result<Option<GuardView>, GatepassError>;

    /// Set `state = decision.next` plus attribution where the row is still in
    /// `decision.expected`. Returns whether the row was changed.
    async fn apply_transition(
        &self,
        id: GatepassId,
        decision: &Decision,
        audit: &NewAuditEntry,
    ) -> Result<bool, GatepassError>;

    /// Replace fields and the whole item set of a gatepass that is still in
    /// `decision.expected`. Returns whether the row was changed.
    async fn replace_pending(
        &self,
        id: GatepassId,
        decision: &Decision,
        fields: &GatepassFields,
        items: &[ItemLine],
        audit: &NewAuditEntry,
    ) -> Result<bool, GatepassError>;

    async fn find_gatepass(&self, id: GatepassId) -> Result<Option<Gatepass>, GatepassError>;

    async fn find_by_number(&self, number: &str) -> Result<Option<Gatepass>, GatepassError>;

    async fn list_gatepasses(&self, filter: &GatepassFilter)
        -> Result<Vec<Gatepass>, GatepassError>;

    async fn audit_trail(
        &self,
        gatepass_id: Option<GatepassId>,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, GatepassError>;
}

/// Resolves who is calling. Session and login mechanics live outside.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ActorResolver: Send + Sync {
    /// Capability token for `actor_id`; unknown actors are `Forbidden`.
    async fn resolve(&self, actor_id: UserId) -> Result<ActorToken, GatepassError>;

    /// Ids of every active user holding `role`
    async fn active_pool(&self, role: Role) -> Result<Vec<UserId>, GatepassError>;
}

/// Receives post-commit events. Delivery (push, email, SMS) is the sink's
/// business; a failing sink never affects the transition that produced the
/// event.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, event: &NotificationEvent) -> anyhow::Result<()>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
