// Lifecycle engine - validate, guard, commit, audit and announce
//
// Every mutating operation follows the same path:
//   payload validation -> actor resolution -> guard decision
//   -> conditional write (audit entry in the same transaction)
//   -> post-commit notification on a background task

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use super::errors::GatepassError;
use super::guard::TransitionGuard;
use super::traits::{ActorResolver, Clock, GatepassStore, NotificationSink, SystemClock};
use super::types::*;
use super::validation::{
    normalize_fields, normalize_items, validate_decline_reason, validate_fields, validate_items,
};
use crate::config::LifecycleConfig;
use crate::notify::NotificationDispatcher;
use crate::storage::SqliteGatepassStore;
use crate::telemetry::{create_lifecycle_span, generate_correlation_id};

/// Attempts at drawing an unused gatepass number before giving up
pub const MAX_NUMBER_ATTEMPTS: usize = 5;

/// Longest late-decline window accepted from configuration (100 years)
const MAX_WINDOW_SECS: u64 = 100 * 365 * 24 * 3600;

/// Build a gatepass number: `{prefix}-{YYYYMMDD}-{NNNNNN}`
pub fn generate_number(prefix: &str, at: DateTime<Utc>) -> String {
    let serial: u32 = rand::rng().random_range(0..1_000_000);
    format!("{prefix}-{}-{serial:06}", at.format("%Y%m%d"))
}

#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn GatepassStore>,
    actors: Arc<dyn ActorResolver>,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    guard: TransitionGuard,
    number_prefix: String,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn GatepassStore>,
        actors: Arc<dyn ActorResolver>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let notifier = NotificationDispatcher::new(sink, Arc::clone(&actors));
        Self {
            store,
            actors,
            notifier,
            clock: Arc::new(SystemClock),
            guard: TransitionGuard::default(),
            number_prefix: LifecycleConfig::default().number_prefix,
        }
    }

    /// Engine backed by one SQLite store acting as both record store and
    /// actor directory
    pub fn for_sqlite(store: SqliteGatepassStore, sink: Arc<dyn NotificationSink>) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store, sink)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_guard(mut self, guard: TransitionGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_number_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.number_prefix = prefix.into();
        self
    }

    pub fn with_config(self, config: &LifecycleConfig) -> Self {
        let secs = config.late_decline_window_seconds.min(MAX_WINDOW_SECS) as i64;
        self.with_guard(TransitionGuard::new(Duration::seconds(secs)))
            .with_number_prefix(config.number_prefix.clone())
    }

    pub fn guard(&self) -> &TransitionGuard {
        &self.guard
    }

    /// Create a pending gatepass with its item lines. Only active accounts
    /// with the user role may request one.
    pub async fn create_gatepass(
        &self,
        creator_id: UserId,
        fields: &GatepassFields,
        items: &[ItemLine],
    ) -> Result<Gatepass, GatepassError> {
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span(
            "create",
            Some(creator_id),
            None,
            Some(correlation_id.as_str()),
        );

        async move {
            let fields = normalize_fields(fields);
            let items = normalize_items(items);
            validate_fields(&fields)?;
            validate_items(&items)?;

            let actor = self.actors.resolve(creator_id).await?;
            if !actor.active {
                return Err(GatepassError::forbidden("account is not active"));
            }
            if actor.role != Role::User {
                return Err(GatepassError::forbidden(format!(
                    "creating a gatepass requires the user role (caller is {})",
                    actor.role
                )));
            }

            let now = self.clock.now();
            let mut attempt = 0;
            let (id, number) = loop {
                attempt += 1;
                let number = generate_number(&self.number_prefix, now);
                let audit = NewAuditEntry {
                    actor_id: Some(actor.id),
                    action: AuditAction::CreateGatepass,
                    gatepass_id: None,
                    detail: format!(
                        "Gatepass {number} created: {} -> {}, {} item(s)",
                        fields.from_location,
                        fields.to_location,
                        items.len()
                    ),
                    at: now,
                };

                match self
                    .store
                    .insert_gatepass(&number, actor.id, &fields, &items, &audit, now)
                    .await
                {
                    Ok(id) => break (id, number),
                    Err(e) if e.is_unique_violation() && attempt < MAX_NUMBER_ATTEMPTS => {
                        debug!(gatepass.number = %number, attempt, "Gatepass number taken, drawing another");
                    }
                    Err(e) => return Err(e),
                }
            };

            info!(gatepass.id = id, gatepass.number = %number, "Gatepass created");
            self.notifier.dispatch(NotificationPlan {
                event_type: NotificationKind::GatepassCreated,
                gatepass_id: id,
                gatepass_number: number,
                new_state: GatepassState::Pending,
                recipients: vec![actor.id],
                pools: vec![Role::Admin],
            });

            self.get_gatepass(id).await
        }
        .instrument(span)
        .await
    }

    pub async fn approve_as_admin(
        &self,
        actor_id: UserId,
        gatepass_id: GatepassId,
    ) -> Result<TransitionOutcome, GatepassError> {
        let actor = self.actors.resolve(actor_id).await?;
        self.execute(&actor, gatepass_id, Action::ApproveAdmin, None)
            .await
    }

    pub async fn approve_as_security(
        &self,
        actor_id: UserId,
        gatepass_id: GatepassId,
    ) -> Result<TransitionOutcome, GatepassError> {
        let actor = self.actors.resolve(actor_id).await?;
        self.execute(&actor, gatepass_id, Action::ApproveSecurity, None)
            .await
    }

    pub async fn decline(
        &self,
        actor_id: UserId,
        gatepass_id: GatepassId,
        reason: &str,
    ) -> Result<TransitionOutcome, GatepassError> {
        validate_decline_reason(reason)?;
        let actor = self.actors.resolve(actor_id).await?;
        let action = Action::Decline {
            reason: reason.to_string(),
        };
        self.execute(&actor, gatepass_id, action, None).await
    }

    /// Replace the fields and item set of a pending gatepass
    pub async fn edit_pending(
        &self,
        actor_id: UserId,
        gatepass_id: GatepassId,
        fields: &GatepassFields,
        items: &[ItemLine],
    ) -> Result<Gatepass, GatepassError> {
        let payload = EditPayload {
            fields: normalize_fields(fields),
            items: normalize_items(items),
        };
        validate_fields(&payload.fields)?;
        validate_items(&payload.items)?;

        let actor = self.actors.resolve(actor_id).await?;
        self.execute(&actor, gatepass_id, Action::Edit, Some(&payload))
            .await?;
        self.get_gatepass(gatepass_id).await
    }

    /// Run one action for an already-resolved actor.
    ///
    /// Fails without writing anything when the payload is invalid, the actor
    /// may not act, or the gatepass is not in the state the action needs.
    /// When two callers race, exactly one write lands; the loser gets
    /// `WrongState`.
    pub async fn execute(
        &self,
        actor: &ActorToken,
        gatepass_id: GatepassId,
        action: Action,
        payload: Option<&EditPayload>,
    ) -> Result<TransitionOutcome, GatepassError> {
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span(
            action.name(),
            Some(actor.id),
            Some(gatepass_id),
            Some(correlation_id.as_str()),
        );

        async move {
            let payload = match (&action, payload) {
                (Action::Edit, Some(payload)) => {
                    let payload = EditPayload {
                        fields: normalize_fields(&payload.fields),
                        items: normalize_items(&payload.items),
                    };
                    validate_fields(&payload.fields)?;
                    validate_items(&payload.items)?;
                    Some(payload)
                }
                (Action::Edit, None) => {
                    return Err(GatepassError::validation(
                        "an edit needs the new fields and items",
                    ))
                }
                (Action::ApproveAdmin | Action::ApproveSecurity | Action::Decline { .. }, _) => {
                    None
                }
            };

            let view = self
                .store
                .load_guard_view(gatepass_id)
                .await?
                .ok_or_else(|| GatepassError::NotFound(gatepass_id.to_string()))?;

            let decision = self
                .guard
                .decide(&view, actor, &action, self.clock.now())
                .inspect_err(|e| info!(kind = e.kind(), reason = %e, "Transition rejected"))?;

            let audit = NewAuditEntry {
                actor_id: Some(decision.stamp.actor()),
                action: audit_action(&decision.stamp),
                gatepass_id: Some(gatepass_id),
                detail: describe(&view, &decision),
                at: decision.stamp.at(),
            };

            let committed = match &payload {
                Some(payload) => {
                    self.store
                        .replace_pending(
                            gatepass_id,
                            &decision,
                            &payload.fields,
                            &payload.items,
                            &audit,
                        )
                        .await?
                }
                None => {
                    self.store
                        .apply_transition(gatepass_id, &decision, &audit)
                        .await?
                }
            };

            if !committed {
                return Err(self.lost_race(&view, &decision).await);
            }

            info!(
                gatepass.number = %view.gatepass_number,
                from = %view.state,
                to = %decision.next,
                "Gatepass transition committed"
            );
            self.notifier.dispatch(plan_for(&view, &decision));

            Ok(TransitionOutcome {
                gatepass_id,
                gatepass_number: view.gatepass_number,
                previous_state: view.state,
                new_state: decision.next,
                at: decision.stamp.at(),
            })
        }
        .instrument(span)
        .await
    }

    /// Explain a conditional write that matched no row
    async fn lost_race(&self, view: &GuardView, decision: &Decision) -> GatepassError {
        let current = match self.store.load_guard_view(view.id).await {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "Could not re-read gatepass after a lost race");
                None
            }
        };
        warn!(
            gatepass.number = %view.gatepass_number,
            expected = %decision.expected,
            actual = ?current.as_ref().map(|c| c.state),
            "Gatepass changed before the write landed"
        );

        match (current, decision.window_floor) {
            // Same state but the window predicate failed: the window closed.
            (Some(current), Some(_)) if current.state == decision.expected => {
                match current.security_approved_at {
                    Some(approved_at) => GatepassError::WindowExpired {
                        gatepass: view.gatepass_number.clone(),
                        approved_at,
                    },
                    None => GatepassError::WrongState {
                        gatepass: view.gatepass_number.clone(),
                        expected: GatepassState::Pending,
                        actual: Some(current.state),
                    },
                }
            }
            (current, _) => GatepassError::WrongState {
                gatepass: view.gatepass_number.clone(),
                expected: decision.expected,
                actual: current.map(|c| c.state),
            },
        }
    }

    pub async fn get_gatepass(&self, id: GatepassId) -> Result<Gatepass, GatepassError> {
        self.store
            .find_gatepass(id)
            .await?
            .ok_or_else(|| GatepassError::NotFound(id.to_string()))
    }

    pub async fn find_by_number(&self, number: &str) -> Result<Gatepass, GatepassError> {
        self.store
            .find_by_number(number.trim())
            .await?
            .ok_or_else(|| GatepassError::NotFound(number.trim().to_string()))
    }

    pub async fn list_gatepasses(
        &self,
        filter: &GatepassFilter,
    ) -> Result<Vec<Gatepass>, GatepassError> {
        self.store.list_gatepasses(filter).await
    }

    pub async fn audit_trail(
        &self,
        gatepass_id: Option<GatepassId>,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, GatepassError> {
        self.store.audit_trail(gatepass_id, limit).await
    }
}

impl std::fmt::Debug for LifecycleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEngine")
            .field("guard", &self.guard)
            .field("number_prefix", &self.number_prefix)
            .finish_non_exhaustive()
    }
}

fn audit_action(stamp: &Stamp) -> AuditAction {
    match stamp {
        Stamp::AdminApproval { .. } => AuditAction::ApproveAdmin,
        Stamp::SecurityApproval { .. } => AuditAction::ApproveSecurity,
        Stamp::Decline { .. } => AuditAction::DeclineGatepass,
        Stamp::Edit { .. } => AuditAction::EditGatepass,
    }
}

fn describe(view: &GuardView, decision: &Decision) -> String {
    let number = &view.gatepass_number;
    match &decision.stamp {
        Stamp::AdminApproval { .. } => format!("Gatepass {number} approved by admin"),
        Stamp::SecurityApproval { .. } => format!("Gatepass {number} approved by security"),
        Stamp::Decline { reason, .. } if decision.window_floor.is_some() => {
            format!("Gatepass {number} declined after security approval: {reason}")
        }
        Stamp::Decline { reason, .. } => format!("Gatepass {number} declined: {reason}"),
        Stamp::Edit { .. } => format!("Gatepass {number} edited"),
    }
}

/// Who hears about a committed change
fn plan_for(view: &GuardView, decision: &Decision) -> NotificationPlan {
    let (event_type, recipients, pools) = match &decision.stamp {
        Stamp::AdminApproval { .. } => (
            NotificationKind::ApprovedByAdmin,
            vec![view.created_by],
            vec![Role::Security],
        ),
        Stamp::SecurityApproval { .. } => {
            let mut recipients = vec![view.created_by];
            recipients.extend(view.admin_approved_by);
            (NotificationKind::ApprovedBySecurity, recipients, vec![])
        }
        Stamp::Decline { .. } => (
            NotificationKind::GatepassDeclined,
            vec![view.created_by],
            vec![],
        ),
        Stamp::Edit { .. } => (
            NotificationKind::GatepassEdited,
            vec![view.created_by],
            vec![Role::Admin],
        ),
    };

    NotificationPlan {
        event_type,
        gatepass_id: view.id,
        gatepass_number: view.gatepass_number.clone(),
        new_state: decision.next,
        recipients,
        pools,
    }
}
