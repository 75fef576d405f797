// Transition guard - pure decision logic for the gatepass state machine
//
// States: pending -> approved_by_admin -> approved_by_security
//         pending -> declined
//         approved_by_admin -> declined, only inside the late-decline window
//
// The guard never touches storage. Its answer is advisory: the conditional
// write in the store is what actually settles a race.

use chrono::{DateTime, Duration, Utc};

use super::errors::GatepassError;
use super::types::{Action, ActorToken, Decision, GatepassState, GuardView, Role, Stamp};
use super::validation::validate_decline_reason;

/// Default width of the late-decline window
pub const DEFAULT_LATE_DECLINE_WINDOW_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy)]
pub struct TransitionGuard {
    late_decline_window: Duration,
}

impl Default for TransitionGuard {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_LATE_DECLINE_WINDOW_SECS))
    }
}

impl TransitionGuard {
    pub fn new(late_decline_window: Duration) -> Self {
        Self {
            late_decline_window,
        }
    }

    pub fn late_decline_window(&self) -> Duration {
        self.late_decline_window
    }

    /// Decide whether `actor` may apply `action` to `record` at `now`.
    ///
    /// Checks run payload first, then actor, then state, so a malformed
    /// request or a wrong role is reported the same way whatever state the
    /// record happens to be in.
    pub fn decide(
        &self,
        record: &GuardView,
        actor: &ActorToken,
        action: &Action,
        now: DateTime<Utc>,
    ) -> Result<Decision, GatepassError> {
        if let Action::Decline { reason } = action {
            validate_decline_reason(reason)?;
        }

        if !actor.active {
            return Err(GatepassError::forbidden("account is not active"));
        }

        match action {
            Action::ApproveAdmin => {
                require_role(actor, Role::Admin, "admin approval")?;
                self.approve_admin(record, actor, now)
            }
            Action::ApproveSecurity => {
                require_role(actor, Role::Security, "security approval")?;
                self.approve_security(record, actor, now)
            }
            Action::Decline { reason } => {
                require_role(actor, Role::Admin, "declining")?;
                self.decline(record, actor, reason, now)
            }
            Action::Edit => {
                if actor.role != Role::Admin && actor.id != record.created_by {
                    return Err(GatepassError::forbidden(
                        "only the creator or an admin may edit a gatepass",
                    ));
                }
                self.edit(record, actor, now)
            }
        }
    }

    fn approve_admin(
        &self,
        record: &GuardView,
        actor: &ActorToken,
        now: DateTime<Utc>,
    ) -> Result<Decision, GatepassError> {
        match record.state {
            GatepassState::Pending => Ok(Decision {
                expected: GatepassState::Pending,
                next: GatepassState::ApprovedByAdmin,
                stamp: Stamp::AdminApproval { by: actor.id, at: now },
                window_floor: None,
            }),
            GatepassState::ApprovedByAdmin
            | GatepassState::ApprovedBySecurity
            | GatepassState::Declined => Err(wrong_state(record, GatepassState::Pending)),
        }
    }

    fn approve_security(
        &self,
        record: &GuardView,
        actor: &ActorToken,
        now: DateTime<Utc>,
    ) -> Result<Decision, GatepassError> {
        match record.state {
            GatepassState::ApprovedByAdmin => Ok(Decision {
                expected: GatepassState::ApprovedByAdmin,
                next: GatepassState::ApprovedBySecurity,
                stamp: Stamp::SecurityApproval { by: actor.id, at: now },
                window_floor: None,
            }),
            GatepassState::Pending
            | GatepassState::ApprovedBySecurity
            | GatepassState::Declined => Err(wrong_state(record, GatepassState::ApprovedByAdmin)),
        }
    }

    fn decline(
        &self,
        record: &GuardView,
        actor: &ActorToken,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Decision, GatepassError> {
        let stamp = Stamp::Decline {
            by: actor.id,
            at: now,
            reason: reason.trim().to_string(),
        };

        match record.state {
            GatepassState::Pending => Ok(Decision {
                expected: GatepassState::Pending,
                next: GatepassState::Declined,
                stamp,
                window_floor: None,
            }),
            GatepassState::ApprovedByAdmin => match record.security_approved_at {
                // Without a security approval timestamp the exception does not apply.
                None => Err(wrong_state(record, GatepassState::Pending)),
                Some(approved_at) => {
                    let floor = now - self.late_decline_window;
                    if approved_at < floor {
                        return Err(GatepassError::WindowExpired {
                            gatepass: record.gatepass_number.clone(),
                            approved_at,
                        });
                    }
                    Ok(Decision {
                        expected: GatepassState::ApprovedByAdmin,
                        next: GatepassState::Declined,
                        stamp,
                        window_floor: Some(floor),
                    })
                }
            },
            GatepassState::ApprovedBySecurity | GatepassState::Declined => {
                Err(wrong_state(record, GatepassState::Pending))
            }
        }
    }

    fn edit(
        &self,
        record: &GuardView,
        actor: &ActorToken,
        now: DateTime<Utc>,
    ) -> Result<Decision, GatepassError> {
        match record.state {
            GatepassState::Pending => Ok(Decision {
                expected: GatepassState::Pending,
                next: GatepassState::Pending,
                stamp: Stamp::Edit { by: actor.id, at: now },
                window_floor: None,
            }),
            GatepassState::ApprovedByAdmin
            | GatepassState::ApprovedBySecurity
            | GatepassState::Declined => Err(wrong_state(record, GatepassState::Pending)),
        }
    }
}

fn require_role(actor: &ActorToken, role: Role, what: &str) -> Result<(), GatepassError> {
    if actor.role != role {
        return Err(GatepassError::forbidden(format!(
            "{what} requires the {role} role (caller is {})",
            actor.role
        )));
    }
    Ok(())
}

fn wrong_state(record: &GuardView, expected: GatepassState) -> GatepassError {
    GatepassError::WrongState {
        gatepass: record.gatepass_number.clone(),
        expected,
        actual: Some(record.state),
    }
}
