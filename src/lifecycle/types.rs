// Core types for the gatepass lifecycle

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type GatepassId = i64;
pub type UserId = i64;

/// Workflow state of a gatepass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatepassState {
    /// Created and waiting for an administrator
    Pending,
    /// Approved by an administrator, waiting for security
    ApprovedByAdmin,
    /// Approved by security; the gatepass is valid
    ApprovedBySecurity,
    /// Declined; the gatepass will never become valid
    Declined,
}

impl GatepassState {
    pub const ALL: [GatepassState; 4] = [
        GatepassState::Pending,
        GatepassState::ApprovedByAdmin,
        GatepassState::ApprovedBySecurity,
        GatepassState::Declined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GatepassState::Pending => "pending",
            GatepassState::ApprovedByAdmin => "approved_by_admin",
            GatepassState::ApprovedBySecurity => "approved_by_security",
            GatepassState::Declined => "declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            GatepassState::Pending | GatepassState::ApprovedByAdmin => false,
            GatepassState::ApprovedBySecurity | GatepassState::Declined => true,
        }
    }

    /// Position along the approval chain. Declined sits beyond every other
    /// state so that any move into it counts as forward progress.
    pub fn rank(&self) -> u8 {
        match self {
            GatepassState::Pending => 0,
            GatepassState::ApprovedByAdmin => 1,
            GatepassState::ApprovedBySecurity => 2,
            GatepassState::Declined => 3,
        }
    }
}

impl fmt::Display for GatepassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for GatepassState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GatepassState::Pending),
            "approved_by_admin" => Ok(GatepassState::ApprovedByAdmin),
            "approved_by_security" => Ok(GatepassState::ApprovedBySecurity),
            "declined" => Ok(GatepassState::Declined),
            other => Err(format!("unknown gatepass state '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Superadmin,
    Admin,
    Security,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Security => "security",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "security" => Ok(Role::Security),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "pending" => Ok(UserStatus::Pending),
            other => Err(format!("unknown user status '{other}'")),
        }
    }
}

/// Capability token for the caller of an operation.
///
/// Resolved once per call from the actor id; the engine never consults any
/// ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorToken {
    pub id: UserId,
    pub role: Role,
    pub active: bool,
}

impl ActorToken {
    pub fn new(id: UserId, role: Role, active: bool) -> Self {
        Self { id, role, active }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn token(&self) -> ActorToken {
        ActorToken::new(self.id, self.role, self.status == UserStatus::Active)
    }
}

/// Route and content fields of a gatepass, editable only while pending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatepassFields {
    pub from_location: String,
    pub to_location: String,
    pub material_type: String,
    pub purpose: String,
    pub requested_for: NaiveDateTime,
}

/// Item line as supplied by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLine {
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
}

impl ItemLine {
    pub fn new(item_name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatepassItem {
    pub id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Full gatepass snapshot, as handed to rendering and reporting collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gatepass {
    pub id: GatepassId,
    pub gatepass_number: String,
    #[serde(flatten)]
    pub fields: GatepassFields,
    pub state: GatepassState,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub admin_approved_by: Option<UserId>,
    pub admin_approved_at: Option<DateTime<Utc>>,
    pub security_approved_by: Option<UserId>,
    pub security_approved_at: Option<DateTime<Utc>>,
    pub declined_by: Option<UserId>,
    pub declined_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub items: Vec<GatepassItem>,
}

impl Gatepass {
    /// Whether every attribution pair is set exactly when its stage was reached.
    pub fn attribution_consistent(&self) -> bool {
        let admin = self.admin_approved_by.is_some() && self.admin_approved_at.is_some();
        let admin_none = self.admin_approved_by.is_none() && self.admin_approved_at.is_none();
        let security = self.security_approved_by.is_some() && self.security_approved_at.is_some();
        let security_none =
            self.security_approved_by.is_none() && self.security_approved_at.is_none();
        let declined = self.declined_by.is_some()
            && self.declined_at.is_some()
            && self.decline_reason.is_some();
        let declined_none = self.declined_by.is_none()
            && self.declined_at.is_none()
            && self.decline_reason.is_none();

        match self.state {
            GatepassState::Pending => admin_none && security_none && declined_none,
            GatepassState::ApprovedByAdmin => admin && security_none && declined_none,
            GatepassState::ApprovedBySecurity => admin && security && declined_none,
            GatepassState::Declined => declined,
        }
    }
}

/// The minimal record state the guard needs. Advisory only: the conditional
/// write decides whether a transition actually happens.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardView {
    pub id: GatepassId,
    pub gatepass_number: String,
    pub state: GatepassState,
    pub created_by: UserId,
    pub admin_approved_by: Option<UserId>,
    pub security_approved_at: Option<DateTime<Utc>>,
}

/// A requested lifecycle action
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ApproveAdmin,
    ApproveSecurity,
    Decline { reason: String },
    Edit,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ApproveAdmin => "approve_admin",
            Action::ApproveSecurity => "approve_security",
            Action::Decline { .. } => "decline",
            Action::Edit => "edit",
        }
    }
}

/// Replacement content for an edit of a pending gatepass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPayload {
    pub fields: GatepassFields,
    pub items: Vec<ItemLine>,
}

/// Attribution columns written alongside a state change
#[derive(Debug, Clone, PartialEq)]
pub enum Stamp {
    AdminApproval { by: UserId, at: DateTime<Utc> },
    SecurityApproval { by: UserId, at: DateTime<Utc> },
    Decline { by: UserId, at: DateTime<Utc>, reason: String },
    Edit { by: UserId, at: DateTime<Utc> },
}

impl Stamp {
    pub fn actor(&self) -> UserId {
        match self {
            Stamp::AdminApproval { by, .. }
            | Stamp::SecurityApproval { by, .. }
            | Stamp::Decline { by, .. }
            | Stamp::Edit { by, .. } => *by,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Stamp::AdminApproval { at, .. }
            | Stamp::SecurityApproval { at, .. }
            | Stamp::Decline { at, .. }
            | Stamp::Edit { at, .. } => *at,
        }
    }
}

/// Guard output: everything the conditional write needs
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub expected: GatepassState,
    pub next: GatepassState,
    pub stamp: Stamp,
    /// When set, the write also requires `security_approved_at >= window_floor`.
    pub window_floor: Option<DateTime<Utc>>,
}

/// Result returned to callers of a committed transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub gatepass_id: GatepassId,
    pub gatepass_number: String,
    pub previous_state: GatepassState,
    pub new_state: GatepassState,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    CreateGatepass,
    ApproveAdmin,
    ApproveSecurity,
    DeclineGatepass,
    EditGatepass,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateGatepass => "create_gatepass",
            AuditAction::ApproveAdmin => "approve_admin",
            AuditAction::ApproveSecurity => "approve_security",
            AuditAction::DeclineGatepass => "decline_gatepass",
            AuditAction::EditGatepass => "edit_gatepass",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_gatepass" => Ok(AuditAction::CreateGatepass),
            "approve_admin" => Ok(AuditAction::ApproveAdmin),
            "approve_security" => Ok(AuditAction::ApproveSecurity),
            "decline_gatepass" => Ok(AuditAction::DeclineGatepass),
            "edit_gatepass" => Ok(AuditAction::EditGatepass),
            other => Err(format!("unknown audit action '{other}'")),
        }
    }
}

/// Audit entry waiting to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub actor_id: Option<UserId>,
    pub action: AuditAction,
    pub gatepass_id: Option<GatepassId>,
    pub detail: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub actor_id: Option<UserId>,
    pub action: AuditAction,
    pub gatepass_id: Option<GatepassId>,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    GatepassCreated,
    GatepassEdited,
    ApprovedByAdmin,
    ApprovedBySecurity,
    GatepassDeclined,
}

/// Post-commit event handed to the notification sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_type: NotificationKind,
    pub gatepass_id: GatepassId,
    pub gatepass_number: String,
    pub recipients: Vec<UserId>,
    pub new_state: GatepassState,
}

/// What to announce after a commit. Role pools are expanded into user ids
/// off the request path, just before delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPlan {
    pub event_type: NotificationKind,
    pub gatepass_id: GatepassId,
    pub gatepass_number: String,
    pub new_state: GatepassState,
    pub recipients: Vec<UserId>,
    pub pools: Vec<Role>,
}

/// Filter for listing gatepasses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatepassFilter {
    pub state: Option<GatepassState>,
    pub created_by: Option<UserId>,
    pub limit: Option<u32>,
}
