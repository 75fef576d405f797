use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::GatepassState;

/// Every way a lifecycle operation can be refused or fail.
///
/// None of these leave a gatepass half-written: validation and authorization
/// are checked before any write, and the conditional write is all-or-nothing.
#[derive(Debug, Error)]
pub enum GatepassError {
    #[error("gatepass {0} not found")]
    NotFound(String),

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("gatepass {gatepass} is not {expected}{}", currently(.actual))]
    WrongState {
        gatepass: String,
        expected: GatepassState,
        actual: Option<GatepassState>,
    },

    #[error("late decline window for gatepass {gatepass} closed (security approval at {approved_at})")]
    WindowExpired {
        gatepass: String,
        approved_at: DateTime<Utc>,
    },

    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),
}

fn currently(actual: &Option<GatepassState>) -> String {
    actual
        .map(|state| format!(" (currently {state})"))
        .unwrap_or_default()
}

impl GatepassError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        GatepassError::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        GatepassError::ValidationFailed {
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            GatepassError::NotFound(_) => "not_found",
            GatepassError::Forbidden { .. } => "forbidden",
            GatepassError::WrongState { .. } => "wrong_state",
            GatepassError::WindowExpired { .. } => "window_expired",
            GatepassError::ValidationFailed { .. } => "validation_failed",
            GatepassError::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    /// Message suitable for showing to the person who made the request
    pub fn user_message(&self) -> String {
        match self {
            GatepassError::NotFound(_) => "Gatepass not found.".to_string(),
            GatepassError::Forbidden { reason } => {
                format!("You are not allowed to do this: {reason}.")
            }
            GatepassError::WrongState { .. } => {
                "This gatepass was already processed by someone else. Reload to see its current status."
                    .to_string()
            }
            GatepassError::WindowExpired { .. } => {
                "The decline window for this gatepass has closed.".to_string()
            }
            GatepassError::ValidationFailed { reason } => format!("Please fix the request: {reason}."),
            GatepassError::StorageUnavailable(_) => {
                "The gatepass store is temporarily unavailable. Try again shortly.".to_string()
            }
        }
    }

    /// A unique constraint rejected the write
    pub fn is_unique_violation(&self) -> bool {
        match self {
            GatepassError::StorageUnavailable(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }

    /// Only storage failures are worth retrying; everything else is a
    /// definitive answer about the current record.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatepassError::StorageUnavailable(_))
    }
}
