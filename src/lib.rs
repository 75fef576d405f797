// Gatepass Library - material movement passes with a guarded approval lifecycle
// This exposes the core components for embedding, testing and the CLI

pub mod cli;
pub mod config;
pub mod database;
pub mod lifecycle;
pub mod notify;
pub mod storage;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{GatepassConfig, DatabaseConfig, LifecycleConfig, ObservabilityConfig};
pub use database::DatabaseManager;
pub use lifecycle::{
    Action, ActorToken, AuditEntry, EditPayload, Gatepass, GatepassError, GatepassFields,
    GatepassFilter, GatepassState, ItemLine, LifecycleEngine, NotificationEvent, Role,
    TransitionGuard, TransitionOutcome, UserStatus,
};
pub use notify::{ChannelSink, LogSink, NotificationDispatcher};
pub use storage::SqliteGatepassStore;
pub use telemetry::{create_lifecycle_span, generate_correlation_id, init_telemetry};
