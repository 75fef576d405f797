// Gatepass Lifecycle Module - guarded state machine over a shared store
//
// The guard decides, the store settles races with conditional writes, and
// the engine ties both to auditing and notifications.

pub mod engine;
pub mod errors;
pub mod guard;
pub mod traits;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod mocks;


pub use engine::{generate_number, LifecycleEngine, MAX_NUMBER_ATTEMPTS};
pub use errors::GatepassError;
pub use guard::{TransitionGuard, DEFAULT_LATE_DECLINE_WINDOW_SECS};
pub use traits::{ActorResolver, Clock, GatepassStore, NotificationSink, SystemClock};
pub use types::*;
