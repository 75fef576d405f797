// Test doubles and a ready-made engine over an in-memory database

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::database::DatabaseManager;
use crate::lifecycle::engine::LifecycleEngine;
use crate::lifecycle::errors::GatepassError;
use crate::lifecycle::traits::{Clock, GatepassStore, NotificationSink};
use crate::lifecycle::types::*;
use crate::notify::ChannelSink;
use crate::storage::{encode_timestamp, SqliteGatepassStore};

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Engine, store, clock and the receiving end of its notifications
pub struct Harness {
    pub engine: LifecycleEngine,
    pub store: SqliteGatepassStore,
    pub clock: Arc<FixedClock>,
    pub events: mpsc::UnboundedReceiver<NotificationEvent>,
    pub requester: UserRecord,
    pub admin: UserRecord,
    pub security: UserRecord,
}

impl Harness {
    pub async fn new() -> Self {
        let (sink, events) = ChannelSink::new();
        Self::with_sink(Arc::new(sink), events).await
    }

    pub async fn with_sink(
        sink: Arc<dyn NotificationSink>,
        events: mpsc::UnboundedReceiver<NotificationEvent>,
    ) -> Self {
        let db = DatabaseManager::in_memory().await.unwrap();
        let store = SqliteGatepassStore::new(db.pool().clone());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
        ));
        let engine = LifecycleEngine::for_sqlite(store.clone(), sink).with_clock(clock.clone());

        let requester = store
            .create_user("requester", Role::User, UserStatus::Active)
            .await
            .unwrap();
        let admin = store
            .create_user("admin", Role::Admin, UserStatus::Active)
            .await
            .unwrap();
        let security = store
            .create_user("gate-security", Role::Security, UserStatus::Active)
            .await
            .unwrap();

        Self {
            engine,
            store,
            clock,
            events,
            requester,
            admin,
            security,
        }
    }

    pub fn fields(&self) -> GatepassFields {
        GatepassFields {
            from_location: "Main Warehouse".to_string(),
            to_location: "Site B".to_string(),
            material_type: "Returnable".to_string(),
            purpose: "Repair".to_string(),
            requested_for: self.clock.now().naive_utc().date().and_hms_opt(15, 30, 0).unwrap(),
        }
    }

    pub async fn create(&self) -> Gatepass {
        self.engine
            .create_gatepass(
                self.requester.id,
                &self.fields(),
                &[ItemLine::new("Drill", 2.0, "pcs")],
            )
            .await
            .unwrap()
    }

    /// Next notification, waiting briefly for the background task
    pub async fn next_event(&mut self) -> NotificationEvent {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.events.recv())
            .await
            .expect("notification not delivered in time")
            .expect("notification channel closed")
    }
}

/// Store that pushes the security stamp past the late-decline window just
/// before a windowed write lands, as a concurrent clock drift would.
pub struct WindowClosingStore {
    inner: SqliteGatepassStore,
}

impl WindowClosingStore {
    pub fn new(inner: SqliteGatepassStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl GatepassStore for WindowClosingStore {
    async fn insert_gatepass(
        &self,
        gatepass_number: &str,
        created_by: UserId,
        fields: &GatepassFields,
        items: &[ItemLine],
        audit: &NewAuditEntry,
        at: DateTime<Utc>,
    ) -> Result<GatepassId, GatepassError> {
        self.inner
            .insert_gatepass(gatepass_number, created_by, fields, items, audit, at)
            .await
    }

    async fn load_guard_view(&self, id: GatepassId) -> Result<Option<GuardView>, GatepassError> {
        self.inner.load_guard_view(id).await
    }

    async fn apply_transition(
        &self,
        id: GatepassId,
        decision: &Decision,
        audit: &NewAuditEntry,
    ) -> Result<bool, GatepassError> {
        if let Some(floor) = decision.window_floor {
            sqlx::query("UPDATE gatepasses SET security_approved_at = ?1 WHERE id = ?2")
                .bind(encode_timestamp(floor - Duration::hours(1)))
                .bind(id)
                .execute(self.inner.pool())
                .await?;
        }
        self.inner.apply_transition(id, decision, audit).await
    }

    async fn replace_pending(
        &self,
        id: GatepassId,
        decision: &Decision,
        fields: &GatepassFields,
        items: &[ItemLine],
        audit: &NewAuditEntry,
    ) -> Result<bool, GatepassError> {
        self.inner
            .replace_pending(id, decision, fields, items, audit)
            .await
    }

    async fn find_gatepass(&self, id: GatepassId) -> Result<Option<Gatepass>, GatepassError> {
        self.inner.find_gatepass(id).await
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Gatepass>, GatepassError> {
        self.inner.find_by_number(number).await
    }

    async fn list_gatepasses(
        &self,
        filter: &GatepassFilter,
    ) -> Result<Vec<Gatepass>, GatepassError> {
        self.inner.list_gatepasses(filter).await
    }

    async fn audit_trail(
        &self,
        gatepass_id: Option<GatepassId>,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, GatepassError> {
        self.inner.audit_trail(gatepass_id, limit).await
    }
}
