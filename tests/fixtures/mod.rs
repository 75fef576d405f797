//! Shared fixtures: a file-backed engine in a temporary directory with one
//! user per role, and helpers for the common gatepass shapes
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use gatepass::config::DatabaseConfig;
use gatepass::lifecycle::types::*;
use gatepass::storage::encode_timestamp;
use gatepass::{ChannelSink, DatabaseManager, LifecycleEngine, SqliteGatepassStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct TestWorld {
    pub engine: LifecycleEngine,
    pub store: SqliteGatepassStore,
    pub events: UnboundedReceiver<NotificationEvent>,
    pub requester: UserRecord,
    pub admin: UserRecord,
    pub security: UserRecord,
    _dir: TempDir,
}

impl TestWorld {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: format!("sqlite://{}/gatepass.db", dir.path().display()),
            max_connections: 8,
            auto_migrate: true,
            busy_timeout_ms: 10_000,
            acquire_timeout_ms: 10_000,
        };
        let database = DatabaseManager::new(&config)
            .await
            .expect("Failed to open test database");
        let store = SqliteGatepassStore::new(database.pool().clone());

        let (sink, events) = ChannelSink::new();
        let engine = LifecycleEngine::for_sqlite(store.clone(), Arc::new(sink));

        let requester = add_user(&store, "requester", Role::User).await;
        let admin = add_user(&store, "admin-1", Role::Admin).await;
        let security = add_user(&store, "security-1", Role::Security).await;

        Self {
            engine,
            store,
            events,
            requester,
            admin,
            security,
            _dir: dir,
        }
    }

    pub async fn add_user(&self, username: &str, role: Role) -> UserRecord {
        add_user(&self.store, username, role).await
    }

    /// A pending gatepass from the requester carrying `items`
    pub async fn create_with(&self, items: &[ItemLine]) -> Gatepass {
        self.engine
            .create_gatepass(self.requester.id, &sample_fields(), items)
            .await
            .expect("Failed to create gatepass")
    }

    pub async fn create_pending(&self) -> Gatepass {
        self.create_with(&sample_items()).await
    }

    /// A gatepass already approved by the admin
    pub async fn create_admin_approved(&self) -> Gatepass {
        let gatepass = self.create_pending().await;
        self.engine
            .approve_as_admin(self.admin.id, gatepass.id)
            .await
            .expect("Admin approval failed");
        gatepass
    }

    /// Backdate the security approval timestamp without changing state
    pub async fn set_security_approved_at(&self, id: GatepassId, at: DateTime<Utc>) {
        sqlx::query("UPDATE gatepasses SET security_approved_at = ?1 WHERE id = ?2")
            .bind(encode_timestamp(at))
            .bind(id)
            .execute(self.store.pool())
            .await
            .expect("Failed to backdate security approval");
    }

    pub async fn audit_count(&self, id: GatepassId) -> usize {
        self.engine
            .audit_trail(Some(id), 1_000)
            .await
            .expect("Failed to read audit trail")
            .len()
    }

    /// Wait for the next notification of `kind`, skipping others
    pub async fn expect_event(&mut self, kind: NotificationKind) -> NotificationEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("Timed out waiting for notification")
                .expect("Notification channel closed");
            if event.event_type == kind {
                return event;
            }
        }
    }
}

async fn add_user(store: &SqliteGatepassStore, username: &str, role: Role) -> UserRecord {
    store
        .create_user(username, role, UserStatus::Active)
        .await
        .expect("Failed to create user")
}

pub fn sample_fields() -> GatepassFields {
    GatepassFields {
        from_location: "Central Store".to_string(),
        to_location: "Plant 3".to_string(),
        material_type: "Returnable".to_string(),
        purpose: "Maintenance shutdown".to_string(),
        requested_for: NaiveDate::from_ymd_opt(2025, 6, 2)
            .and_then(|d| d.and_hms_opt(7, 30, 0))
            .expect("valid date"),
    }
}

pub fn sample_items() -> Vec<ItemLine> {
    vec![
        ItemLine::new("Torque wrench", 2.0, "pcs"),
        ItemLine::new("Hydraulic oil", 40.0, "l"),
    ]
}
