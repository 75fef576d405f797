use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::audit::AuditRecorder;
use super::{
    corrupt, decode_optional_timestamp, decode_requested_for, decode_timestamp,
    encode_requested_for, encode_timestamp,
};
use crate::lifecycle::errors::GatepassError;
use crate::lifecycle::traits::{ActorResolver, GatepassStore};
use crate::lifecycle::types::*;

const GATEPASS_COLUMNS: &str = r#"
    id, gatepass_number, from_location, to_location, material_type, purpose,
    requested_for, state, created_by, created_at, updated_at,
    admin_approved_by, admin_approved_at, security_approved_by, security_approved_at,
    declined_by, declined_at, decline_reason
"#;

#[derive(Debug, FromRow)]
struct GatepassRow {
    id: i64,
    gatepass_number: String,
    from_location: String,
    to_location: String,
    material_type: String,
    purpose: String,
    requested_for: String,
    state: String,
    created_by: i64,
    created_at: String,
    updated_at: String,
    admin_approved_by: Option<i64>,
    admin_approved_at: Option<String>,
    security_approved_by: Option<i64>,
    security_approved_at: Option<String>,
    declined_by: Option<i64>,
    declined_at: Option<String>,
    decline_reason: Option<String>,
}

impl GatepassRow {
    fn into_gatepass(self, items: Vec<GatepassItem>) -> Result<Gatepass, GatepassError> {
        Ok(Gatepass {
            id: self.id,
            gatepass_number: self.gatepass_number,
            fields: GatepassFields {
                from_location: self.from_location,
                to_location: self.to_location,
                material_type: self.material_type,
                purpose: self.purpose,
                requested_for: decode_requested_for(&self.requested_for)?,
            },
            state: self.state.parse().map_err(corrupt)?,
            created_by: self.created_by,
            created_at: decode_timestamp(&self.created_at)?,
            updated_at: decode_timestamp(&self.updated_at)?,
            admin_approved_by: self.admin_approved_by,
            admin_approved_at: decode_optional_timestamp(self.admin_approved_at.as_deref())?,
            security_approved_by: self.security_approved_by,
            security_approved_at: decode_optional_timestamp(
                self.security_approved_at.as_deref(),
            )?,
            declined_by: self.declined_by,
            declined_at: decode_optional_timestamp(self.declined_at.as_deref())?,
            decline_reason: self.decline_reason,
            items,
        })
    }
}

#[derive(Debug, FromRow)]
struct GuardRow {
    id: i64,
    gatepass_number: String,
    state: String,
    created_by: i64,
    admin_approved_by: Option<i64>,
    security_approved_at: Option<String>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    item_name: String,
    quantity: f64,
    unit: String,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    role: String,
    status: String,
    created_at: String,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = GatepassError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            id: row.id,
            username: row.username,
            role: row.role.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            created_at: decode_timestamp(&row.created_at)?,
        })
    }
}

/// Gatepass store on a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteGatepassStore {
    pool: SqlitePool,
}

impl SqliteGatepassStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register an actor reference
    pub async fn create_user(
        &self,
        username: &str,
        role: Role,
        status: UserStatus,
    ) -> Result<UserRecord, GatepassError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(GatepassError::validation("username is required"));
        }

        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO users (username, role, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(username)
        .bind(role.as_str())
        .bind(status.as_str())
        .bind(encode_timestamp(now))
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(user.id = id, username = %username, role = %role, "User created");
        self.find_user(id)
            .await?
            .ok_or_else(|| corrupt(format!("user {id} missing right after insert")))
    }

    pub async fn set_user_status(
        &self,
        id: UserId,
        status: UserStatus,
    ) -> Result<bool, GatepassError> {
        let result = sqlx::query("UPDATE users SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, GatepassError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, role, status, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, GatepassError> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, username, role, status, created_at FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn load_items(&self, gatepass_id: GatepassId) -> Result<Vec<GatepassItem>, GatepassError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT id, item_name, quantity, unit
            FROM gatepass_items
            WHERE gatepass_id = ?1
            ORDER BY id
            "#,
        )
        .bind(gatepass_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| GatepassItem {
                id: row.id,
                item_name: row.item_name,
                quantity: row.quantity,
                unit: row.unit,
            })
            .collect())
    }

    async fn hydrate(&self, row: GatepassRow) -> Result<Gatepass, GatepassError> {
        let items = self.load_items(row.id).await?;
        row.into_gatepass(items)
    }
}

async fn insert_items(
    conn: &mut SqliteConnection,
    gatepass_id: GatepassId,
    items: &[ItemLine],
) -> Result<(), GatepassError> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO gatepass_items (gatepass_id, item_name, quantity, unit)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(gatepass_id)
        .bind(&item.item_name)
        .bind(item.quantity)
        .bind(&item.unit)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// The conditional update for a guard decision. The current state is part of
/// the predicate, so of two racing writers only one can match.
async fn conditional_update(
    conn: &mut SqliteConnection,
    id: GatepassId,
    decision: &Decision,
) -> Result<u64, GatepassError> {
    let next = decision.next.as_str();
    let expected = decision.expected.as_str();

    let result = match &decision.stamp {
        Stamp::AdminApproval { by, at } => {
            sqlx::query(
                r#"
                UPDATE gatepasses
                SET state = ?1, admin_approved_by = ?2, admin_approved_at = ?3, updated_at = ?3
                WHERE id = ?4 AND state = ?5
                "#,
            )
            .bind(next)
            .bind(by)
            .bind(encode_timestamp(*at))
            .bind(id)
            .bind(expected)
            .execute(&mut *conn)
            .await?
        }
        Stamp::SecurityApproval { by, at } => {
            sqlx::query(
                r#"
                UPDATE gatepasses
                SET state = ?1, security_approved_by = ?2, security_approved_at = ?3, updated_at = ?3
                WHERE id = ?4 AND state = ?5
                "#,
            )
            .bind(next)
            .bind(by)
            .bind(encode_timestamp(*at))
            .bind(id)
            .bind(expected)
            .execute(&mut *conn)
            .await?
        }
        Stamp::Decline { by, at, reason } => {
            sqlx::query(
                r#"
                UPDATE gatepasses
                SET state = ?1, declined_by = ?2, declined_at = ?3, decline_reason = ?4, updated_at = ?3
                WHERE id = ?5 AND state = ?6
                  AND (?7 IS NULL OR (security_approved_at IS NOT NULL AND security_approved_at >= ?7))
                "#,
            )
            .bind(next)
            .bind(by)
            .bind(encode_timestamp(*at))
            .bind(reason)
            .bind(id)
            .bind(expected)
            .bind(decision.window_floor.map(encode_timestamp))
            .execute(&mut *conn)
            .await?
        }
        Stamp::Edit { at, .. } => {
            sqlx::query(
                r#"
                UPDATE gatepasses
                SET state = ?1, updated_at = ?2
                WHERE id = ?3 AND state = ?4
                "#,
            )
            .bind(next)
            .bind(encode_timestamp(*at))
            .bind(id)
            .bind(expected)
            .execute(&mut *conn)
            .await?
        }
    };

    Ok(result.rows_affected())
}

#[async_trait]
impl GatepassStore for SqliteGatepassStore {
    async fn insert_gatepass(
        &self,
        gatepass_number: &str,
        created_by: UserId,
        fields: &GatepassFields,
        items: &[ItemLine],
        audit: &NewAuditEntry,
        at: DateTime<Utc>,
    ) -> Result<GatepassId, GatepassError> {
        let mut tx = self.pool.begin().await?;
        let stamp = encode_timestamp(at);

        let id = sqlx::query(
            r#"
            INSERT INTO gatepasses (
                gatepass_number, from_location, to_location, material_type, purpose,
                requested_for, state, created_by, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(gatepass_number)
        .bind(&fields.from_location)
        .bind(&fields.to_location)
        .bind(&fields.material_type)
        .bind(&fields.purpose)
        .bind(encode_requested_for(fields.requested_for))
        .bind(GatepassState::Pending.as_str())
        .bind(created_by)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_items(&mut tx, id, items).await?;

        let audit = NewAuditEntry {
            gatepass_id: Some(id),
            ..audit.clone()
        };
        AuditRecorder::append(&mut tx, &audit).await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn load_guard_view(&self, id: GatepassId) -> Result<Option<GuardView>, GatepassError> {
        let row: Option<GuardRow> = sqlx::query_as(
            r#"
            SELECT id, gatepass_number, state, created_by, admin_approved_by, security_approved_at
            FROM gatepasses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(GuardView {
                id: row.id,
                gatepass_number: row.gatepass_number,
                state: row.state.parse().map_err(corrupt)?,
                created_by: row.created_by,
                admin_approved_by: row.admin_approved_by,
                security_approved_at: decode_optional_timestamp(
                    row.security_approved_at.as_deref(),
                )?,
            })
        })
        .transpose()
    }

    async fn apply_transition(
        &self,
        id: GatepassId,
        decision: &Decision,
        audit: &NewAuditEntry,
    ) -> Result<bool, GatepassError> {
        let mut tx = self.pool.begin().await?;

        let changed = conditional_update(&mut tx, id, decision).await?;
        if changed != 1 {
            tx.rollback().await?;
            debug!(gatepass.id = id, expected = %decision.expected, "Conditional write matched no row");
            return Ok(false);
        }

        AuditRecorder::append(&mut tx, audit).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn replace_pending(
        &self,
        id: GatepassId,
        decision: &Decision,
        fields: &GatepassFields,
        items: &[ItemLine],
        audit: &NewAuditEntry,
    ) -> Result<bool, GatepassError> {
        let mut tx = self.pool.begin().await?;

        let changed = sqlx::query(
            r#"
            UPDATE gatepasses
            SET from_location = ?1, to_location = ?2, material_type = ?3, purpose = ?4,
                requested_for = ?5, updated_at = ?6
            WHERE id = ?7 AND state = ?8
            "#,
        )
        .bind(&fields.from_location)
        .bind(&fields.to_location)
        .bind(&fields.material_type)
        .bind(&fields.purpose)
        .bind(encode_requested_for(fields.requested_for))
        .bind(encode_timestamp(decision.stamp.at()))
        .bind(id)
        .bind(decision.expected.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if changed != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM gatepass_items WHERE gatepass_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, id, items).await?;
        AuditRecorder::append(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_gatepass(&self, id: GatepassId) -> Result<Option<Gatepass>, GatepassError> {
        let row: Option<GatepassRow> =
            sqlx::query_as(&format!("SELECT {GATEPASS_COLUMNS} FROM gatepasses WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Gatepass>, GatepassError> {
        let row: Option<GatepassRow> = sqlx::query_as(&format!(
            "SELECT {GATEPASS_COLUMNS} FROM gatepasses WHERE gatepass_number = ?1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_gatepasses(
        &self,
        filter: &GatepassFilter,
    ) -> Result<Vec<Gatepass>, GatepassError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {GATEPASS_COLUMNS} FROM gatepasses WHERE 1 = 1"));

        if let Some(state) = filter.state {
            query.push(" AND state = ").push_bind(state.as_str());
        }
        if let Some(created_by) = filter.created_by {
            query.push(" AND created_by = ").push_bind(created_by);
        }
        query.push(" ORDER BY id DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows: Vec<GatepassRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut gatepasses = Vec::with_capacity(rows.len());
        for row in rows {
            gatepasses.push(self.hydrate(row).await?);
        }
        Ok(gatepasses)
    }

    async fn audit_trail(
        &self,
        gatepass_id: Option<GatepassId>,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, GatepassError> {
        AuditRecorder::list(&self.pool, gatepass_id, limit).await
    }
}

#[async_trait]
impl ActorResolver for SqliteGatepassStore {
    async fn resolve(&self, actor_id: UserId) -> Result<ActorToken, GatepassError> {
        self.find_user(actor_id)
            .await?
            .map(|user| user.token())
            .ok_or_else(|| GatepassError::forbidden(format!("unknown actor {actor_id}")))
    }

    async fn active_pool(&self, role: Role) -> Result<Vec<UserId>, GatepassError> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE role = ?1 AND status = ?2 ORDER BY id",
        )
        .bind(role.as_str())
        .bind(UserStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use chrono::{Duration, NaiveDate};

    async fn store() -> SqliteGatepassStore {
        let db = DatabaseManager::in_memory().await.unwrap();
        SqliteGatepassStore::new(db.pool().clone())
    }

    fn fields() -> GatepassFields {
        GatepassFields {
            from_location: "Store".to_string(),
            to_location: "Plant 2".to_string(),
            material_type: "Non-returnable".to_string(),
            purpose: "Installation".to_string(),
            requested_for: NaiveDate::from_ymd_opt(2025, 5, 2)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
        }
    }

    fn audit(action: AuditAction, actor: i64) -> NewAuditEntry {
        NewAuditEntry {
            actor_id: Some(actor),
            action,
            gatepass_id: None,
            detail: "test".to_string(),
            at: Utc::now(),
        }
    }

    async fn admin(store: &SqliteGatepassStore, username: &str) -> UserId {
        store
            .create_user(username, Role::Admin, UserStatus::Active)
            .await
            .unwrap()
            .id
    }

    async fn seeded(store: &SqliteGatepassStore) -> (UserRecord, GatepassId) {
        let user = store
            .create_user("requester", Role::User, UserStatus::Active)
            .await
            .unwrap();
        let id = store
            .insert_gatepass(
                "GP-20250502-000001",
                user.id,
                &fields(),
                &[ItemLine::new("Pump", 1.0, "pcs"), ItemLine::new("Hose", 20.0, "m")],
                &audit(AuditAction::CreateGatepass, user.id),
                Utc::now(),
            )
            .await
            .unwrap();
        (user, id)
    }

    fn admin_decision(by: i64) -> Decision {
        Decision {
            expected: GatepassState::Pending,
            next: GatepassState::ApprovedByAdmin,
            stamp: Stamp::AdminApproval { by, at: Utc::now() },
            window_floor: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = store().await;
        let (user, id) = seeded(&store).await;

        let gatepass = store.find_gatepass(id).await.unwrap().unwrap();
        assert_eq!(gatepass.state, GatepassState::Pending);
        assert_eq!(gatepass.created_by, user.id);
        assert_eq!(gatepass.fields, fields());
        assert_eq!(gatepass.items.len(), 2);
        assert_eq!(gatepass.items[1].item_name, "Hose");
        assert!(gatepass.attribution_consistent());

        let by_number = store.find_by_number("GP-20250502-000001").await.unwrap();
        assert_eq!(by_number.map(|g| g.id), Some(id));

        let trail = store.audit_trail(Some(id), 10).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::CreateGatepass);
    }

    #[tokio::test]
    async fn test_duplicate_number_rolls_back_items() {
        let store = store().await;
        let (user, _) = seeded(&store).await;

        let err = store
            .insert_gatepass(
                "GP-20250502-000001",
                user.id,
                &fields(),
                &[ItemLine::new("Valve", 2.0, "pcs")],
                &audit(AuditAction::CreateGatepass, user.id),
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        let (items,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM gatepass_items")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(items, 2);
    }

    #[tokio::test]
    async fn test_conditional_write_has_one_winner() {
        let store = store().await;
        let (_, id) = seeded(&store).await;
        let first_admin = admin(&store, "admin-1").await;
        let second_admin = admin(&store, "admin-2").await;

        let first = store
            .apply_transition(
                id,
                &admin_decision(first_admin),
                &audit(AuditAction::ApproveAdmin, first_admin),
            )
            .await
            .unwrap();
        let second = store
            .apply_transition(
                id,
                &admin_decision(second_admin),
                &audit(AuditAction::ApproveAdmin, second_admin),
            )
            .await
            .unwrap();

        assert!(first);
        assert!(!second);

        let gatepass = store.find_gatepass(id).await.unwrap().unwrap();
        assert_eq!(gatepass.admin_approved_by, Some(first_admin));
        // creation plus the single winning approval
        assert_eq!(store.audit_trail(None, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_late_decline_predicate_checks_window_in_storage() {
        let store = store().await;
        let (_, id) = seeded(&store).await;
        let approver = admin(&store, "admin-1").await;
        assert!(store
            .apply_transition(
                id,
                &admin_decision(approver),
                &audit(AuditAction::ApproveAdmin, approver),
            )
            .await
            .unwrap());

        let now = Utc::now();
        sqlx::query("UPDATE gatepasses SET security_approved_at = ?1 WHERE id = ?2")
            .bind(encode_timestamp(now - Duration::seconds(4000)))
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();

        let decision = Decision {
            expected: GatepassState::ApprovedByAdmin,
            next: GatepassState::Declined,
            stamp: Stamp::Decline {
                by: approver,
                at: now,
                reason: "late".to_string(),
            },
            window_floor: Some(now - Duration::seconds(3600)),
        };
        let changed = store
            .apply_transition(id, &decision, &audit(AuditAction::DeclineGatepass, approver))
            .await
            .unwrap();
        assert!(!changed);

        let gatepass = store.find_gatepass(id).await.unwrap().unwrap();
        assert_eq!(gatepass.state, GatepassState::ApprovedByAdmin);
        // creation plus the admin approval; the refused decline wrote nothing
        assert_eq!(store.audit_trail(None, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_pending_swaps_items() {
        let store = store().await;
        let (user, id) = seeded(&store).await;

        let mut new_fields = fields();
        new_fields.purpose = "Calibration".to_string();
        let decision = Decision {
            expected: GatepassState::Pending,
            next: GatepassState::Pending,
            stamp: Stamp::Edit {
                by: user.id,
                at: Utc::now(),
            },
            window_floor: None,
        };

        let changed = store
            .replace_pending(
                id,
                &decision,
                &new_fields,
                &[ItemLine::new("Gauge", 3.0, "pcs")],
                &audit(AuditAction::EditGatepass, user.id),
            )
            .await
            .unwrap();
        assert!(changed);

        let gatepass = store.find_gatepass(id).await.unwrap().unwrap();
        assert_eq!(gatepass.fields.purpose, "Calibration");
        assert_eq!(gatepass.items.len(), 1);
        assert_eq!(gatepass.items[0].item_name, "Gauge");
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = store().await;
        let (user, id) = seeded(&store).await;
        let approver = admin(&store, "admin-1").await;
        assert!(store
            .apply_transition(
                id,
                &admin_decision(approver),
                &audit(AuditAction::ApproveAdmin, approver),
            )
            .await
            .unwrap());

        let pending = store
            .list_gatepasses(&GatepassFilter {
                state: Some(GatepassState::Pending),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(pending.is_empty());

        let mine = store
            .list_gatepasses(&GatepassFilter {
                created_by: Some(user.id),
                limit: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].state, GatepassState::ApprovedByAdmin);
    }

    #[tokio::test]
    async fn test_actor_resolution() {
        let store = store().await;
        let active = store
            .create_user("guard-1", Role::Security, UserStatus::Active)
            .await
            .unwrap();
        let waiting = store
            .create_user("guard-2", Role::Security, UserStatus::Pending)
            .await
            .unwrap();

        assert_eq!(
            store.resolve(active.id).await.unwrap(),
            ActorToken::new(active.id, Role::Security, true)
        );
        assert!(!store.resolve(waiting.id).await.unwrap().active);
        assert!(matches!(
            store.resolve(999).await,
            Err(GatepassError::Forbidden { .. })
        ));
        assert_eq!(store.active_pool(Role::Security).await.unwrap(), vec![active.id]);

        assert!(store.set_user_status(waiting.id, UserStatus::Active).await.unwrap());
        assert_eq!(store.active_pool(Role::Security).await.unwrap().len(), 2);
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_gatepasses_cannot_be_deleted() {
        let store = store().await;
        let (_, id) = seeded(&store).await;
        assert!(sqlx::query("DELETE FROM gatepasses WHERE id = ?1")
            .bind(id)
            .execute(store.pool())
            .await
            .is_err());
    }
}
