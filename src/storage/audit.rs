// Append-only audit trail

use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{corrupt, decode_timestamp, encode_timestamp};
use crate::lifecycle::errors::GatepassError;
use crate::lifecycle::types::{AuditEntry, GatepassId, NewAuditEntry};

#[derive(Debug, FromRow)]
struct AuditRow {
    id: i64,
    actor_id: Option<i64>,
    action: String,
    gatepass_id: Option<i64>,
    detail: String,
    created_at: String,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = GatepassError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: row.id,
            actor_id: row.actor_id,
            action: row.action.parse().map_err(corrupt)?,
            gatepass_id: row.gatepass_id,
            detail: row.detail,
            created_at: decode_timestamp(&row.created_at)?,
        })
    }
}

/// Writes and reads audit entries. Entries are only ever inserted; the schema
/// rejects updates and deletes.
pub struct AuditRecorder;

impl AuditRecorder {
    /// Append one entry on the caller's connection, normally inside the same
    /// transaction as the change it describes.
    pub async fn append(
        conn: &mut SqliteConnection,
        entry: &NewAuditEntry,
    ) -> Result<i64, GatepassError> {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_id, action, gatepass_id, detail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(entry.gatepass_id)
        .bind(&entry.detail)
        .bind(encode_timestamp(entry.at))
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent entries first, optionally for one gatepass
    pub async fn list(
        pool: &SqlitePool,
        gatepass_id: Option<GatepassId>,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, GatepassError> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, actor_id, action, gatepass_id, detail, created_at
            FROM audit_logs
            WHERE ?1 IS NULL OR gatepass_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(gatepass_id)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use crate::lifecycle::types::AuditAction;
    use chrono::Utc;

    fn entry(gatepass_id: Option<i64>, detail: &str) -> NewAuditEntry {
        NewAuditEntry {
            actor_id: Some(1),
            action: AuditAction::ApproveAdmin,
            gatepass_id,
            detail: detail.to_string(),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        AuditRecorder::append(&mut conn, &entry(Some(1), "first")).await.unwrap();
        AuditRecorder::append(&mut conn, &entry(Some(2), "other")).await.unwrap();
        AuditRecorder::append(&mut conn, &entry(Some(1), "second")).await.unwrap();
        drop(conn);

        let all = AuditRecorder::list(db.pool(), None, 10).await.unwrap();
        assert_eq!(all.len(), 3);

        let for_one = AuditRecorder::list(db.pool(), Some(1), 10).await.unwrap();
        let details: Vec<&str> = for_one.iter().map(|e| e.detail.as_str()).collect();
        assert_eq!(details, vec!["second", "first"]);
        assert_eq!(for_one[0].action, AuditAction::ApproveAdmin);
    }

    #[tokio::test]
    async fn test_system_entries_have_no_actor() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let mut system = entry(None, "imported");
        system.actor_id = None;
        AuditRecorder::append(&mut conn, &system).await.unwrap();
        drop(conn);

        let all = AuditRecorder::list(db.pool(), None, 1).await.unwrap();
        assert_eq!(all[0].actor_id, None);
    }
}
