use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rusqlite::{params, Row};

use crate::database::models::{Notification, NotificationDraft};
use crate::database::operations::{parse_column, DatabaseOperations};
use crate::error::{LedgerError, Result};
use crate::ledger::traits::{NotificationInbox, NotificationSink};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, type, read_status, related_entity_id, created_at";

#[async_trait]
impl NotificationSink for DatabaseOperations {
    async fn create(&self, user_id: &str, draft: &NotificationDraft) -> Result<Notification> {
        let conn = self.conn.lock().await;
        let notification = conn.query_row(
            &format!(
                "INSERT INTO notifications (user_id, title, message, type, read_status, related_entity_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, FALSE, ?5, ?6)
                 RETURNING {NOTIFICATION_COLUMNS}"
            ),
            params![
                user_id,
                draft.title,
                draft.message,
                draft.kind.as_str(),
                draft.related_entity_id,
                Utc::now()
            ],
            notification_from_row,
        )?;

        debug!("Created notification {} for {user_id}", notification.id);
        Ok(notification)
    }
}

#[async_trait]
impl NotificationInbox for DatabaseOperations {
    async fn list_notifications(
        &self,
        user_id: &str,
        read_status: Option<bool>,
    ) -> Result<Vec<Notification>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = ?1 AND (?2 IS NULL OR read_status = ?2)
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id, read_status], notification_from_row)?;
        let notifications = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notifications)
    }

    async fn unread_count(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read_status = FALSE",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn mark_read(&self, user_id: &str, notification_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE notifications SET read_status = TRUE WHERE id = ?1 AND user_id = ?2",
            params![notification_id, user_id],
        )?;

        if changed == 0 {
            return Err(LedgerError::not_found("Notification", notification_id));
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE notifications SET read_status = TRUE WHERE user_id = ?1 AND read_status = FALSE",
            params![user_id],
        )?;
        Ok(changed as u64)
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute(
            "DELETE FROM notifications WHERE user_id = ?1",
            params![user_id],
        )?;

        info!("Deleted {deleted} notifications for {user_id}");
        Ok(deleted as u64)
    }
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        kind: parse_column(row, 4)?,
        read_status: row.get(5)?,
        related_entity_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}
