// file: src/database/notifications.rs
//
// Pending notification queue. The monitor loop drains due rows.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NotificationRequest, PendingNotification};
use crate::platform::{Clock, Notifier, SystemClock};

#[derive(Clone)]
pub struct SqliteNotifier {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteNotifier {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Undelivered entries whose fire time is at or before `now`, oldest first.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<PendingNotification>> {
        let rows = sqlx::query_as::<_, PendingNotification>(
            r#"
            SELECT id, title, body, channel, priority, fire_at, delivered
            FROM pending_notifications
            WHERE delivered = 0 AND fire_at <= ?
            ORDER BY fire_at ASC, created_at ASC
            "#,
        )
        .bind(now.timestamp())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_delivered(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE pending_notifications SET delivered = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn pending(&self) -> Result<Vec<PendingNotification>> {
        let rows = sqlx::query_as::<_, PendingNotification>(
            r#"
            SELECT id, title, body, channel, priority, fire_at, delivered
            FROM pending_notifications
            WHERE delivered = 0
            ORDER BY fire_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Notifier for SqliteNotifier {
    async fn schedule(&self, request: NotificationRequest) -> AppResult<Option<String>> {
        let id = Uuid::new_v4().to_string();
        let fire_at = request.fire_at(self.clock.now());

        sqlx::query(
            r#"
            INSERT INTO pending_notifications (id, title, body, channel, priority, fire_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.body)
        .bind(&request.channel)
        .bind(request.priority.as_str())
        .bind(fire_at.timestamp())
        .execute(&self.pool)
        .await?;

        debug!("Queued notification {} for {}", id, fire_at);
        Ok(Some(id))
    }

    async fn cancel_all(&self) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM pending_notifications WHERE delivered = 0")
            .execute(&self.pool)
            .await?;
        debug!("Cancelled {} pending notifications", result.rows_affected());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::platform::FixedClock;
    use chrono::Duration;

    async fn notifier_at(now: DateTime<Utc>) -> SqliteNotifier {
        let db = Database::in_memory().await.unwrap();
        db.notifier().with_clock(Arc::new(FixedClock::new(now)))
    }

    #[tokio::test]
    async fn test_schedule_assigns_fire_time() {
        let now = Utc::now();
        let notifier = notifier_at(now).await;

        let id = notifier
            .schedule(NotificationRequest::scheduled("Title", "Body", 600))
            .await
            .unwrap()
            .unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        assert!(notifier.due(now).await.unwrap().is_empty());
        let due = notifier.due(now + Duration::seconds(600)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, id);
        assert_eq!(due[0].fire_at, now.timestamp() + 600);
    }

    #[tokio::test]
    async fn test_mark_delivered_removes_from_due() {
        let now = Utc::now();
        let notifier = notifier_at(now).await;
        let id = notifier
            .schedule(NotificationRequest::immediate("Now", "Body"))
            .await
            .unwrap()
            .unwrap();

        notifier.mark_delivered(&id).await.unwrap();
        assert!(notifier.due(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all_keeps_delivered_history() {
        let now = Utc::now();
        let notifier = notifier_at(now).await;
        let delivered = notifier
            .schedule(NotificationRequest::immediate("Done", "Body"))
            .await
            .unwrap()
            .unwrap();
        notifier.mark_delivered(&delivered).await.unwrap();
        notifier
            .schedule(NotificationRequest::scheduled("Later", "Body", 60))
            .await
            .unwrap();

        notifier.cancel_all().await.unwrap();
        assert!(notifier.pending().await.unwrap().is_empty());

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_notifications")
            .fetch_one(&notifier.pool)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }
}
