/// Notification outbox reader
///
/// Polls the notifications table for pending rows and claims them for
/// delivery. Claiming uses `FOR UPDATE SKIP LOCKED` so several notifier
/// instances can run against the same database without handing the same
/// notification to two of them.
///
/// # Lifecycle
///
/// ```text
/// pending --claim_batch--> sending --mark_sent----> sent
///                                  --mark_failed--> failed
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_notifier::outbox::NotificationOutbox;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let outbox = NotificationOutbox::new(pool);
///
/// loop {
///     let claimed = outbox.claim_batch(10).await?;
///     for notification in claimed {
///         println!("Claimed notification: {}", notification.id);
///         // Deliver...
///     }
///     tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
/// }
/// # Ok(())
/// # }
/// ```

use crate::mailer::AssignmentEmail;
use sqlx::PgPool;
use taskboard_shared::models::notification::NotificationState;
use thiserror::Error;

/// Outbox error
#[derive(Debug, Error)]
pub enum OutboxError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Notification not found or not in the expected state
    #[error("Notification not found: {0}")]
    NotificationNotFound(i64),
}

/// A claimed outbox row, ready for delivery
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimedNotification {
    /// Notification ID
    pub id: i64,

    /// Task whose assignment triggered the notification
    pub task_id: i64,

    /// User to notify
    pub recipient_id: i64,
}

/// Notification outbox reader
pub struct NotificationOutbox {
    /// Database connection pool
    db: PgPool,
}

impl NotificationOutbox {
    /// Creates a new outbox reader
    pub fn new(db: PgPool) -> Self {
        NotificationOutbox { db }
    }

    /// Claims pending notifications for delivery
    ///
    /// Atomically transitions up to `limit` rows from `pending` to
    /// `sending`, oldest first, and returns them. Rows locked by another
    /// notifier are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn claim_batch(&self, limit: usize) -> Result<Vec<ClaimedNotification>, OutboxError> {
        let claimed = sqlx::query_as::<_, ClaimedNotification>(
            r#"
            WITH pending_notifications AS (
                SELECT id
                FROM notifications
                WHERE state = $1
                ORDER BY created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE notifications
            SET state = $3
            FROM pending_notifications
            WHERE notifications.id = pending_notifications.id
            RETURNING
                notifications.id,
                notifications.task_id,
                notifications.recipient_id
            "#,
        )
        .bind(NotificationState::Pending)
        .bind(limit as i64)
        .bind(NotificationState::Sending)
        .fetch_all(&self.db)
        .await?;

        if !claimed.is_empty() {
            tracing::info!(count = claimed.len(), "Claimed notifications");
        }

        Ok(claimed)
    }

    /// Loads the rendered email content for a claimed notification
    ///
    /// Joins the task, its project, and the recipient. Returns `None` when
    /// the task or recipient vanished between enqueue and delivery (the
    /// cascade on task deletion usually removes the outbox row with it,
    /// but a claimed row can outlive its task).
    pub async fn load_email(&self, notification_id: i64) -> Result<Option<AssignmentEmail>, OutboxError> {
        let email = sqlx::query_as::<_, AssignmentEmail>(
            r#"
            SELECT
                u.name AS recipient_name,
                u.email AS recipient_email,
                t.title AS task_title,
                t.description AS task_description,
                p.title AS project_title,
                t.is_completed
            FROM notifications n
            JOIN tasks t ON t.id = n.task_id
            JOIN projects p ON p.id = t.project_id
            JOIN users u ON u.id = n.recipient_id
            WHERE n.id = $1
            "#,
        )
        .bind(notification_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(email)
    }

    /// Marks a claimed notification as delivered
    ///
    /// # Errors
    ///
    /// Returns `NotificationNotFound` if the row is not in `sending` state
    pub async fn mark_sent(&self, notification_id: i64) -> Result<(), OutboxError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET state = $2,
                sent_at = NOW()
            WHERE id = $1 AND state = $3
            "#,
        )
        .bind(notification_id)
        .bind(NotificationState::Sent)
        .bind(NotificationState::Sending)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotificationNotFound(notification_id));
        }

        tracing::info!(notification_id, "Notification marked as sent");
        Ok(())
    }

    /// Marks a claimed notification as failed, recording the error
    ///
    /// # Errors
    ///
    /// Returns `NotificationNotFound` if the row is not in `sending` state
    pub async fn mark_failed(&self, notification_id: i64, error: String) -> Result<(), OutboxError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET state = $2,
                error = $3
            WHERE id = $1 AND state = $4
            "#,
        )
        .bind(notification_id)
        .bind(NotificationState::Failed)
        .bind(error)
        .bind(NotificationState::Sending)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OutboxError::NotificationNotFound(notification_id));
        }

        tracing::warn!(notification_id, "Notification marked as failed");
        Ok(())
    }

    /// Counts notifications waiting to be claimed
    pub async fn pending_count(&self) -> Result<i64, OutboxError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE state = $1
            "#,
        )
        .bind(NotificationState::Pending)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }
}

impl Clone for NotificationOutbox {
    fn clone(&self) -> Self {
        NotificationOutbox {
            db: self.db.clone(),
        }
    }
}
