/// Notification outbox model
///
/// Task-assignment notifications are fire-and-forget: the API inserts a
/// `pending` outbox row and returns immediately; the notifier worker claims
/// rows, delivers the message, and records the outcome. A failed enqueue or
/// delivery never fails the task mutation that triggered it.
///
/// # States
///
/// ```text
/// pending → sending → sent
///                   → failed
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_state AS ENUM ('pending', 'sending', 'sent', 'failed');
///
/// CREATE TABLE notifications (
///     id BIGSERIAL PRIMARY KEY,
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     recipient_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     state notification_state NOT NULL DEFAULT 'pending',
///     error TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     sent_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Delivery state of an outbox row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    /// Waiting to be claimed by the notifier
    Pending,

    /// Claimed by a notifier, delivery in flight
    Sending,

    /// Delivered
    Sent,

    /// Delivery failed (error column holds the reason)
    Failed,
}

impl NotificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationState::Pending => "pending",
            NotificationState::Sending => "sending",
            NotificationState::Sent => "sent",
            NotificationState::Failed => "failed",
        }
    }
}

/// Outbox row for a task-assignment notification
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: i64,

    /// Task whose assignment triggered the notification
    pub task_id: i64,

    /// User to notify (the new assignee)
    pub recipient_id: i64,

    /// Delivery state
    pub state: NotificationState,

    /// Delivery error, if state is Failed
    pub error: Option<String>,

    /// When the row was enqueued
    pub created_at: DateTime<Utc>,

    /// When delivery succeeded (null until sent)
    pub sent_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Enqueues a pending notification for a task's assignee
    pub async fn enqueue(
        pool: &PgPool,
        task_id: i64,
        recipient_id: i64,
    ) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (task_id, recipient_id)
            VALUES ($1, $2)
            RETURNING id, task_id, recipient_id, state, error, created_at, sent_at
            "#,
        )
        .bind(task_id)
        .bind(recipient_id)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Finds a notification by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, task_id, recipient_id, state, error, created_at, sent_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Lists notifications for a task, oldest first
    ///
    /// Mostly useful in tests asserting that exactly one notification was
    /// enqueued for an assignment change.
    pub async fn list_by_task(pool: &PgPool, task_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, task_id, recipient_id, state, error, created_at, sent_at
            FROM notifications
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_as_str() {
        assert_eq!(NotificationState::Pending.as_str(), "pending");
        assert_eq!(NotificationState::Sending.as_str(), "sending");
        assert_eq!(NotificationState::Sent.as_str(), "sent");
        assert_eq!(NotificationState::Failed.as_str(), "failed");
    }

    #[test]
    fn test_state_serde() {
        let state: NotificationState = serde_json::from_str("\"sending\"").unwrap();
        assert_eq!(state, NotificationState::Sending);
    }
}
