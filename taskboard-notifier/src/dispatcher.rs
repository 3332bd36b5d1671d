/// Notification dispatcher
///
/// The main delivery loop. Polls the outbox for pending notifications,
/// renders each one, and hands it to the configured mailer, then settles
/// the outbox row with the outcome.
///
/// # Architecture
///
/// ```text
/// Dispatcher
///   ├─> NotificationOutbox: claim pending rows (SKIP LOCKED)
///   ├─> NotificationOutbox: load rendered email per row
///   ├─> Mailer: deliver
///   └─> NotificationOutbox: mark_sent / mark_failed
/// ```
///
/// # Shutdown
///
/// `run` returns once the shutdown token is cancelled. Deliveries in
/// flight are awaited; unclaimed rows stay pending for the next run.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_notifier::dispatcher::NotificationDispatcher;
/// use taskboard_notifier::mailer::MockMailer;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let dispatcher = NotificationDispatcher::new(pool, Arc::new(MockMailer::new()));
/// dispatcher.run().await?;
/// # Ok(())
/// # }
/// ```

use crate::mailer::Mailer;
use crate::outbox::{ClaimedNotification, NotificationOutbox};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Poll interval in seconds when the outbox is empty
    pub poll_interval_secs: u64,

    /// Notifications to claim per batch
    pub batch_size: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            poll_interval_secs: 1,
            batch_size: 10,
        }
    }
}

/// Notification dispatcher
///
/// Coordinates delivery by polling the outbox and driving the mailer.
pub struct NotificationDispatcher {
    /// Outbox reader
    outbox: NotificationOutbox,

    /// Delivery backend
    mailer: Arc<dyn Mailer>,

    /// Configuration
    config: DispatcherConfig,

    /// Shutdown token
    shutdown_token: CancellationToken,
}

impl NotificationDispatcher {
    /// Creates a new dispatcher with default configuration
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self::with_config(db, mailer, DispatcherConfig::default())
    }

    /// Creates a new dispatcher with custom configuration
    pub fn with_config(db: PgPool, mailer: Arc<dyn Mailer>, config: DispatcherConfig) -> Self {
        NotificationDispatcher {
            outbox: NotificationOutbox::new(db),
            mailer,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets the shutdown token
    ///
    /// Used to signal graceful shutdown from external handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the delivery loop until shutdown
    ///
    /// # Errors
    ///
    /// Only fatal setup errors bubble up; per-notification failures are
    /// recorded on the outbox row and the loop keeps going.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(mailer = %self.mailer.name(), "Notification dispatcher starting");

        loop {
            if self.shutdown_token.is_cancelled() {
                tracing::info!("Notification dispatcher shut down");
                break;
            }

            let claimed = match self.outbox.claim_batch(self.config.batch_size).await {
                Ok(claimed) => claimed,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to claim notifications");
                    sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
                    continue;
                }
            };

            if claimed.is_empty() {
                // Idle wait, but wake immediately on shutdown
                tokio::select! {
                    _ = sleep(Duration::from_secs(self.config.poll_interval_secs)) => {}
                    _ = self.shutdown_token.cancelled() => {}
                }
                continue;
            }

            for notification in claimed {
                self.deliver(notification).await;
            }
        }

        Ok(())
    }

    /// Delivers a single claimed notification and settles its row
    async fn deliver(&self, notification: ClaimedNotification) {
        let email = match self.outbox.load_email(notification.id).await {
            Ok(Some(email)) => email,
            Ok(None) => {
                // Task or recipient vanished after enqueue
                tracing::warn!(
                    notification_id = notification.id,
                    "Notification content no longer loadable, dropping"
                );
                if let Err(e) = self
                    .outbox
                    .mark_failed(notification.id, "Content no longer available".to_string())
                    .await
                {
                    tracing::error!(error = %e, "Failed to settle orphaned notification");
                }
                return;
            }
            Err(e) => {
                tracing::error!(
                    notification_id = notification.id,
                    error = %e,
                    "Failed to load notification content"
                );
                if let Err(e) = self.outbox.mark_failed(notification.id, e.to_string()).await {
                    tracing::error!(error = %e, "Failed to settle notification");
                }
                return;
            }
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                if let Err(e) = self.outbox.mark_sent(notification.id).await {
                    tracing::error!(error = %e, "Failed to mark notification as sent");
                }
            }
            Err(e) => {
                tracing::warn!(
                    notification_id = notification.id,
                    recipient = %email.recipient_email,
                    error = %e,
                    "Delivery failed"
                );
                if let Err(e) = self.outbox.mark_failed(notification.id, e.to_string()).await {
                    tracing::error!(error = %e, "Failed to mark notification as failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_config_default() {
        let config = DispatcherConfig::default();
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.batch_size, 10);
    }

    // Delivery against a real outbox requires a database; covered by the
    // integration tests in the api crate.
}
