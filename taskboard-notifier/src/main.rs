//! # Taskboard Notifier
//!
//! Background worker that delivers task-assignment notifications. The API
//! enqueues outbox rows; this worker claims them with `SKIP LOCKED`,
//! renders the assignment email, and posts it to the mail relay.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-notifier
//! ```

use std::sync::Arc;
use taskboard_notifier::{
    config::Config,
    dispatcher::{DispatcherConfig, NotificationDispatcher},
    mailer::HttpMailer,
};
use taskboard_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_notifier=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard Notifier v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database_url.clone(),
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let mailer = Arc::new(HttpMailer::new(
        config.relay_url.clone(),
        config.from_address.clone(),
    )?);

    let dispatcher = NotificationDispatcher::with_config(
        db,
        mailer,
        DispatcherConfig {
            poll_interval_secs: config.poll_interval_secs,
            batch_size: config.batch_size,
        },
    );

    let shutdown_token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received, stopping dispatcher...");
        shutdown_token.cancel();
    });

    dispatcher.run().await?;

    Ok(())
}
