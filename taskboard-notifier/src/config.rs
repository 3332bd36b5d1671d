/// Configuration management for the notifier
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `MAIL_RELAY_URL`: HTTP relay endpoint for outgoing mail (required)
/// - `MAIL_FROM`: Sender address (default: noreply@taskboard.local)
/// - `NOTIFIER_POLL_INTERVAL_SECS`: Idle poll interval (default: 1)
/// - `NOTIFIER_BATCH_SIZE`: Notifications claimed per batch (default: 10)

use std::env;

/// Notifier configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// HTTP relay endpoint for outgoing mail
    pub relay_url: String,

    /// Sender address
    pub from_address: String,

    /// Idle poll interval in seconds
    pub poll_interval_secs: u64,

    /// Notifications claimed per batch
    pub batch_size: usize,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let relay_url = env::var("MAIL_RELAY_URL")
            .map_err(|_| anyhow::anyhow!("MAIL_RELAY_URL environment variable is required"))?;

        let from_address =
            env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@taskboard.local".to_string());

        let poll_interval_secs = env::var("NOTIFIER_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u64>()?;

        let batch_size = env::var("NOTIFIER_BATCH_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<usize>()?;

        Ok(Self {
            database_url,
            relay_url,
            from_address,
            poll_interval_secs,
            batch_size,
        })
    }
}
