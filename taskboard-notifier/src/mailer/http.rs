/// HTTP relay mailer
///
/// Posts rendered emails as JSON to a mail relay endpoint. The relay
/// handles actual SMTP delivery; this keeps the notifier free of mail
/// server configuration.

use super::{AssignmentEmail, Mailer, MailerError, MailerResult};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Wire payload sent to the relay
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    body: String,
}

/// Mailer that posts to an HTTP mail relay
pub struct HttpMailer {
    client: reqwest::Client,

    /// Relay endpoint accepting POSTed messages
    relay_url: String,

    /// Sender address put on every message
    from_address: String,
}

impl HttpMailer {
    /// Creates a new HTTP mailer
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(relay_url: String, from_address: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(HttpMailer {
            client,
            relay_url,
            from_address,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, email: &AssignmentEmail) -> MailerResult<()> {
        let message = RelayMessage {
            from: &self.from_address,
            to: &email.recipient_email,
            subject: email.subject(),
            body: email.body_text(),
        };

        let response = self
            .client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailerError::DeliveryFailed(format!("Relay request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(MailerError::Rejected(format!("{}: {}", status, detail)));
        }

        tracing::debug!(to = %email.recipient_email, "Email accepted by relay");
        Ok(())
    }
}
