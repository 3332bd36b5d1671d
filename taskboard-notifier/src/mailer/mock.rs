/// Mock mailer for tests
///
/// Records every sent email in memory and can be told to fail, so tests
/// can assert both the happy path and the failed-delivery bookkeeping
/// without a relay.

use super::{AssignmentEmail, Mailer, MailerError, MailerResult};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory mailer
#[derive(Default)]
pub struct MockMailer {
    /// Emails accepted so far
    sent: Mutex<Vec<AssignmentEmail>>,

    /// When set, every send fails with this message
    failure: Mutex<Option<String>>,
}

impl MockMailer {
    /// Creates a mock mailer that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail with the given message
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Returns the emails sent so far
    pub fn sent(&self) -> Vec<AssignmentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns how many emails were accepted
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, email: &AssignmentEmail) -> MailerResult<()> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(MailerError::DeliveryFailed(message));
        }

        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_email() -> AssignmentEmail {
        AssignmentEmail {
            recipient_name: "Jane".to_string(),
            recipient_email: "jane@example.com".to_string(),
            task_title: "Task".to_string(),
            task_description: None,
            project_title: "Project".to_string(),
            is_completed: false,
        }
    }

    #[tokio::test]
    async fn test_mock_records_sent_mail() {
        let mailer = MockMailer::new();

        mailer.send(&sample_email()).await.unwrap();
        mailer.send(&sample_email()).await.unwrap();

        assert_eq!(mailer.sent_count(), 2);
        assert_eq!(mailer.sent()[0].recipient_email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_mock_injected_failure() {
        let mailer = MockMailer::new();
        mailer.fail_with("relay down");

        let result = mailer.send(&sample_email()).await;

        assert!(matches!(result, Err(MailerError::DeliveryFailed(_))));
        assert_eq!(mailer.sent_count(), 0);
    }
}
