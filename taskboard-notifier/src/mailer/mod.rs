/// Mailer trait and email rendering
///
/// The dispatcher is generic over delivery: anything implementing
/// [`Mailer`] can carry an assignment email to its recipient. Production
/// uses [`http::HttpMailer`], which posts to a mail relay; tests use
/// [`mock::MockMailer`], which records sent mail in memory.
///
/// # Implementations
///
/// - `http`: posts the rendered email as JSON to a relay endpoint
/// - `mock`: in-memory capture with injectable failures

use async_trait::async_trait;
use serde::Serialize;

pub mod http;
pub mod mock;

pub use http::HttpMailer;
pub use mock::MockMailer;

/// Mailer error types
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// Delivery failed
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// The relay rejected the message
    #[error("Relay rejected message: {0}")]
    Rejected(String),
}

/// Mailer result type alias
pub type MailerResult<T> = Result<T, MailerError>;

/// A rendered task-assignment email
///
/// Loaded straight from the outbox join; `subject` and `body_text` render
/// the wire content.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignmentEmail {
    /// Recipient display name
    pub recipient_name: String,

    /// Recipient email address
    pub recipient_email: String,

    /// Title of the assigned task
    pub task_title: String,

    /// Task description, if any
    pub task_description: Option<String>,

    /// Title of the task's project
    pub project_title: String,

    /// Completion flag of the task at render time
    pub is_completed: bool,
}

impl AssignmentEmail {
    /// Renders the subject line
    pub fn subject(&self) -> String {
        format!("New Task Assignment: {}", self.task_title)
    }

    /// Renders the plain-text body
    pub fn body_text(&self) -> String {
        let mut body = format!(
            "Hi {},\n\nYou have been assigned a new task: {}\n",
            self.recipient_name, self.task_title
        );

        if let Some(description) = &self.task_description {
            if !description.is_empty() {
                body.push_str(&format!("\n{}\n", description));
            }
        }

        body.push_str(&format!(
            "\nProject: {}\nStatus: {}\n",
            self.project_title,
            if self.is_completed {
                "Completed"
            } else {
                "Pending"
            }
        ));

        body
    }
}

/// Core Mailer trait
///
/// Implementations deliver a rendered assignment email. Delivery must be
/// idempotent-friendly: the dispatcher may retry a failed send on a fresh
/// outbox row.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns the mailer name, used for logging
    fn name(&self) -> &str;

    /// Delivers an assignment email
    ///
    /// # Errors
    ///
    /// Returns `MailerError` when delivery fails; the dispatcher records
    /// the error on the outbox row.
    async fn send(&self, email: &AssignmentEmail) -> MailerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_email() -> AssignmentEmail {
        AssignmentEmail {
            recipient_name: "Jane".to_string(),
            recipient_email: "jane@example.com".to_string(),
            task_title: "Write the launch post".to_string(),
            task_description: Some("Draft and review before Friday".to_string()),
            project_title: "Website".to_string(),
            is_completed: false,
        }
    }

    #[test]
    fn test_subject_includes_task_title() {
        let email = sample_email();
        assert_eq!(email.subject(), "New Task Assignment: Write the launch post");
    }

    #[test]
    fn test_body_renders_all_fields() {
        let email = sample_email();
        let body = email.body_text();

        assert!(body.contains("Hi Jane,"));
        assert!(body.contains("You have been assigned a new task: Write the launch post"));
        assert!(body.contains("Draft and review before Friday"));
        assert!(body.contains("Project: Website"));
        assert!(body.contains("Status: Pending"));
    }

    #[test]
    fn test_body_status_completed() {
        let email = AssignmentEmail {
            is_completed: true,
            ..sample_email()
        };

        assert!(email.body_text().contains("Status: Completed"));
    }

    #[test]
    fn test_body_omits_empty_description() {
        let email = AssignmentEmail {
            task_description: None,
            ..sample_email()
        };
        let body = email.body_text();

        assert!(body.contains("You have been assigned a new task"));
        assert!(body.contains("Project: Website"));
    }
}
