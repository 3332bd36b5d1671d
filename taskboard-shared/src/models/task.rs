/// Task model and database operations
///
/// Tasks belong to exactly one project (`project_id`, immutable) and may be
/// assigned to at most one user (`assigned_to`, nullable). Tasks carry two
/// independent completion signals: the `status` enum and the legacy
/// `is_completed` boolean. The status endpoint touches only the boolean;
/// the two are deliberately not synchronized.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assigned_to BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: i64,

    /// Task title (required, at most 255 characters)
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Optional priority
    pub priority: Option<TaskPriority>,

    /// Legacy completion flag, independent of `status`
    pub is_completed: bool,

    /// Parent project. Immutable after creation.
    pub project_id: i64,

    /// Assigned user, if any (non-owning reference)
    pub assigned_to: Option<i64>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Parent project
    pub project_id: i64,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Workflow status (defaults to `todo` when absent)
    pub status: Option<TaskStatus>,

    /// Optional priority
    pub priority: Option<TaskPriority>,

    /// Optional assignee
    pub assigned_to: Option<i64>,
}

/// Input for a partial task update
///
/// `None` fields are left untouched. `assigned_to` is tri-state: absent
/// (`None`) leaves the assignment alone, `Some(None)` clears it, and
/// `Some(Some(id))` sets it.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description (`Some(None)` clears it)
    pub description: Option<Option<String>>,

    /// New workflow status
    pub status: Option<TaskStatus>,

    /// New priority (`Some(None)` clears it)
    pub priority: Option<Option<TaskPriority>>,

    /// New assignee (`Some(None)` clears it)
    pub assigned_to: Option<Option<i64>>,
}

/// Decides whether an update's assignment change warrants a notification
///
/// A notification is sent only when the request carried `assigned_to`, the
/// value differs from the previous assignee, and the new value is non-null.
/// Re-asserting the current assignee or clearing the assignment stays
/// silent.
pub fn assignment_changed(previous: Option<i64>, requested: Option<Option<i64>>) -> bool {
    match requested {
        Some(Some(new_assignee)) => previous != Some(new_assignee),
        // Absent from the request, or an explicit clear
        _ => false,
    }
}

impl Task {
    /// Creates a new task under a project
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, title, description, status, priority, assigned_to)
            VALUES ($1, $2, $3, COALESCE($4, 'todo'::task_status), $5, $6)
            RETURNING id, title, description, status, priority, is_completed,
                      project_id, assigned_to, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assigned_to)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, is_completed,
                   project_id, assigned_to, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists all tasks of a single project, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, is_completed,
                   project_id, assigned_to, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks for a set of projects
    ///
    /// Used to hydrate a page of projects with their task lists in one
    /// query.
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, is_completed,
                   project_id, assigned_to, created_at, updated_at
            FROM tasks
            WHERE project_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update, touching only the provided fields
    ///
    /// Returns the updated task, or `None` if no task with `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, priority, is_completed, \
             project_id, assigned_to, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Sets the legacy completion flag, leaving the status enum untouched
    ///
    /// Returns the updated task, or `None` if no task with `id` exists.
    pub async fn set_completed(
        pool: &PgPool,
        id: i64,
        is_completed: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET is_completed = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, priority, is_completed,
                      project_id, assigned_to, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_completed)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_status_serde_round_trip() {
        let status: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"in_progress\"");
    }

    #[test]
    fn test_priority_rejects_unknown_value() {
        let result: Result<TaskPriority, _> = serde_json::from_str("\"urgent\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_assignment_changed_new_assignee() {
        // Unassigned -> assigned: notify
        assert!(assignment_changed(None, Some(Some(5))));

        // Reassigned to a different user: notify
        assert!(assignment_changed(Some(5), Some(Some(7))));
    }

    #[test]
    fn test_assignment_changed_silent_cases() {
        // Field absent from the request: no notification
        assert!(!assignment_changed(Some(5), None));
        assert!(!assignment_changed(None, None));

        // Re-asserting the current assignee: no notification
        assert!(!assignment_changed(Some(5), Some(Some(5))));

        // Clearing the assignment: no notification
        assert!(!assignment_changed(Some(5), Some(None)));
        assert!(!assignment_changed(None, Some(None)));
    }
}
