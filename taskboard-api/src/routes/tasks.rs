/// Task endpoints
///
/// Tasks are created under a project by its owner and may be mutated by the
/// project owner or the task's current assignee. Assigning a task to a new
/// user enqueues a fire-and-forget notification; a failed enqueue never
/// fails the mutation that triggered it.
///
/// As with projects, the existence check runs before authorization, so a
/// missing task is always a 404.
///
/// # Endpoints
///
/// - `GET /projects/:id/tasks` - List a project's tasks
/// - `POST /projects/:id/tasks` - Create a task (project owner only)
/// - `GET /tasks/:id` - Read
/// - `PUT /tasks/:id` - Partial update (owner or assignee)
/// - `PATCH /tasks/:id/status` - Toggle the completion flag (owner or assignee)
/// - `DELETE /tasks/:id` - Delete (owner or assignee)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::projects::double_option,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use taskboard_shared::{
    auth::{
        guard::{self, Action},
        middleware::AuthContext,
    },
    models::{
        notification::Notification,
        project::Project,
        task::{assignment_changed, CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
        user::UserProfile,
    },
};
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Workflow status (defaults to "todo")
    pub status: Option<TaskStatus>,

    /// Optional priority
    pub priority: Option<TaskPriority>,

    /// Optional assignee; empty string and 0 are treated as unassigned
    #[serde(default, deserialize_with = "de_assignee")]
    pub assigned_to: Option<Option<i64>>,
}

/// Update task request
///
/// Absent fields are untouched. `description`, `priority`, and
/// `assigned_to` distinguish "absent" from "null": an explicit null clears
/// the stored value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,

    /// New description
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// New workflow status
    pub status: Option<TaskStatus>,

    /// New priority
    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<TaskPriority>>,

    /// New assignee; empty string, 0, and null all clear the assignment
    #[serde(default, deserialize_with = "de_assignee")]
    pub assigned_to: Option<Option<i64>>,
}

/// Status toggle request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New value of the completion flag
    pub is_completed: bool,
}

/// Task with its assignee embedded
///
/// Read endpoints return the assigned user's profile alongside the raw
/// `assigned_to` id; `assignee` is null for unassigned tasks.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,

    /// Profile of the assigned user, if any
    pub assignee: Option<UserProfile>,
}

/// Normalizes the `assigned_to` field of a request
///
/// Clients send the assignee as a number, a numeric string, an empty
/// string, 0, or null. Everything that doesn't name a user collapses to
/// "unassigned". The outer Option distinguishes an absent field from a
/// present one.
pub(crate) fn de_assignee<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    let assignee = match value {
        serde_json::Value::Null => None,
        serde_json::Value::Number(n) => {
            let id = n
                .as_i64()
                .ok_or_else(|| D::Error::custom("assigned_to must be an integer"))?;
            (id > 0).then_some(id)
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                let id = trimmed
                    .parse::<i64>()
                    .map_err(|_| D::Error::custom("assigned_to must be an integer"))?;
                (id > 0).then_some(id)
            }
        }
        _ => return Err(D::Error::custom("assigned_to must be an integer or null")),
    };

    Ok(Some(assignee))
}

/// Enqueues an assignment notification without failing the caller
///
/// The outbox insert is best-effort: on error the task mutation has
/// already committed, so the failure is only logged.
async fn notify_assignment(db: &PgPool, task_id: i64, recipient_id: i64) {
    if let Err(e) = Notification::enqueue(db, task_id, recipient_id).await {
        tracing::warn!(
            task_id,
            recipient_id,
            error = %e,
            "Failed to enqueue assignment notification"
        );
    }
}

/// Hydrates a batch of tasks with their assignee profiles
///
/// Profiles for the whole batch are loaded in one query.
async fn hydrate_assignees(db: &PgPool, tasks: Vec<Task>) -> Result<Vec<TaskResponse>, ApiError> {
    let assignee_ids: Vec<i64> = tasks.iter().filter_map(|t| t.assigned_to).collect();

    let mut profiles: HashMap<i64, UserProfile> = HashMap::new();
    for profile in UserProfile::find_by_ids(db, &assignee_ids).await? {
        profiles.insert(profile.id, profile);
    }

    let hydrated = tasks
        .into_iter()
        .map(|task| {
            let assignee = task.assigned_to.and_then(|id| profiles.get(&id).cloned());
            TaskResponse { task, assignee }
        })
        .collect();

    Ok(hydrated)
}

/// Loads a task and the owner of its parent project
async fn load_task_with_owner(db: &PgPool, task_id: i64) -> Result<(Task, i64), ApiError> {
    let task = Task::find_by_id(db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    // The FK guarantees the project exists
    let project = Project::find_by_id(db, task.project_id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Task references missing project".to_string()))?;

    Ok((task, project.user_id))
}

/// List all tasks of a project with their assignees, oldest first
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let tasks = Task::list_by_project(&state.db, project_id).await?;

    Ok(Json(hydrate_assignees(&state.db, tasks).await?))
}

/// Create a task under a project (project owner only)
///
/// When the new task carries an assignee, a notification is enqueued for
/// them.
///
/// # Errors
///
/// - `404 Not Found`: No such project (checked before authorization)
/// - `403 Forbidden`: Actor does not own the project
/// - `422 Unprocessable Entity`: Validation failed or assignee unknown
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<i64>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    guard::require_allowed(guard::task_action(
        auth.user_id,
        project.user_id,
        None,
        Action::Create,
    ))?;

    let assigned_to = req.assigned_to.flatten();

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id,
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assigned_to,
        },
    )
    .await?;

    if let Some(recipient) = task.assigned_to {
        notify_assignment(&state.db, task.id, recipient).await;
    }

    Ok((StatusCode::CREATED, Json(task)))
}

/// Read a single task with its assignee
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let assignee = match task.assigned_to {
        Some(assignee_id) => UserProfile::find_by_ids(&state.db, &[assignee_id])
            .await?
            .into_iter()
            .next(),
        None => None,
    };

    Ok(Json(TaskResponse { task, assignee }))
}

/// Partially update a task (project owner or current assignee)
///
/// A notification is enqueued only when the request reassigns the task to
/// a different, non-null user. Re-asserting the current assignee or
/// clearing the assignment stays silent.
///
/// # Errors
///
/// - `404 Not Found`: No such task (checked before authorization)
/// - `403 Forbidden`: Actor is neither owner nor assignee
/// - `422 Unprocessable Entity`: Validation failed or assignee unknown
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let (task, owner_id) = load_task_with_owner(&state.db, id).await?;

    guard::require_allowed(guard::task_action(
        auth.user_id,
        owner_id,
        task.assigned_to,
        Action::Update,
    ))?;

    // Decide on the notification against the pre-update assignee
    let notify = assignment_changed(task.assigned_to, req.assigned_to);

    let updated = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assigned_to: req.assigned_to,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if notify {
        if let Some(recipient) = updated.assigned_to {
            notify_assignment(&state.db, updated.id, recipient).await;
        }
    }

    Ok(Json(updated))
}

/// Toggle the completion flag (project owner or current assignee)
///
/// Only touches `is_completed`; the workflow status enum is deliberately
/// left alone.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Task>> {
    let (task, owner_id) = load_task_with_owner(&state.db, id).await?;

    guard::require_allowed(guard::task_action(
        auth.user_id,
        owner_id,
        task.assigned_to,
        Action::Update,
    ))?;

    let updated = Task::set_completed(&state.db, id, req.is_completed)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a task (project owner or current assignee)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let (task, owner_id) = load_task_with_owner(&state.db, id).await?;

    guard::require_allowed(guard::task_action(
        auth.user_id,
        owner_id,
        task.assigned_to,
        Action::Delete,
    ))?;

    Task::delete(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_update(json: &str) -> UpdateTaskRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_de_assignee_absent() {
        let req = parse_update(r#"{"title": "t"}"#);
        assert_eq!(req.assigned_to, None);
    }

    #[test]
    fn test_de_assignee_null_clears() {
        let req = parse_update(r#"{"assigned_to": null}"#);
        assert_eq!(req.assigned_to, Some(None));
    }

    #[test]
    fn test_de_assignee_number() {
        let req = parse_update(r#"{"assigned_to": 7}"#);
        assert_eq!(req.assigned_to, Some(Some(7)));
    }

    #[test]
    fn test_de_assignee_numeric_string() {
        let req = parse_update(r#"{"assigned_to": "7"}"#);
        assert_eq!(req.assigned_to, Some(Some(7)));
    }

    #[test]
    fn test_de_assignee_empty_string_clears() {
        let req = parse_update(r#"{"assigned_to": ""}"#);
        assert_eq!(req.assigned_to, Some(None));
    }

    #[test]
    fn test_de_assignee_zero_clears() {
        let req = parse_update(r#"{"assigned_to": 0}"#);
        assert_eq!(req.assigned_to, Some(None));

        let req = parse_update(r#"{"assigned_to": "0"}"#);
        assert_eq!(req.assigned_to, Some(None));
    }

    #[test]
    fn test_de_assignee_rejects_garbage() {
        let result: Result<UpdateTaskRequest, _> =
            serde_json::from_str(r#"{"assigned_to": "alice"}"#);
        assert!(result.is_err());

        let result: Result<UpdateTaskRequest, _> =
            serde_json::from_str(r#"{"assigned_to": [1]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_request_priority_double_option() {
        let req = parse_update(r#"{"priority": null}"#);
        assert_eq!(req.priority, Some(None));

        let req = parse_update(r#"{"priority": "high"}"#);
        assert_eq!(req.priority, Some(Some(TaskPriority::High)));

        let req = parse_update(r#"{"title": "t"}"#);
        assert_eq!(req.priority, None);
    }
}
