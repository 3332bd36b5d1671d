/// Project endpoints
///
/// Projects are owned by the user that created them. Anyone authenticated
/// may list and read projects; only the owner may update or delete one.
/// Deleting a project removes its tasks.
///
/// Authorization runs after the existence check on every endpoint, so a
/// missing project is always a 404, never a 403.
///
/// # Endpoints
///
/// - `GET /projects` - Paginated list, relations via `?with=owner,tasks`
/// - `POST /projects` - Create
/// - `GET /projects/:id` - Read with owner and tasks
/// - `PUT /projects/:id` - Partial update (owner only)
/// - `DELETE /projects/:id` - Delete with tasks (owner only)
/// - `GET /projects/:id/users` - Users available for task assignment

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskboard_shared::{
    auth::{
        guard::{self, Action},
        middleware::AuthContext,
    },
    models::{
        project::{CreateProject, Project, UpdateProject},
        task::Task,
        user::UserProfile,
    },
};
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Which relations to embed in project responses
///
/// Parsed from the `with` query parameter. An absent parameter embeds
/// everything; unknown relation names are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationFilter {
    pub owner: bool,
    pub tasks: bool,
}

impl RelationFilter {
    pub fn parse(with: Option<&str>) -> Self {
        match with {
            None => Self {
                owner: true,
                tasks: true,
            },
            Some(raw) => {
                let mut filter = Self {
                    owner: false,
                    tasks: false,
                };
                for part in raw.split(',') {
                    match part.trim() {
                        "owner" => filter.owner = true,
                        "tasks" => filter.tasks = true,
                        _ => {}
                    }
                }
                filter
            }
        }
    }
}

/// Query parameters for a single project read
#[derive(Debug, Deserialize)]
pub struct GetProjectQuery {
    /// Comma-separated relations to embed ("owner", "tasks")
    pub with: Option<String>,
}

/// Query parameters for the project list
#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    /// Page size (default 10, max 100)
    pub limit: Option<i64>,

    /// Rows to skip
    pub offset: Option<i64>,

    /// Comma-separated relations to embed ("owner", "tasks")
    pub with: Option<String>,
}

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    /// Project title
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,
}

/// Update project request
///
/// Absent fields are untouched; `"description": null` clears the
/// description.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,

    /// New description
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Project with optionally embedded relations
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,

    /// Owning user, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserProfile>,

    /// Tasks of the project, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

/// Paginated project list response
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub data: Vec<ProjectResponse>,
    pub limit: i64,
    pub offset: i64,
}

/// Distinguishes a present-but-null field from an absent one
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// List projects
///
/// Returns a page of projects, newest first, with relations embedded per
/// the `with` filter. Relations for the whole page are loaded in two batch
/// queries rather than per project.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> ApiResult<Json<ProjectListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);
    let filter = RelationFilter::parse(query.with.as_deref());

    let projects = Project::list(&state.db, limit, offset).await?;

    // Batch-load relations for the page
    let mut owners: HashMap<i64, UserProfile> = HashMap::new();
    if filter.owner {
        let owner_ids: Vec<i64> = projects.iter().map(|p| p.user_id).collect();
        for profile in UserProfile::find_by_ids(&state.db, &owner_ids).await? {
            owners.insert(profile.id, profile);
        }
    }

    let mut tasks_by_project: HashMap<i64, Vec<Task>> = HashMap::new();
    if filter.tasks {
        let project_ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
        for task in Task::list_by_projects(&state.db, &project_ids).await? {
            tasks_by_project.entry(task.project_id).or_default().push(task);
        }
    }

    let data = projects
        .into_iter()
        .map(|project| {
            let owner = filter.owner.then(|| owners.get(&project.user_id).cloned()).flatten();
            let tasks = filter
                .tasks
                .then(|| tasks_by_project.remove(&project.id).unwrap_or_default());
            ProjectResponse {
                project,
                owner,
                tasks,
            }
        })
        .collect();

    Ok(Json(ProjectListResponse {
        data,
        limit,
        offset,
    }))
}

/// Create a project owned by the authenticated user
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    let project = Project::create(
        &state.db,
        CreateProject {
            title: req.title,
            description: req.description,
            user_id: auth.user_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// Read a single project
///
/// Embeds relations per the same `with` filter as the list: both by
/// default, only the named ones when the parameter is present.
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GetProjectQuery>,
) -> ApiResult<Json<ProjectResponse>> {
    let filter = RelationFilter::parse(query.with.as_deref());

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let owner = if filter.owner {
        UserProfile::find_by_ids(&state.db, &[project.user_id])
            .await?
            .into_iter()
            .next()
    } else {
        None
    };
    let tasks = if filter.tasks {
        Some(Task::list_by_project(&state.db, project.id).await?)
    } else {
        None
    };

    Ok(Json(ProjectResponse {
        project,
        owner,
        tasks,
    }))
}

/// Partially update a project (owner only)
///
/// # Errors
///
/// - `404 Not Found`: No such project (checked before authorization)
/// - `403 Forbidden`: Actor is not the owner
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    guard::require_allowed(guard::project_action(
        auth.user_id,
        project.user_id,
        Action::Update,
    ))?;

    let updated = Project::update(
        &state.db,
        id,
        UpdateProject {
            title: req.title,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(updated))
}

/// Delete a project and all of its tasks (owner only)
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    guard::require_allowed(guard::project_action(
        auth.user_id,
        project.user_id,
        Action::Delete,
    ))?;

    Project::delete(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List users available for task assignment within a project
///
/// Any registered user can be assigned, so this returns the full user
/// directory. Still 404s for a missing project so the endpoint does not
/// leak which project IDs exist.
pub async fn assignable_users(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let users = UserProfile::list(&state.db).await?;

    Ok(Json(users))
}
