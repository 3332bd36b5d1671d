/// Database models for Taskboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `project`: Projects, each owned by exactly one user
/// - `task`: Tasks belonging to a project, optionally assigned to a user
/// - `notification`: Outbox rows for task-assignment notifications
///
/// # Ownership
///
/// A project exclusively owns its tasks: deleting a project cascades to its
/// tasks at the store boundary. A task's assignee is a non-owning reference;
/// deleting the assignee clears the assignment but keeps the task.

pub mod notification;
pub mod project;
pub mod task;
pub mod user;
