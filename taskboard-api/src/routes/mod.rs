/// API route handlers
///
/// Route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me)
/// - `projects`: Project CRUD and assignable users
/// - `tasks`: Task CRUD, status toggling, and assignment notifications

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
