/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation
/// - JWT token generation
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
use taskboard_shared::models::user::{CreateUser, User};
use tower::Service as _;

static EMAIL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produces an email no other test run has used
fn unique_email() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let n = EMAIL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}-{}@example.com", std::process::id(), nanos, n)
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
    created_users: Vec<i64>,
}

impl TestContext {
    /// Creates a new test context with a fresh user
    pub async fn new() -> anyhow::Result<Self> {
        // Tests do not need a real secret, only a long enough one
        if std::env::var("JWT_SECRET").is_err() {
            std::env::set_var(
                "JWT_SECRET",
                "integration-test-secret-at-least-32-bytes",
            );
        }

        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let user = User::create(
            &db,
            CreateUser {
                name: "Test User".to_string(),
                email: unique_email(),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await?;

        let claims = Claims::new(user.id, TokenType::Access);
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        let created_users = vec![user.id];

        Ok(TestContext {
            db,
            app,
            config,
            user,
            jwt_token,
            created_users,
        })
    }

    /// Returns authorization header value for the context user
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Creates an additional user and returns it with a bearer token
    pub async fn create_other_user(&mut self, name: &str) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                name: name.to_string(),
                email: unique_email(),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await?;

        let claims = Claims::new(user.id, TokenType::Access);
        let token = create_token(&claims, &self.config.jwt.secret)?;

        self.created_users.push(user.id);

        Ok((user, format!("Bearer {}", token)))
    }

    /// Cleans up test data
    ///
    /// Deleting the projects cascades to tasks and notifications; the
    /// users go last because projects reference them.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM projects WHERE user_id = ANY($1)")
            .bind(&self.created_users)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(&self.created_users)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Sends a JSON request and returns the response
pub async fn send_json(
    ctx: &TestContext,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    ctx.app.clone().call(request).await.unwrap()
}

/// Reads a response body as JSON
pub async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Asserts the status and returns the parsed body, printing the body on
/// mismatch so failures are diagnosable
pub async fn expect_status(
    response: axum::response::Response,
    expected: StatusCode,
) -> serde_json::Value {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&body);

    assert_eq!(status, expected, "unexpected status, body: {}", text);

    if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    }
}
