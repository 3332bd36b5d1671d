/// Authentication and authorization utilities
///
/// This module provides the security primitives for Taskboard:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Axum authentication context and errors
/// - [`guard`]: the pure ownership authorization guard
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing with access/refresh expirations
/// - **Authorization**: pure equality checks on ownership, consulted
///   uniformly by every mutating endpoint

pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod password;
