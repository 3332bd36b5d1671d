//! # Taskboard Notifier Library
//!
//! Delivers task-assignment notifications enqueued by the API. The API
//! writes outbox rows; this worker claims them in batches, renders the
//! assignment email, and hands it to a mailer.
//!
//! ## Modules
//!
//! - `config`: Configuration management
//! - `outbox`: Claiming and settling notification outbox rows
//! - `mailer`: The `Mailer` trait and its HTTP and mock implementations
//! - `dispatcher`: The polling delivery loop

pub mod config;
pub mod dispatcher;
pub mod mailer;
pub mod outbox;
