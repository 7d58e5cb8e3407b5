//! Centralized error handling for the migration tool
//!
//! Migration units and change primitives speak the migration framework's
//! `sea_orm::DbErr`. Everything above the framework (runner, ledger, CLI,
//! configuration) reports through [`AppError`].
//!
//! # Error Categories
//!
//! - **Database Errors**: connection failures and SQL errors from SeaORM
//! - **Migration Errors**: malformed unit names, ordering problems, failed units
//! - **Configuration Errors**: unreadable or invalid settings
//! - **Validation Errors**: bad arguments handed to the runner
//!
//! # Usage
//!
//! ```rust
//! use rock_migrations::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for runner/ledger Results
pub type MigrationResult<T> = Result<T, MigrationError>;
