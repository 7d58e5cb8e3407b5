//! Error type definitions for the migration tool

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Runner and ledger errors
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised while verifying, applying or reverting migration units
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Unit name does not follow mYYYYMMDD_HHMMSS_description
    #[error("Invalid migration name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Two units report the same name
    #[error("Duplicate migration name: {name}")]
    DuplicateName { name: String },

    /// Units are not listed in ascending timestamp order
    #[error("Migration {next} is listed after {previous} but sorts before it")]
    OutOfOrder { previous: String, next: String },

    /// A unit's up or down failed; the ledger is left untouched for that unit
    #[error("Migration {version} failed during {direction}: {source}")]
    UnitFailed {
        version: String,
        direction: Direction,
        #[source]
        source: sea_orm::DbErr,
    },

    /// The ledger records a unit this binary does not know about
    #[error("Ledger contains unknown migration: {version}")]
    UnknownApplied { version: String },

    /// `down` was requested but nothing is applied
    #[error("No applied migrations to revert")]
    NothingToRevert,
}

/// Which way a unit was being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl MigrationError {
    pub fn invalid_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
