//! Applies and reverts migration units one at a time
//!
//! Each unit runs inside its own transaction together with the framework's
//! ledger write, so a unit either lands with its ledger row or not at all
//! (on backends with transactional DDL). A failing unit stops the run; the
//! units before it stay applied.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};

use super::ledger::{self, MigrationId, MigrationRecord, MigrationStatus};
use super::migrations::Migrator;
use crate::errors::{AppError, AppResult, Direction, MigrationError, MigrationResult};

/// What a run did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub direction: Direction,
    pub versions: Vec<String>,
    pub elapsed: Duration,
}

impl RunReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            versions: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }
}

pub struct MigrationRunner {
    connection: Arc<DatabaseConnection>,
    verify_names: bool,
}

impl MigrationRunner {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self {
            connection,
            verify_names: true,
        }
    }

    /// Skip the naming/order check before `up` and `down`
    pub fn with_name_verification(mut self, enabled: bool) -> Self {
        self.verify_names = enabled;
        self
    }

    /// Unit names as the migrator lists them
    pub fn unit_names() -> Vec<String> {
        Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Check every unit name is well formed, unique and strictly ascending
    pub fn verify() -> MigrationResult<Vec<MigrationId>> {
        let names = Self::unit_names();
        ledger::verify_order(names.iter().map(String::as_str))
    }

    /// Every known unit with its applied time, followed by unknown ledger rows
    pub async fn status(&self) -> AppResult<Vec<MigrationStatus>> {
        let known = Self::verify()?;
        let records = ledger::read_ledger(&self.connection).await?;
        Ok(ledger::merge_status(&known, &records))
    }

    /// Apply up to `steps` pending units in order (all of them when `None`)
    pub async fn up(&self, steps: Option<u32>) -> AppResult<RunReport> {
        if steps == Some(0) {
            return Err(AppError::validation("steps must be at least 1"));
        }
        let started = Instant::now();
        let names = self.checked_names()?;
        let records = self.checked_ledger(&names).await?;

        let applied: HashSet<&str> = records.iter().map(|r| r.version.as_str()).collect();
        let pending: Vec<&String> = names
            .iter()
            .filter(|name| !applied.contains(name.as_str()))
            .collect();
        let take = steps.map_or(pending.len(), |s| s as usize);

        let mut report = RunReport::new(Direction::Up);
        if pending.is_empty() {
            info!("Database is up to date; no pending migrations");
        }
        for version in pending.into_iter().take(take) {
            self.run_one(version, Direction::Up).await?;
            report.versions.push(version.clone());
        }

        report.elapsed = started.elapsed();
        info!(
            applied = report.versions.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Migration run finished"
        );
        Ok(report)
    }

    /// Revert the `steps` most recently applied units, newest first
    pub async fn down(&self, steps: u32) -> AppResult<RunReport> {
        if steps == 0 {
            return Err(AppError::validation("steps must be at least 1"));
        }
        let started = Instant::now();
        let names = self.checked_names()?;
        let records = self.checked_ledger(&names).await?;
        if records.is_empty() {
            return Err(MigrationError::NothingToRevert.into());
        }

        let applied: HashSet<&str> = records.iter().map(|r| r.version.as_str()).collect();
        let revertible: Vec<&String> = names
            .iter()
            .rev()
            .filter(|name| applied.contains(name.as_str()))
            .take(steps as usize)
            .collect();

        let mut report = RunReport::new(Direction::Down);
        for version in revertible {
            self.run_one(version, Direction::Down).await?;
            report.versions.push(version.clone());
        }

        report.elapsed = started.elapsed();
        info!(
            reverted = report.versions.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Migration rollback finished"
        );
        Ok(report)
    }

    fn checked_names(&self) -> MigrationResult<Vec<String>> {
        if self.verify_names {
            Self::verify()?;
        }
        Ok(Self::unit_names())
    }

    /// The ledger, refusing to run against rows this binary cannot account for
    async fn checked_ledger(&self, names: &[String]) -> AppResult<Vec<MigrationRecord>> {
        let records = ledger::read_ledger(&self.connection).await?;
        let known: HashSet<&str> = names.iter().map(String::as_str).collect();
        if let Some(unknown) = records.iter().find(|r| !known.contains(r.version.as_str())) {
            return Err(MigrationError::UnknownApplied {
                version: unknown.version.clone(),
            }
            .into());
        }
        Ok(records)
    }

    /// Run the next unit in `direction` inside a transaction
    async fn run_one(&self, version: &str, direction: Direction) -> AppResult<()> {
        let started = Instant::now();
        info!(version, %direction, "Running migration");

        let txn = self.connection.begin().await?;
        let outcome: Result<(), DbErr> = match direction {
            Direction::Up => Migrator::up(&txn, Some(1)).await,
            Direction::Down => Migrator::down(&txn, Some(1)).await,
        };

        match outcome {
            Ok(()) => {
                txn.commit().await?;
                info!(
                    version,
                    %direction,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Migration complete"
                );
                Ok(())
            }
            Err(source) => {
                if let Err(e) = txn.rollback().await {
                    warn!(version, "Rollback after failed migration also failed: {}", e);
                } else {
                    debug!(version, "Rolled back failed migration");
                }
                Err(MigrationError::UnitFailed {
                    version: version.to_string(),
                    direction,
                    source,
                }
                .into())
            }
        }
    }
}
