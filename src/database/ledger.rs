//! Migration ledger
//!
//! The framework records every applied unit in `seaql_migrations`
//! (`version`, `applied_at` as epoch seconds) and deletes the row again when
//! the unit is reverted. This module parses unit names, checks their order
//! and reads that table back into typed records.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::sea_query::{Alias, Order, Query};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use sea_orm_migration::SchemaManager;
use serde::Serialize;
use tracing::warn;

use crate::errors::{MigrationError, MigrationResult};

/// Table the framework keeps its ledger in
pub const LEDGER_TABLE: &str = "seaql_migrations";

/// Parsed `mYYYYMMDD_HHMMSS_description` unit name, ordered by time then description
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationId {
    pub timestamp: NaiveDateTime,
    pub description: String,
}

impl FromStr for MigrationId {
    type Err = MigrationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let rest = name
            .strip_prefix('m')
            .ok_or_else(|| MigrationError::invalid_name(name, "must start with 'm'"))?;

        let mut parts = rest.splitn(3, '_');
        let (Some(date), Some(time), Some(description)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(MigrationError::invalid_name(
                name,
                "expected mYYYYMMDD_HHMMSS_description",
            ));
        };

        if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
            return Err(MigrationError::invalid_name(name, "date must be 8 digits"));
        }
        if time.len() != 6 || !time.chars().all(|c| c.is_ascii_digit()) {
            return Err(MigrationError::invalid_name(name, "time must be 6 digits"));
        }
        if description.is_empty()
            || !description
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(MigrationError::invalid_name(
                name,
                "description must be lowercase alphanumerics and underscores",
            ));
        }

        let timestamp = NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
            .map_err(|e| MigrationError::invalid_name(name, format!("bad timestamp: {e}")))?;

        Ok(Self {
            timestamp,
            description: description.to_string(),
        })
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m{}_{}",
            self.timestamp.format("%Y%m%d_%H%M%S"),
            self.description
        )
    }
}

/// One row of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// `None` when the stored version is not a well-formed unit name
    #[serde(skip)]
    pub id: Option<MigrationId>,
    pub version: String,
    pub applied_at: DateTime<Utc>,
}

/// A unit together with when (if ever) it was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: String,
    pub description: String,
    pub timestamp: NaiveDateTime,
    pub applied_at: Option<DateTime<Utc>>,
    /// Recorded in the ledger but not shipped in this binary
    pub unknown: bool,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Parse every name and check they are unique and strictly ascending
pub fn verify_order<'a, I>(names: I) -> MigrationResult<Vec<MigrationId>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut ids: Vec<MigrationId> = Vec::new();
    let mut previous: Option<&str> = None;

    for name in names {
        if !seen.insert(name) {
            return Err(MigrationError::DuplicateName {
                name: name.to_string(),
            });
        }
        let id: MigrationId = name.parse()?;
        if let (Some(last), Some(prev)) = (ids.last(), previous) {
            if id <= *last {
                return Err(MigrationError::OutOfOrder {
                    previous: prev.to_string(),
                    next: name.to_string(),
                });
            }
        }
        ids.push(id);
        previous = Some(name);
    }
    Ok(ids)
}

/// Applied units, oldest version first; empty when the ledger table does not exist yet
pub async fn read_ledger(conn: &DatabaseConnection) -> Result<Vec<MigrationRecord>, DbErr> {
    let manager = SchemaManager::new(conn);
    if !manager.has_table(LEDGER_TABLE).await? {
        return Ok(Vec::new());
    }

    let select = Query::select()
        .columns([Alias::new("version"), Alias::new("applied_at")])
        .from(Alias::new(LEDGER_TABLE))
        .order_by(Alias::new("version"), Order::Asc)
        .to_owned();
    let rows = conn
        .query_all(conn.get_database_backend().build(&select))
        .await?;

    rows.iter()
        .map(|row| {
            let version: String = row.try_get("", "version")?;
            let applied_at: i64 = row.try_get("", "applied_at")?;
            let applied_at = DateTime::<Utc>::from_timestamp(applied_at, 0).ok_or_else(|| {
                DbErr::Custom(format!(
                    "Ledger row {version} has an out-of-range applied_at: {applied_at}"
                ))
            })?;
            Ok(MigrationRecord {
                id: version.parse().ok(),
                version,
                applied_at,
            })
        })
        .collect()
}

/// Join the known units with the ledger.
///
/// Ledger rows for units this binary does not ship are appended (flagged
/// `unknown`) and warned about rather than dropped.
pub fn merge_status(known: &[MigrationId], records: &[MigrationRecord]) -> Vec<MigrationStatus> {
    let mut applied: HashMap<&str, &MigrationRecord> =
        records.iter().map(|r| (r.version.as_str(), r)).collect();

    let mut statuses: Vec<MigrationStatus> = known
        .iter()
        .map(|id| {
            let version = id.to_string();
            let applied_at = applied.remove(version.as_str()).map(|r| r.applied_at);
            MigrationStatus {
                version,
                description: id.description.clone(),
                timestamp: id.timestamp,
                applied_at,
                unknown: false,
            }
        })
        .collect();

    let mut unknown: Vec<&MigrationRecord> = applied.into_values().collect();
    unknown.sort_by(|a, b| a.version.cmp(&b.version));
    for record in unknown {
        warn!(version = %record.version, "Ledger records a migration this binary does not know");
        statuses.push(MigrationStatus {
            version: record.version.clone(),
            description: record
                .id
                .as_ref()
                .map(|id| id.description.clone())
                .unwrap_or_default(),
            timestamp: record
                .id
                .as_ref()
                .map(|id| id.timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH.naive_utc()),
            applied_at: Some(record.applied_at),
            unknown: true,
        });
    }
    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case("m20240212_090000_add_giving_automation_job", "add_giving_automation_job")]
    #[case("m20241101_100000_define_reporting_views", "define_reporting_views")]
    #[case("m20240101_000000_a", "a")]
    fn test_parse_valid_names(#[case] name: &str, #[case] description: &str) {
        let id: MigrationId = name.parse().unwrap();
        assert_eq!(id.description, description);
        assert_eq!(id.to_string(), name);
    }

    #[rstest]
    #[case("20240212_090000_missing_prefix")]
    #[case("m2024021_090000_short_date")]
    #[case("m20240212_0900_short_time")]
    #[case("m20240212_090000_")]
    #[case("m20240212_090000_Upper_Case")]
    #[case("m20241332_090000_bad_month")]
    #[case("mod")]
    fn test_parse_invalid_names(#[case] name: &str) {
        assert!(matches!(
            name.parse::<MigrationId>(),
            Err(MigrationError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_ids_order_by_timestamp() {
        let early: MigrationId = "m20240101_000001_zzz".parse().unwrap();
        let late: MigrationId = "m20240101_000002_aaa".parse().unwrap();
        assert!(early < late);
        assert_eq!(
            early.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 1)
                .unwrap()
        );
    }

    #[test]
    fn test_verify_order_rejects_out_of_order_and_duplicates() {
        assert!(verify_order(["m20240101_000000_a", "m20240102_000000_b"]).is_ok());
        assert!(matches!(
            verify_order(["m20240102_000000_b", "m20240101_000000_a"]),
            Err(MigrationError::OutOfOrder { .. })
        ));
        assert!(matches!(
            verify_order(["m20240101_000000_a", "m20240101_000000_a"]),
            Err(MigrationError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_merge_status_keeps_unknown_rows() {
        let known = verify_order(["m20240101_000000_a", "m20240102_000000_b"]).unwrap();
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let records = vec![
            MigrationRecord {
                id: "m20240101_000000_a".parse().ok(),
                version: "m20240101_000000_a".to_string(),
                applied_at: at,
            },
            MigrationRecord {
                id: "m20231231_000000_removed".parse().ok(),
                version: "m20231231_000000_removed".to_string(),
                applied_at: at,
            },
        ];

        let statuses = merge_status(&known, &records);
        assert_eq!(statuses.len(), 3);
        assert!(statuses[0].is_applied());
        assert!(!statuses[1].is_applied());
        assert!(statuses[2].unknown);
        assert_eq!(statuses[2].description, "removed");
    }

    #[tokio::test]
    async fn test_read_ledger_without_table_is_empty() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        assert!(read_ledger(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_ledger_after_full_run() {
        let db = crate::database::test_support::migrated_db().await;
        let records = read_ledger(&db).await.unwrap();
        let units = crate::database::runner::MigrationRunner::unit_names();

        let versions: Vec<&str> = records.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, units.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(records.iter().all(|r| r.id.is_some()));
        assert_eq!(
            records[0].id.as_ref().map(|id| id.description.as_str()),
            Some("core_schema")
        );
    }
}
