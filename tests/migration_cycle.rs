//! Full apply / revert cycles through the runner against in-memory SQLite

use sea_orm::{ConnectionTrait, Database as SeaOrmDatabase, Statement};

use rock_migrations::database::runner::MigrationRunner;
use rock_migrations::database::{Database, ledger};
use rock_migrations::errors::{AppError, MigrationError};

async fn fresh() -> Database {
    let conn = SeaOrmDatabase::connect("sqlite::memory:").await.unwrap();
    Database::from_connection(conn)
}

async fn ledger_versions(db: &Database) -> Vec<String> {
    ledger::read_ledger(&db.connection)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.version)
        .collect()
}

#[tokio::test]
async fn test_up_down_up_keeps_ledger_in_step() {
    let db = fresh().await;
    let runner = db.runner();
    let units = MigrationRunner::unit_names();

    let report = runner.up(None).await.unwrap();
    assert_eq!(report.versions, units);
    assert_eq!(ledger_versions(&db).await, units);

    // Nothing left to apply
    assert!(runner.up(None).await.unwrap().versions.is_empty());

    let report = runner.down(u32::MAX).await.unwrap();
    let mut reversed = units.clone();
    reversed.reverse();
    assert_eq!(report.versions, reversed);
    assert!(ledger_versions(&db).await.is_empty());

    let report = runner.up(None).await.unwrap();
    assert_eq!(report.versions, units);
    assert_eq!(ledger_versions(&db).await, units);
}

#[tokio::test]
async fn test_steps_limit_up_and_down() {
    let db = fresh().await;
    let runner = db.runner();
    let units = MigrationRunner::unit_names();

    runner.up(Some(3)).await.unwrap();
    assert_eq!(ledger_versions(&db).await, units[..3].to_vec());

    let report = runner.down(1).await.unwrap();
    assert_eq!(report.versions, vec![units[2].clone()]);
    assert_eq!(ledger_versions(&db).await, units[..2].to_vec());

    let statuses = runner.status().await.unwrap();
    assert_eq!(statuses.len(), units.len());
    assert_eq!(statuses.iter().filter(|s| s.is_applied()).count(), 2);
}

#[tokio::test]
async fn test_down_with_nothing_applied() {
    let db = fresh().await;
    let err = db.runner().down(1).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Migration(MigrationError::NothingToRevert)
    ));
}

#[tokio::test]
async fn test_unknown_ledger_rows_are_reported_not_dropped() {
    let db = fresh().await;
    let runner = db.runner();
    runner.up(Some(1)).await.unwrap();

    db.connection
        .execute(Statement::from_string(
            db.backend(),
            "INSERT INTO seaql_migrations (version, applied_at) \
             VALUES ('m20200101_000000_retired_unit', 1600000000)"
                .to_string(),
        ))
        .await
        .unwrap();

    let statuses = runner.status().await.unwrap();
    let unknown: Vec<_> = statuses.iter().filter(|s| s.unknown).collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].version, "m20200101_000000_retired_unit");

    let err = runner.up(None).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Migration(MigrationError::UnknownApplied { .. })
    ));
}

#[tokio::test]
async fn test_failed_unit_is_not_recorded() {
    let db = fresh().await;
    let runner = db.runner();
    runner.up(Some(2)).await.unwrap();

    // The third unit inserts into service_job
    db.connection
        .execute(Statement::from_string(
            db.backend(),
            r#"DROP TABLE "service_job""#.to_string(),
        ))
        .await
        .unwrap();

    let err = runner.up(Some(1)).await.unwrap_err();
    match err {
        AppError::Migration(MigrationError::UnitFailed { version, .. }) => {
            assert_eq!(version, MigrationRunner::unit_names()[2]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ledger_versions(&db).await.len(), 2);
}
