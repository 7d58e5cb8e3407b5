//! Reporting views over block placement
//!
//! Views capture session state at definition time (search path on
//! PostgreSQL, `sql_mode` on MySQL, ALTER semantics on SQLite), so they are
//! created through [`SqlExecutor::redefine_with_settings`] with a known
//! configuration, and the caller's settings are put back afterwards.

use sea_orm::DatabaseBackend;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::database::executor::{SessionSetting, SqlExecutor};

pub const BLOCK_PLACEMENT_VIEW: &str = "v_block_placement";

const BLOCK_PLACEMENT_SELECT: &str = "\
SELECT b.id AS block_id, b.guid AS block_guid, b.zone AS zone, \
bt.name AS block_type_name, p.id AS page_id, p.internal_name AS page_name, \
l.name AS layout_name \
FROM block b \
JOIN block_type bt ON bt.id = b.block_type_id \
LEFT JOIN page p ON p.id = b.page_id \
LEFT JOIN layout l ON l.id = b.layout_id";

pub struct Migration;
folder_migration_name!();

/// Session configuration the view is defined under
pub fn definition_settings(backend: DatabaseBackend) -> Vec<SessionSetting> {
    match backend {
        DatabaseBackend::Sqlite => vec![SessionSetting::new("legacy_alter_table", "0")],
        DatabaseBackend::Postgres => vec![SessionSetting::new("search_path", "public")],
        DatabaseBackend::MySql => vec![SessionSetting::new(
            "sql_mode",
            "STRICT_TRANS_TABLES,NO_ENGINE_SUBSTITUTION",
        )],
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let executor = SqlExecutor::new(manager.get_connection());
        let statements = vec![
            format!("DROP VIEW IF EXISTS {BLOCK_PLACEMENT_VIEW}"),
            format!("CREATE VIEW {BLOCK_PLACEMENT_VIEW} AS {BLOCK_PLACEMENT_SELECT}"),
        ];
        executor
            .redefine_with_settings(&definition_settings(executor.backend()), &statements)
            .await?;
        info!(version = %self.name(), view = BLOCK_PLACEMENT_VIEW, "Defined reporting view");
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        SqlExecutor::new(manager.get_connection())
            .execute(&format!("DROP VIEW IF EXISTS {BLOCK_PLACEMENT_VIEW}"))
            .await?;
        Ok(())
    }
}
