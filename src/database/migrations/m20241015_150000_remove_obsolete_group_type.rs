//! Retire the legacy serving-team group type and obsolete status values
//!
//! The group type is removed only when no group still uses it; otherwise it
//! is left for an administrator to clean up. Down is empty.

use sea_orm_migration::prelude::*;

use crate::database::changes::ChangeSet;
use crate::database::guids;

#[derive(DeriveMigrationName)]
pub struct Migration;

pub const OBSOLETE_DEFINED_VALUES: &[&str] = &[
    guids::defined_value::RECORD_STATUS_PENDING,
    guids::defined_value::CONNECTION_STATUS_WEB_PROSPECT,
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        changes
            .delete_group_type_best_effort(guids::group_type::LEGACY_SERVING_TEAM)
            .await?;
        for guid in OBSOLETE_DEFINED_VALUES {
            changes.delete_defined_value(guid).await?;
        }
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}
