//! Move every legacy transaction list block onto the replacement block type
//!
//! Matching attribute values follow each block. `ContextEntityType` is not
//! carried over because the replacement block resolves its context from the
//! page. Down is a no-op: the legacy block type is left in place, but values
//! that were dropped during the swap cannot be restored.

use sea_orm_migration::prelude::*;

use crate::database::changes::ChangeSet;
use crate::database::guids;

#[derive(DeriveMigrationName)]
pub struct Migration;

pub const EXCLUDED_KEYS: &[&str] = &["ContextEntityType"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        changes
            .swap_block_type(
                guids::block_type::LEGACY_TRANSACTION_LIST,
                guids::block_type::TRANSACTION_LIST,
                EXCLUDED_KEYS,
            )
            .await?;
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}
