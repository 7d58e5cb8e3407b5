use sea_orm_migration::prelude::*;

use crate::database::changes::ChangeSet;

/// Rewrites CamelCase routes to their kebab-case replacements
#[derive(DeriveMigrationName)]
pub struct Migration;

/// (legacy route, replacement route)
pub const ROUTE_REMAPS: &[(&str, &str)] = &[
    ("MyAccount", "my-account"),
    ("MyAccount/GivingHistory", "my-account/giving-history"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        for &(legacy, replacement) in ROUTE_REMAPS {
            changes.rename_route(legacy, replacement).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        for &(legacy, replacement) in ROUTE_REMAPS.iter().rev() {
            changes.rename_route(replacement, legacy).await?;
        }
        Ok(())
    }
}
