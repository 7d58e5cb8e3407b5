use sea_orm_migration::prelude::*;

use crate::database::changes::{ChangeSet, ServiceJobSpec};
use crate::database::guids;

/// Nightly at 22:00 (seconds minutes hours day-of-month month day-of-week)
pub const GIVING_AUTOMATION_CRON: &str = "0 0 22 * * ?";

/// Schedules the giving automation job that raises giving alerts and
/// refreshes giving journey stages
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        changes
            .add_service_job(&ServiceJobSpec {
                guid: guids::service_job::GIVING_AUTOMATION,
                name: "Giving Automation",
                description: "Job that updates giving classifications and journey stages, \
                              and sends any giving alerts.",
                class: "Rock.Jobs.GivingAutomation",
                cron_expression: GIVING_AUTOMATION_CRON,
                is_active: true,
            })
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        changes
            .delete_service_job(guids::service_job::GIVING_AUTOMATION)
            .await?;
        Ok(())
    }
}
