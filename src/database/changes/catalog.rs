//! Entity and field types, categories, defined types and values, service
//! jobs, system communications, Lava shortcodes and group types

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ConnectionTrait, DbErr, TransactionTrait};
use tracing::{debug, info, warn};

use super::{ChangeSet, Upserted, normalize_guid};
use crate::database::schema::{
    Category, DefinedType, DefinedValue, EntityType, FieldType, Group, GroupType, GroupTypeRole,
    LavaShortcode, ServiceJob, SystemCommunication,
};

#[derive(Debug, Clone)]
pub struct EntityTypeSpec<'a> {
    pub guid: &'a str,
    pub name: &'a str,
    pub friendly_name: &'a str,
    pub is_entity: bool,
    pub is_secured: bool,
}

#[derive(Debug, Clone)]
pub struct FieldTypeSpec<'a> {
    pub guid: &'a str,
    pub name: &'a str,
    pub class: &'a str,
}

/// Category scoped to an entity type and an optional qualifier
#[derive(Debug, Clone)]
pub struct CategorySpec<'a> {
    pub guid: &'a str,
    pub entity_type_guid: Option<&'a str>,
    pub qualifier_column: Option<&'a str>,
    pub qualifier_value: Option<&'a str>,
    pub name: &'a str,
    pub icon_css_class: &'a str,
    pub order: i32,
}

#[derive(Debug, Clone)]
pub struct DefinedTypeSpec<'a> {
    pub guid: &'a str,
    pub category_guid: Option<&'a str>,
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone)]
pub struct DefinedValueSpec<'a> {
    pub guid: &'a str,
    pub defined_type_guid: &'a str,
    pub value: &'a str,
    pub description: &'a str,
    pub order: i32,
}

#[derive(Debug, Clone)]
pub struct ServiceJobSpec<'a> {
    pub guid: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub class: &'a str,
    pub cron_expression: &'a str,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct SystemCommunicationSpec<'a> {
    pub guid: &'a str,
    pub category_guid: Option<&'a str>,
    pub title: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Clone)]
pub struct LavaShortcodeSpec<'a> {
    pub guid: &'a str,
    pub name: &'a str,
    pub tag_name: &'a str,
    /// 1 = inline, 2 = block
    pub tag_type: i32,
    pub description: &'a str,
    pub markup: &'a str,
    pub parameters: &'a str,
}

impl<C: ConnectionTrait> ChangeSet<'_, C> {
    pub async fn upsert_entity_type(&self, spec: &EntityTypeSpec<'_>) -> Result<Upserted, DbErr> {
        self.upsert_by_guid(
            EntityType::Table,
            spec.guid,
            vec![
                (EntityType::Name, spec.name.into()),
                (EntityType::FriendlyName, spec.friendly_name.into()),
                (EntityType::IsEntity, spec.is_entity.into()),
                (EntityType::IsSecured, spec.is_secured.into()),
            ],
        )
        .await
    }

    pub async fn upsert_field_type(&self, spec: &FieldTypeSpec<'_>) -> Result<Upserted, DbErr> {
        self.upsert_by_guid(
            FieldType::Table,
            spec.guid,
            vec![
                (FieldType::Name, spec.name.into()),
                (FieldType::Class, spec.class.into()),
                (FieldType::IsSystem, true.into()),
            ],
        )
        .await
    }

    pub async fn upsert_category(&self, spec: &CategorySpec<'_>) -> Result<Upserted, DbErr> {
        let entity_type_id = match spec.entity_type_guid {
            Some(guid) => Some(self.require_id(EntityType::Table, guid).await?),
            None => None,
        };
        self.upsert_by_guid(
            Category::Table,
            spec.guid,
            vec![
                (Category::EntityTypeId, entity_type_id.into()),
                (
                    Category::EntityTypeQualifierColumn,
                    spec.qualifier_column.map(str::to_owned).into(),
                ),
                (
                    Category::EntityTypeQualifierValue,
                    spec.qualifier_value.map(str::to_owned).into(),
                ),
                (Category::Name, spec.name.into()),
                (Category::IconCssClass, spec.icon_css_class.into()),
                (Category::Order, spec.order.into()),
                (Category::IsSystem, true.into()),
            ],
        )
        .await
    }

    pub async fn upsert_defined_type(&self, spec: &DefinedTypeSpec<'_>) -> Result<Upserted, DbErr> {
        let category_id = match spec.category_guid {
            Some(guid) => Some(self.require_id(Category::Table, guid).await?),
            None => None,
        };
        self.upsert_by_guid(
            DefinedType::Table,
            spec.guid,
            vec![
                (DefinedType::CategoryId, category_id.into()),
                (DefinedType::Name, spec.name.into()),
                (DefinedType::Description, spec.description.into()),
                (DefinedType::IsSystem, true.into()),
            ],
        )
        .await
    }

    pub async fn upsert_defined_value(
        &self,
        spec: &DefinedValueSpec<'_>,
    ) -> Result<Upserted, DbErr> {
        let defined_type_id = self
            .require_id(DefinedType::Table, spec.defined_type_guid)
            .await?;
        self.upsert_by_guid(
            DefinedValue::Table,
            spec.guid,
            vec![
                (DefinedValue::DefinedTypeId, defined_type_id.into()),
                (DefinedValue::Value, spec.value.into()),
                (DefinedValue::Description, spec.description.into()),
                (DefinedValue::Order, spec.order.into()),
                (DefinedValue::IsActive, true.into()),
                (DefinedValue::IsSystem, true.into()),
            ],
        )
        .await
    }

    pub async fn delete_defined_value(&self, guid: &str) -> Result<bool, DbErr> {
        self.delete_by_guid(DefinedValue::Table, guid).await
    }

    /// Insert the job unless a row with its guid already exists.
    ///
    /// An existing job is left untouched so schedules adjusted by an
    /// administrator survive a rerun. Returns whether a row was inserted.
    pub async fn add_service_job(&self, spec: &ServiceJobSpec<'_>) -> Result<bool, DbErr> {
        if self.id_by_guid(ServiceJob::Table, spec.guid).await?.is_some() {
            debug!(version = %self.version(), guid = spec.guid, "Service job already present");
            return Ok(false);
        }

        let insert = Query::insert()
            .into_table(ServiceJob::Table)
            .columns([
                ServiceJob::Guid,
                ServiceJob::Name,
                ServiceJob::Description,
                ServiceJob::Class,
                ServiceJob::CronExpression,
                ServiceJob::IsActive,
                ServiceJob::IsSystem,
                ServiceJob::NotificationStatus,
            ])
            .values_panic([
                normalize_guid(spec.guid)?.into(),
                spec.name.into(),
                spec.description.into(),
                spec.class.into(),
                spec.cron_expression.into(),
                spec.is_active.into(),
                false.into(),
                // notify on failure only
                3.into(),
            ])
            .to_owned();
        self.exec(&insert).await?;
        info!(
            version = %self.version(),
            name = spec.name,
            cron = spec.cron_expression,
            "Added service job"
        );
        Ok(true)
    }

    pub async fn delete_service_job(&self, guid: &str) -> Result<bool, DbErr> {
        self.delete_by_guid(ServiceJob::Table, guid).await
    }

    pub async fn upsert_system_communication(
        &self,
        spec: &SystemCommunicationSpec<'_>,
    ) -> Result<Upserted, DbErr> {
        let category_id = match spec.category_guid {
            Some(guid) => Some(self.require_id(Category::Table, guid).await?),
            None => None,
        };
        self.upsert_by_guid(
            SystemCommunication::Table,
            spec.guid,
            vec![
                (SystemCommunication::CategoryId, category_id.into()),
                (SystemCommunication::Title, spec.title.into()),
                (SystemCommunication::Subject, spec.subject.into()),
                (SystemCommunication::Body, spec.body.into()),
                (SystemCommunication::IsActive, true.into()),
                (SystemCommunication::IsSystem, true.into()),
            ],
        )
        .await
    }

    /// Rewrite subject and body of an existing communication; absent rows are left alone
    pub async fn update_system_communication(
        &self,
        guid: &str,
        subject: &str,
        body: &str,
    ) -> Result<bool, DbErr> {
        let update = Query::update()
            .table(SystemCommunication::Table)
            .values([
                (SystemCommunication::Subject, subject.into()),
                (SystemCommunication::Body, body.into()),
            ])
            .and_where(Expr::col(SystemCommunication::Guid).eq(normalize_guid(guid)?))
            .to_owned();
        let updated = self.exec(&update).await? > 0;
        if !updated {
            debug!(version = %self.version(), guid, "System communication not found; nothing to update");
        }
        Ok(updated)
    }

    pub async fn upsert_lava_shortcode(
        &self,
        spec: &LavaShortcodeSpec<'_>,
    ) -> Result<Upserted, DbErr> {
        self.upsert_by_guid(
            LavaShortcode::Table,
            spec.guid,
            vec![
                (LavaShortcode::Name, spec.name.into()),
                (LavaShortcode::TagName, spec.tag_name.into()),
                (LavaShortcode::TagType, spec.tag_type.into()),
                (LavaShortcode::Description, spec.description.into()),
                (LavaShortcode::Markup, spec.markup.into()),
                (LavaShortcode::Parameters, spec.parameters.into()),
                (LavaShortcode::IsActive, true.into()),
                (LavaShortcode::IsSystem, true.into()),
            ],
        )
        .await
    }

    async fn try_delete_group_type(&self, guid: &str) -> Result<bool, DbErr> {
        let Some(group_type_id) = self.id_by_guid(GroupType::Table, guid).await? else {
            debug!(version = %self.version(), guid, "Group type already gone");
            return Ok(false);
        };

        // Referencing groups are the expected case; detect them without an FK error
        let in_use = Query::select()
            .column(Group::Id)
            .from(Group::Table)
            .and_where(Expr::col(Group::GroupTypeId).eq(group_type_id))
            .limit(1)
            .to_owned();
        if self
            .connection()
            .query_one(self.backend().build(&in_use))
            .await?
            .is_some()
        {
            warn!(
                version = %self.version(),
                guid,
                "Group type still has groups, leaving it in place"
            );
            return Ok(false);
        }

        self.exec(
            &Query::delete()
                .from_table(GroupTypeRole::Table)
                .and_where(Expr::col(GroupTypeRole::GroupTypeId).eq(group_type_id))
                .to_owned(),
        )
        .await?;
        let removed = self.delete_by_guid(GroupType::Table, guid).await?;
        if removed {
            info!(version = %self.version(), guid, "Removed group type");
        }
        Ok(removed)
    }
}

impl<C: ConnectionTrait + TransactionTrait> ChangeSet<'_, C> {
    /// Remove a group type and its roles if nothing still uses it.
    ///
    /// Never fails the unit: groups still referencing the type, or any error
    /// raised by the deletes, are logged and the type is left in place. The
    /// deletes run under a savepoint that is rolled back on error, so the
    /// surrounding transaction stays usable. Returns whether the type was removed.
    pub async fn delete_group_type_best_effort(&self, guid: &str) -> Result<bool, DbErr> {
        let savepoint = self.connection().begin().await?;
        let outcome = ChangeSet::new(&savepoint, self.version())
            .try_delete_group_type(guid)
            .await;
        match outcome {
            Ok(removed) => {
                savepoint.commit().await?;
                Ok(removed)
            }
            Err(e) => {
                warn!(
                    version = %self.version(),
                    guid,
                    "Could not remove group type, leaving it in place: {}", e
                );
                savepoint.rollback().await?;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::guids;
    use crate::database::test_support::migrated_db;
    use sea_orm::{DatabaseConnection, Statement};

    async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
        let row = db
            .query_one(Statement::from_string(db.get_database_backend(), sql.to_string()))
            .await
            .unwrap()
            .unwrap();
        row.try_get_by_index::<i64>(0).unwrap()
    }

    fn job() -> ServiceJobSpec<'static> {
        ServiceJobSpec {
            guid: "0d4e2f61-3a5b-4c7d-8e9f-a0b1c2d3e4f5",
            name: "Rebuild Reporting Views",
            description: "Refreshes the reporting views",
            class: "Rock.Jobs.RebuildReportingViews",
            cron_expression: "0 0 3 * * ?",
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_add_service_job_only_inserts_once() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        let before = count(&db, r#"SELECT COUNT(*) FROM "service_job""#).await;

        assert!(changes.add_service_job(&job()).await.unwrap());
        let mut edited = job();
        edited.cron_expression = "0 0 4 * * ?";
        assert!(!changes.add_service_job(&edited).await.unwrap());

        assert_eq!(count(&db, r#"SELECT COUNT(*) FROM "service_job""#).await, before + 1);
        let cron: Option<String> = changes
            .executor()
            .scalar(
                r#"SELECT "cron_expression" FROM "service_job"
                   WHERE "guid" = '0d4e2f61-3a5b-4c7d-8e9f-a0b1c2d3e4f5'"#,
            )
            .await
            .unwrap();
        assert_eq!(cron.as_deref(), Some("0 0 3 * * ?"));

        assert!(changes.delete_service_job(job().guid).await.unwrap());
        assert!(!changes.delete_service_job(job().guid).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_system_communication_is_noop_when_absent() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");

        let updated = changes
            .update_system_communication("5c7e9a1b-3d5f-4a7c-9e1b-3d5f7a9c1e3b", "Hi", "Body")
            .await
            .unwrap();
        assert!(!updated);

        changes
            .upsert_system_communication(&SystemCommunicationSpec {
                guid: "5c7e9a1b-3d5f-4a7c-9e1b-3d5f7a9c1e3b",
                category_guid: Some(guids::category::FINANCE_COMMUNICATIONS),
                title: "Pledge Reminder",
                subject: "Reminder",
                body: "{{ Person.NickName }}",
            })
            .await
            .unwrap();
        assert!(
            changes
                .update_system_communication("5c7e9a1b-3d5f-4a7c-9e1b-3d5f7a9c1e3b", "Hi", "Body")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_defined_value_round_trip() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        let spec = DefinedValueSpec {
            guid: "7f3a1c5e-9b2d-4e6f-8a1c-3e5f7b9d1a2c",
            defined_type_guid: guids::defined_type::CONNECTION_STATUS,
            value: "Member",
            description: "Regular attender",
            order: 9,
        };

        let first = changes.upsert_defined_value(&spec).await.unwrap();
        let second = changes.upsert_defined_value(&spec).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(changes.delete_defined_value(spec.guid).await.unwrap());
        assert!(!changes.delete_defined_value(spec.guid).await.unwrap());
    }

    #[tokio::test]
    async fn test_category_allows_null_qualifiers() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        let spec = CategorySpec {
            guid: "1b3d5f7a-9c1e-4b3d-8f7a-9c1e3b5d7f9a",
            entity_type_guid: Some(guids::entity_type::DEFINED_TYPE),
            qualifier_column: None,
            qualifier_value: None,
            name: "Membership",
            icon_css_class: "fa fa-users",
            order: 0,
        };
        let first = changes.upsert_category(&spec).await.unwrap();
        let second = changes.upsert_category(&spec).await.unwrap();
        assert!(first.created);
        assert_eq!(first.id, second.id);
    }

    const GROUP_TYPE: &str = "4e6f8a0b-2c4d-4e6f-8a0b-2c4d6e8f0a1b";

    #[tokio::test]
    async fn test_group_type_delete_skips_when_in_use() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        let executor = changes.executor();
        executor
            .execute_with_values(
                r#"INSERT INTO "group_type" ("guid", "name", "is_system") VALUES (?, ?, ?)"#,
                [GROUP_TYPE.into(), "Ushers".into(), false.into()],
            )
            .await
            .unwrap();
        let group_type_id = changes.require_id(GroupType::Table, GROUP_TYPE).await.unwrap();
        executor
            .execute_with_values(
                r#"INSERT INTO "group_type_role" ("guid", "group_type_id", "name", "is_leader")
                   VALUES (?, ?, ?, ?)"#,
                [
                    "6a8c0e2f-4b6d-4f8a-8c0e-2f4b6d8f0a2c".into(),
                    group_type_id.into(),
                    "Member".into(),
                    false.into(),
                ],
            )
            .await
            .unwrap();
        executor
            .execute_with_values(
                r#"INSERT INTO "group" ("guid", "group_type_id", "name", "is_active")
                   VALUES (?, ?, ?, ?)"#,
                [
                    "9a8b7c6d-5e4f-4a3b-9c2d-1e0f9a8b7c6d".into(),
                    group_type_id.into(),
                    "Greeters".into(),
                    true.into(),
                ],
            )
            .await
            .unwrap();

        assert!(!changes.delete_group_type_best_effort(GROUP_TYPE).await.unwrap());
        assert!(changes.id_by_guid(GroupType::Table, GROUP_TYPE).await.unwrap().is_some());

        executor.execute(r#"DELETE FROM "group""#).await.unwrap();
        assert!(changes.delete_group_type_best_effort(GROUP_TYPE).await.unwrap());
        assert_eq!(
            count(&db, r#"SELECT COUNT(*) FROM "group_type_role""#).await,
            0
        );
        // Already gone
        assert!(!changes.delete_group_type_best_effort(GROUP_TYPE).await.unwrap());
    }

    #[tokio::test]
    async fn test_group_type_delete_failure_leaves_transaction_usable() {
        let db = migrated_db().await;
        let txn = db.begin().await.unwrap();
        let changes = ChangeSet::new(&txn, "test");
        let executor = changes.executor();
        executor
            .execute_with_values(
                r#"INSERT INTO "group_type" ("guid", "name", "is_system") VALUES (?, ?, ?)"#,
                [GROUP_TYPE.into(), "Ushers".into(), false.into()],
            )
            .await
            .unwrap();
        let group_type_id = changes.require_id(GroupType::Table, GROUP_TYPE).await.unwrap();
        executor
            .execute_with_values(
                r#"INSERT INTO "group_type_role" ("guid", "group_type_id", "name", "is_leader")
                   VALUES (?, ?, ?, ?)"#,
                [
                    "6a8c0e2f-4b6d-4f8a-8c0e-2f4b6d8f0a2c".into(),
                    group_type_id.into(),
                    "Member".into(),
                    false.into(),
                ],
            )
            .await
            .unwrap();
        executor
            .execute(
                r#"CREATE TRIGGER "group_type_locked" BEFORE DELETE ON "group_type"
                   BEGIN SELECT RAISE(ABORT, 'group type is locked'); END"#,
            )
            .await
            .unwrap();

        assert!(!changes.delete_group_type_best_effort(GROUP_TYPE).await.unwrap());

        // The role delete ran before the failure and was rolled back with it
        let roles: Option<i64> = executor
            .scalar(r#"SELECT COUNT(*) FROM "group_type_role""#)
            .await
            .unwrap();
        assert_eq!(roles, Some(1));

        // Work after the failure still lands
        assert!(
            changes
                .delete_defined_value(guids::defined_value::RECORD_STATUS_ACTIVE)
                .await
                .unwrap()
        );
        txn.commit().await.unwrap();
        assert!(
            ChangeSet::new(&db, "test")
                .id_by_guid(GroupType::Table, GROUP_TYPE)
                .await
                .unwrap()
                .is_some()
        );
    }
}
