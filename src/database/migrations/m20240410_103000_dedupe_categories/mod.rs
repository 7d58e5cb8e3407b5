//! Collapse duplicate categories onto their canonical rows
//!
//! Earlier releases could create the same category more than once (same name,
//! entity type and qualifier) with different guids. For every canonical
//! `(name, guid)` pair the duplicates are found, every `category_id`
//! reference is pointed at the canonical row and the duplicates are deleted.
//!
//! Down is intentionally empty: which references pointed at which duplicate
//! is not recorded anywhere, so the merge cannot be undone.

use sea_orm_migration::prelude::*;
use tracing::{debug, info};

use crate::database::changes::ChangeSet;
use crate::database::guids;
use crate::database::schema::{Category, DefinedType, SystemCommunication};

mod plan;

pub use plan::{CategoryRow, MergePlan, plan_merge};

/// Categories that win a merge, by name
pub const CANONICAL_CATEGORIES: &[(&str, &str)] = &[
    ("Finance", guids::category::FINANCE_COMMUNICATIONS),
    ("Person", guids::category::PERSON_DEFINED_TYPES),
];

pub struct Migration;
folder_migration_name!();

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());

        for &(name, guid) in CANONICAL_CATEGORIES {
            let candidates = load_categories_named(&changes, name).await?;
            let Some(plan) = plan_merge(&candidates, guid)? else {
                debug!(version = %self.name(), name, guid, "Canonical category not present");
                continue;
            };
            if plan.duplicate_ids.is_empty() {
                continue;
            }
            apply_merge(&changes, &plan).await?;
            info!(
                version = %self.name(),
                name,
                canonical_id = plan.canonical_id,
                merged = plan.duplicate_ids.len(),
                "Merged duplicate categories"
            );
        }

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

async fn load_categories_named<C: ConnectionTrait>(
    changes: &ChangeSet<'_, C>,
    name: &str,
) -> Result<Vec<CategoryRow>, DbErr> {
    let select = Query::select()
        .columns([
            Category::Id,
            Category::Guid,
            Category::EntityTypeId,
            Category::EntityTypeQualifierColumn,
            Category::EntityTypeQualifierValue,
        ])
        .from(Category::Table)
        .and_where(Expr::col(Category::Name).eq(name))
        .order_by(Category::Id, Order::Asc)
        .to_owned();
    let rows = changes
        .connection()
        .query_all(changes.backend().build(&select))
        .await?;

    rows.iter()
        .map(|row| {
            Ok(CategoryRow {
                id: row.try_get("", "id")?,
                guid: row.try_get("", "guid")?,
                entity_type_id: row.try_get("", "entity_type_id")?,
                qualifier_column: row.try_get("", "entity_type_qualifier_column")?,
                qualifier_value: row.try_get("", "entity_type_qualifier_value")?,
            })
        })
        .collect()
}

async fn apply_merge<C: ConnectionTrait>(
    changes: &ChangeSet<'_, C>,
    plan: &MergePlan,
) -> Result<(), DbErr> {
    let duplicates = || plan.duplicate_ids.iter().copied();

    changes
        .exec(
            &Query::update()
                .table(DefinedType::Table)
                .value(DefinedType::CategoryId, plan.canonical_id)
                .and_where(Expr::col(DefinedType::CategoryId).is_in(duplicates()))
                .to_owned(),
        )
        .await?;
    changes
        .exec(
            &Query::update()
                .table(SystemCommunication::Table)
                .value(SystemCommunication::CategoryId, plan.canonical_id)
                .and_where(Expr::col(SystemCommunication::CategoryId).is_in(duplicates()))
                .to_owned(),
        )
        .await?;
    changes
        .exec(
            &Query::delete()
                .from_table(Category::Table)
                .and_where(Expr::col(Category::Id).is_in(duplicates()))
                .to_owned(),
        )
        .await?;
    Ok(())
}
