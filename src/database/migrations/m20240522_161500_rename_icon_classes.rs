//! Font Awesome 4 icon classes renamed in Font Awesome 5
//!
//! Attribute values can number in the millions, so the value update seeks on
//! the indexed `value_checksum` and only then compares the text. Stale
//! checksums are corrected first, so the seek never misses a row the text
//! comparison would match.

use sea_orm_migration::prelude::*;
use tracing::info;

use super::translation_batch_size;
use crate::database::changes::{ChangeSet, value_checksum};
use crate::database::schema::{AttributeValue, Page};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (old class, new class)
pub const ICON_RENAMES: &[(&str, &str)] = &[
    ("fa fa-money", "fa fa-money-bill"),
    ("fa fa-dashboard", "fa fa-tachometer-alt"),
    ("fa fa-file-text-o", "fa fa-file-alt"),
    ("fa fa-calendar-o", "fa fa-calendar"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        changes.refresh_value_checksums(translation_batch_size()).await?;
        for &(old, new) in ICON_RENAMES {
            replace_everywhere(&changes, old, new).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        changes.refresh_value_checksums(translation_batch_size()).await?;
        for &(old, new) in ICON_RENAMES.iter().rev() {
            replace_everywhere(&changes, new, old).await?;
        }
        Ok(())
    }
}

async fn replace_everywhere<C: ConnectionTrait>(
    changes: &ChangeSet<'_, C>,
    from: &str,
    to: &str,
) -> Result<(), DbErr> {
    let values = replace_attribute_values(changes, from, to).await?;
    let pages = changes
        .exec(
            &Query::update()
                .table(Page::Table)
                .value(Page::IconCssClass, to)
                .and_where(Expr::col(Page::IconCssClass).eq(from))
                .to_owned(),
        )
        .await?;
    if values + pages > 0 {
        info!(version = %changes.version(), from, to, values, pages, "Replaced icon class");
    }
    Ok(())
}

/// Replace every attribute value equal to `from` with `to`, keeping the checksum in step
pub async fn replace_attribute_values<C: ConnectionTrait>(
    changes: &ChangeSet<'_, C>,
    from: &str,
    to: &str,
) -> Result<u64, DbErr> {
    let update = Query::update()
        .table(AttributeValue::Table)
        .values([
            (AttributeValue::Value, to.into()),
            (AttributeValue::ValueChecksum, value_checksum(to).into()),
        ])
        .and_where(Expr::col(AttributeValue::ValueChecksum).eq(value_checksum(from)))
        .and_where(Expr::col(AttributeValue::Value).eq(from))
        .to_owned();
    changes.exec(&update).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::changes::BlockSpec;
    use crate::database::guids;
    use crate::database::test_support::migrated_db;

    const BLOCK: &str = "d1d2d3d4-0000-4000-8000-000000000001";

    async fn values(changes: &ChangeSet<'_, sea_orm::DatabaseConnection>) -> Vec<(String, i32)> {
        let rows = changes
            .connection()
            .query_all(sea_orm::Statement::from_string(
                changes.backend(),
                r#"SELECT "value", "value_checksum" FROM "attribute_value"
                   WHERE "value" LIKE 'fa fa-money%' ORDER BY "id""#.to_string(),
            ))
            .await
            .unwrap();
        rows.iter()
            .map(|r| {
                (
                    r.try_get::<String>("", "value").unwrap(),
                    r.try_get::<i32>("", "value_checksum").unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_rename_reaches_rows_with_stale_checksums() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        changes
            .add_block(&BlockSpec {
                guid: BLOCK,
                block_type_guid: guids::block_type::HTML_CONTENT,
                page_guid: Some(guids::page::FINANCE),
                layout_guid: None,
                zone: "Main",
                name: "Icon",
                order: 0,
            })
            .await
            .unwrap();
        changes
            .add_block_attribute_value(BLOCK, guids::attribute::HTML_CONTENT_CACHE_DURATION, "fa fa-money")
            .await
            .unwrap();
        // Written by something that does not maintain the checksum
        changes
            .executor()
            .execute(
                r#"INSERT INTO "attribute_value" ("guid", "attribute_id", "entity_id", "value")
                   SELECT 'd1d2d3d4-0000-4000-8000-0000000000ff', "attribute_id", 9999, "value"
                   FROM "attribute_value" WHERE "value" = 'fa fa-money'"#,
            )
            .await
            .unwrap();

        assert_eq!(changes.refresh_value_checksums(1).await.unwrap(), 1);
        assert_eq!(changes.refresh_value_checksums(1).await.unwrap(), 0);

        let replaced = replace_attribute_values(&changes, "fa fa-money", "fa fa-money-bill")
            .await
            .unwrap();
        assert_eq!(replaced, 2);

        let expected = ("fa fa-money-bill".to_string(), value_checksum("fa fa-money-bill"));
        assert_eq!(values(&changes).await, vec![expected.clone(), expected]);
    }

    async fn page_icon(db: &sea_orm::DatabaseConnection, guid: &str) -> Option<String> {
        ChangeSet::new(db, "test")
            .executor()
            .scalar::<String>(&format!(
                r#"SELECT "icon_css_class" FROM "page" WHERE "guid" = '{guid}'"#
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_page_icons_round_trip() {
        let db = migrated_db().await;
        let manager = SchemaManager::new(&db);

        // Fully migrated: already renamed
        assert_eq!(page_icon(&db, guids::page::FINANCE).await.as_deref(), Some("fa fa-money-bill"));
        assert_eq!(page_icon(&db, guids::page::MY_ACCOUNT).await.as_deref(), Some("fa fa-tachometer-alt"));

        Migration.down(&manager).await.unwrap();
        assert_eq!(page_icon(&db, guids::page::FINANCE).await.as_deref(), Some("fa fa-money"));
        assert_eq!(page_icon(&db, guids::page::MY_ACCOUNT).await.as_deref(), Some("fa fa-dashboard"));

        Migration.up(&manager).await.unwrap();
        assert_eq!(page_icon(&db, guids::page::FINANCE).await.as_deref(), Some("fa fa-money-bill"));
        assert_eq!(page_icon(&db, guids::page::MY_ACCOUNT).await.as_deref(), Some("fa fa-tachometer-alt"));
    }
}
