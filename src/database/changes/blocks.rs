//! Block types, their attributes, block instances and block attribute values

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::{Expr, Order, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, DbErr};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ChangeSet, Upserted, value_checksum};
use crate::database::guids;
use crate::database::schema::{
    Attribute, AttributeValue, BLOCK_TYPE_QUALIFIER_COLUMN, Block, BlockType, EntityType,
    FieldType, Layout, Page,
};

#[derive(Debug, Clone)]
pub struct BlockTypeSpec<'a> {
    pub guid: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub path: &'a str,
    pub category: &'a str,
}

/// Attribute defined on a block type
#[derive(Debug, Clone)]
pub struct AttributeSpec<'a> {
    pub guid: &'a str,
    pub block_type_guid: &'a str,
    pub field_type_guid: &'a str,
    pub key: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub order: i32,
    pub default_value: &'a str,
}

/// Block placed either on a page or on a layout
#[derive(Debug, Clone)]
pub struct BlockSpec<'a> {
    pub guid: &'a str,
    pub block_type_guid: &'a str,
    pub page_guid: Option<&'a str>,
    pub layout_guid: Option<&'a str>,
    pub zone: &'a str,
    pub name: &'a str,
    pub order: i32,
}

impl<C: ConnectionTrait> ChangeSet<'_, C> {
    pub async fn upsert_block_type(&self, spec: &BlockTypeSpec<'_>) -> Result<Upserted, DbErr> {
        self.upsert_by_guid(
            BlockType::Table,
            spec.guid,
            vec![
                (BlockType::Name, spec.name.into()),
                (BlockType::Description, spec.description.into()),
                (BlockType::Path, spec.path.into()),
                (BlockType::Category, spec.category.into()),
                (BlockType::IsSystem, true.into()),
            ],
        )
        .await
    }

    pub async fn upsert_block_type_attribute(
        &self,
        spec: &AttributeSpec<'_>,
    ) -> Result<Upserted, DbErr> {
        let block_type_id = self.require_id(BlockType::Table, spec.block_type_guid).await?;
        let field_type_id = self.require_id(FieldType::Table, spec.field_type_guid).await?;
        let block_entity_type_id = self
            .require_id(EntityType::Table, guids::entity_type::BLOCK)
            .await?;

        self.upsert_by_guid(
            Attribute::Table,
            spec.guid,
            vec![
                (Attribute::FieldTypeId, field_type_id.into()),
                (Attribute::EntityTypeId, block_entity_type_id.into()),
                (
                    Attribute::EntityTypeQualifierColumn,
                    BLOCK_TYPE_QUALIFIER_COLUMN.into(),
                ),
                (
                    Attribute::EntityTypeQualifierValue,
                    block_type_id.to_string().into(),
                ),
                (Attribute::Key, spec.key.into()),
                (Attribute::Name, spec.name.into()),
                (Attribute::Description, spec.description.into()),
                (Attribute::Order, spec.order.into()),
                (Attribute::DefaultValue, spec.default_value.into()),
                (Attribute::IsSystem, true.into()),
            ],
        )
        .await
    }

    pub async fn add_block(&self, spec: &BlockSpec<'_>) -> Result<Upserted, DbErr> {
        let block_type_id = self.require_id(BlockType::Table, spec.block_type_guid).await?;
        let page_id = match spec.page_guid {
            Some(guid) => Some(self.require_id(Page::Table, guid).await?),
            None => None,
        };
        let layout_id = match spec.layout_guid {
            Some(guid) => Some(self.require_id(Layout::Table, guid).await?),
            None => None,
        };
        if page_id.is_none() && layout_id.is_none() {
            return Err(DbErr::Custom(format!(
                "Block {} needs a page or a layout",
                spec.guid
            )));
        }

        self.upsert_by_guid(
            Block::Table,
            spec.guid,
            vec![
                (Block::BlockTypeId, block_type_id.into()),
                (Block::PageId, page_id.into()),
                (Block::LayoutId, layout_id.into()),
                (Block::Zone, spec.zone.into()),
                (Block::Name, spec.name.into()),
                (Block::Order, spec.order.into()),
                (Block::IsSystem, true.into()),
            ],
        )
        .await
    }

    /// Set the value of `attribute_guid` on the block `block_guid`
    pub async fn add_block_attribute_value(
        &self,
        block_guid: &str,
        attribute_guid: &str,
        value: &str,
    ) -> Result<(), DbErr> {
        let block_id = self.require_id(Block::Table, block_guid).await?;
        let attribute_id = self.require_id(Attribute::Table, attribute_guid).await?;
        self.set_attribute_value(attribute_id, block_id, value).await
    }

    /// Upsert the single value row keyed by (attribute, entity)
    pub(crate) async fn set_attribute_value(
        &self,
        attribute_id: i32,
        entity_id: i32,
        value: &str,
    ) -> Result<(), DbErr> {
        let checksum = value_checksum(value);
        let update = Query::update()
            .table(AttributeValue::Table)
            .values([
                (AttributeValue::Value, value.into()),
                (AttributeValue::ValueChecksum, checksum.into()),
            ])
            .and_where(Expr::col(AttributeValue::AttributeId).eq(attribute_id))
            .and_where(Expr::col(AttributeValue::EntityId).eq(entity_id))
            .to_owned();
        if self.exec(&update).await? > 0 {
            return Ok(());
        }

        let insert = Query::insert()
            .into_table(AttributeValue::Table)
            .columns([
                AttributeValue::Guid,
                AttributeValue::AttributeId,
                AttributeValue::EntityId,
                AttributeValue::Value,
                AttributeValue::ValueChecksum,
            ])
            .values_panic([
                Uuid::new_v4().hyphenated().to_string().into(),
                attribute_id.into(),
                entity_id.into(),
                value.into(),
                checksum.into(),
            ])
            .to_owned();
        self.exec(&insert).await?;
        Ok(())
    }

    /// Recompute `value_checksum` wherever it does not match the stored value.
    ///
    /// Rows written outside these primitives carry the column default, so a
    /// checksum seek is only complete after this pass. Walks the table in
    /// keyset pages of `batch_size`; returns the number of rows corrected.
    pub async fn refresh_value_checksums(&self, batch_size: u64) -> Result<u64, DbErr> {
        let batch_size = batch_size.max(1);
        let mut last_id = 0;
        let mut refreshed = 0;
        loop {
            let select = Query::select()
                .columns([
                    AttributeValue::Id,
                    AttributeValue::Value,
                    AttributeValue::ValueChecksum,
                ])
                .from(AttributeValue::Table)
                .and_where(Expr::col(AttributeValue::Id).gt(last_id))
                .order_by(AttributeValue::Id, Order::Asc)
                .limit(batch_size)
                .to_owned();
            let rows = self
                .connection()
                .query_all(self.backend().build(&select))
                .await?;
            let Some(last_row) = rows.last() else {
                break;
            };
            last_id = last_row.try_get::<i32>("", "id")?;

            for row in &rows {
                let value: String = row.try_get("", "value")?;
                let stored: i32 = row.try_get("", "value_checksum")?;
                let expected = value_checksum(&value);
                if stored == expected {
                    continue;
                }
                let id: i32 = row.try_get("", "id")?;
                let update = Query::update()
                    .table(AttributeValue::Table)
                    .value(AttributeValue::ValueChecksum, expected)
                    .and_where(Expr::col(AttributeValue::Id).eq(id))
                    .to_owned();
                refreshed += self.exec(&update).await?;
            }

            if (rows.len() as u64) < batch_size {
                break;
            }
        }
        if refreshed > 0 {
            info!(version = %self.version(), refreshed, "Refreshed stale attribute value checksums");
        }
        Ok(refreshed)
    }

    /// Remove an attribute and every value stored against it
    pub async fn delete_attribute(&self, guid: &str) -> Result<bool, DbErr> {
        let Some(attribute_id) = self.id_by_guid(Attribute::Table, guid).await? else {
            return Ok(false);
        };
        self.exec(
            &Query::delete()
                .from_table(AttributeValue::Table)
                .and_where(Expr::col(AttributeValue::AttributeId).eq(attribute_id))
                .to_owned(),
        )
        .await?;
        self.delete_by_guid(Attribute::Table, guid).await
    }

    pub async fn delete_block(&self, guid: &str) -> Result<bool, DbErr> {
        let Some(block_id) = self.id_by_guid(Block::Table, guid).await? else {
            return Ok(false);
        };
        self.delete_block_values(&[block_id]).await?;
        self.delete_by_guid(Block::Table, guid).await
    }

    /// Remove a block type, its blocks and its attribute definitions
    pub async fn delete_block_type(&self, guid: &str) -> Result<bool, DbErr> {
        let Some(block_type_id) = self.id_by_guid(BlockType::Table, guid).await? else {
            return Ok(false);
        };

        let block_ids = self
            .block_ids_where(Expr::col(Block::BlockTypeId).eq(block_type_id))
            .await?;
        self.delete_block_values(&block_ids).await?;
        self.exec(
            &Query::delete()
                .from_table(Block::Table)
                .and_where(Expr::col(Block::BlockTypeId).eq(block_type_id))
                .to_owned(),
        )
        .await?;

        for (attribute_id, _) in self.block_type_attributes(block_type_id).await? {
            self.exec(
                &Query::delete()
                    .from_table(AttributeValue::Table)
                    .and_where(Expr::col(AttributeValue::AttributeId).eq(attribute_id))
                    .to_owned(),
            )
            .await?;
            self.exec(
                &Query::delete()
                    .from_table(Attribute::Table)
                    .and_where(Expr::col(Attribute::Id).eq(attribute_id))
                    .to_owned(),
            )
            .await?;
        }

        self.delete_by_guid(BlockType::Table, guid).await
    }

    /// Move every block of `legacy_guid` onto `replacement_guid`.
    ///
    /// Values of attributes whose key exists on both types follow the block to
    /// the replacement attribute unless the key is listed in `excluded_keys`
    /// or the block already has a value for it. Whatever legacy values remain
    /// on the moved blocks are removed. Returns the number of blocks moved.
    pub async fn swap_block_type(
        &self,
        legacy_guid: &str,
        replacement_guid: &str,
        excluded_keys: &[&str],
    ) -> Result<usize, DbErr> {
        let legacy_id = self.require_id(BlockType::Table, legacy_guid).await?;
        let replacement_id = self.require_id(BlockType::Table, replacement_guid).await?;

        let block_ids = self
            .block_ids_where(Expr::col(Block::BlockTypeId).eq(legacy_id))
            .await?;
        if block_ids.is_empty() {
            debug!(version = %self.version(), legacy_guid, "No legacy blocks left to swap");
            return Ok(0);
        }

        let excluded: HashSet<&str> = excluded_keys.iter().copied().collect();
        let replacement_attributes: HashMap<String, i32> = self
            .block_type_attributes(replacement_id)
            .await?
            .into_iter()
            .map(|(id, key)| (key, id))
            .collect();

        for (legacy_attribute_id, key) in self.block_type_attributes(legacy_id).await? {
            if let Some(&target_id) = replacement_attributes
                .get(&key)
                .filter(|_| !excluded.contains(key.as_str()))
            {
                let already_set = self.entities_with_value(target_id, &block_ids).await?;
                let movable: Vec<i32> = block_ids
                    .iter()
                    .copied()
                    .filter(|id| !already_set.contains(id))
                    .collect();
                if !movable.is_empty() {
                    let update = Query::update()
                        .table(AttributeValue::Table)
                        .value(AttributeValue::AttributeId, target_id)
                        .and_where(Expr::col(AttributeValue::AttributeId).eq(legacy_attribute_id))
                        .and_where(Expr::col(AttributeValue::EntityId).is_in(movable))
                        .to_owned();
                    self.exec(&update).await?;
                }
            }

            let cleanup = Query::delete()
                .from_table(AttributeValue::Table)
                .and_where(Expr::col(AttributeValue::AttributeId).eq(legacy_attribute_id))
                .and_where(Expr::col(AttributeValue::EntityId).is_in(block_ids.iter().copied()))
                .to_owned();
            self.exec(&cleanup).await?;
        }

        let update = Query::update()
            .table(Block::Table)
            .value(Block::BlockTypeId, replacement_id)
            .and_where(Expr::col(Block::Id).is_in(block_ids.iter().copied()))
            .to_owned();
        self.exec(&update).await?;

        info!(
            version = %self.version(),
            legacy_guid,
            replacement_guid,
            blocks = block_ids.len(),
            "Swapped legacy block type"
        );
        Ok(block_ids.len())
    }

    pub(crate) async fn block_ids_where(&self, condition: SimpleExpr) -> Result<Vec<i32>, DbErr> {
        let select = Query::select()
            .column(Block::Id)
            .from(Block::Table)
            .and_where(condition)
            .to_owned();
        let rows = self
            .connection()
            .query_all(self.backend().build(&select))
            .await?;
        rows.iter().map(|r| r.try_get::<i32>("", "id")).collect()
    }

    /// (attribute id, key) pairs defined on a block type
    async fn block_type_attributes(&self, block_type_id: i32) -> Result<Vec<(i32, String)>, DbErr> {
        let select = Query::select()
            .columns([Attribute::Id, Attribute::Key])
            .from(Attribute::Table)
            .and_where(Expr::col(Attribute::EntityTypeQualifierColumn).eq(BLOCK_TYPE_QUALIFIER_COLUMN))
            .and_where(
                Expr::col(Attribute::EntityTypeQualifierValue).eq(block_type_id.to_string()),
            )
            .to_owned();
        let rows = self
            .connection()
            .query_all(self.backend().build(&select))
            .await?;
        rows.iter()
            .map(|r| Ok((r.try_get::<i32>("", "id")?, r.try_get::<String>("", "key")?)))
            .collect()
    }

    async fn entities_with_value(
        &self,
        attribute_id: i32,
        entity_ids: &[i32],
    ) -> Result<HashSet<i32>, DbErr> {
        let select = Query::select()
            .column(AttributeValue::EntityId)
            .from(AttributeValue::Table)
            .and_where(Expr::col(AttributeValue::AttributeId).eq(attribute_id))
            .and_where(Expr::col(AttributeValue::EntityId).is_in(entity_ids.iter().copied()))
            .to_owned();
        let rows = self
            .connection()
            .query_all(self.backend().build(&select))
            .await?;
        rows.iter()
            .map(|r| r.try_get::<i32>("", "entity_id"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::migrated_db;
    use sea_orm::{DatabaseConnection, Statement};

    async fn values_for_block(db: &DatabaseConnection, block_guid: &str) -> Vec<(String, String)> {
        let rows = db
            .query_all(Statement::from_sql_and_values(
                db.get_database_backend(),
                r#"SELECT a."key" AS k, av."value" AS v
                   FROM "attribute_value" av
                   JOIN "attribute" a ON a."id" = av."attribute_id"
                   JOIN "block" b ON b."id" = av."entity_id"
                   WHERE b."guid" = ?
                   ORDER BY a."key", av."value""#,
                [block_guid.into()],
            ))
            .await
            .unwrap();
        rows.iter()
            .map(|r| {
                (
                    r.try_get::<String>("", "k").unwrap(),
                    r.try_get::<String>("", "v").unwrap(),
                )
            })
            .collect()
    }

    async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
        let row = db
            .query_one(Statement::from_string(db.get_database_backend(), sql.to_string()))
            .await
            .unwrap()
            .unwrap();
        row.try_get_by_index::<i64>(0).unwrap()
    }

    const LEGACY: &str = "aaaaaaaa-0000-4000-8000-000000000001";
    const REPLACEMENT: &str = "aaaaaaaa-0000-4000-8000-000000000002";
    const LEGACY_TITLE: &str = "bbbbbbbb-0000-4000-8000-000000000001";
    const LEGACY_LIMIT: &str = "bbbbbbbb-0000-4000-8000-000000000002";
    const LEGACY_DEBUG: &str = "bbbbbbbb-0000-4000-8000-000000000003";
    const NEW_TITLE: &str = "bbbbbbbb-0000-4000-8000-000000000011";
    const NEW_LIMIT: &str = "bbbbbbbb-0000-4000-8000-000000000012";
    const NEW_DEBUG: &str = "bbbbbbbb-0000-4000-8000-000000000013";
    const BLOCK: &str = "cccccccc-0000-4000-8000-000000000001";

    async fn seed_swap_fixture(changes: &ChangeSet<'_, DatabaseConnection>) {
        for (guid, name) in [(LEGACY, "Legacy List"), (REPLACEMENT, "List")] {
            changes
                .upsert_block_type(&BlockTypeSpec {
                    guid,
                    name,
                    description: "",
                    path: "",
                    category: "Test",
                })
                .await
                .unwrap();
        }
        for (guid, block_type_guid, key) in [
            (LEGACY_TITLE, LEGACY, "Title"),
            (LEGACY_LIMIT, LEGACY, "Limit"),
            (LEGACY_DEBUG, LEGACY, "EnableDebug"),
            (NEW_TITLE, REPLACEMENT, "Title"),
            (NEW_LIMIT, REPLACEMENT, "Limit"),
            (NEW_DEBUG, REPLACEMENT, "EnableDebug"),
        ] {
            changes
                .upsert_block_type_attribute(&AttributeSpec {
                    guid,
                    block_type_guid,
                    field_type_guid: guids::field_type::TEXT,
                    key,
                    name: key,
                    description: "",
                    order: 0,
                    default_value: "",
                })
                .await
                .unwrap();
        }
        changes
            .add_block(&BlockSpec {
                guid: BLOCK,
                block_type_guid: LEGACY,
                page_guid: Some(guids::page::FINANCE),
                layout_guid: None,
                zone: "Main",
                name: "Transactions",
                order: 0,
            })
            .await
            .unwrap();
        changes.add_block_attribute_value(BLOCK, LEGACY_TITLE, "Recent Gifts").await.unwrap();
        changes.add_block_attribute_value(BLOCK, LEGACY_LIMIT, "25").await.unwrap();
        changes.add_block_attribute_value(BLOCK, LEGACY_DEBUG, "True").await.unwrap();
        // Already configured on the replacement; must win over the legacy value
        changes.add_block_attribute_value(BLOCK, NEW_LIMIT, "50").await.unwrap();
    }

    #[tokio::test]
    async fn test_attribute_upsert_is_idempotent() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        seed_swap_fixture(&changes).await;
        let before = count(&db, r#"SELECT COUNT(*) FROM "attribute""#).await;

        seed_swap_fixture(&changes).await;

        assert_eq!(count(&db, r#"SELECT COUNT(*) FROM "attribute""#).await, before);
        assert_eq!(
            values_for_block(&db, BLOCK).await,
            vec![
                ("EnableDebug".to_string(), "True".to_string()),
                ("Limit".to_string(), "25".to_string()),
                ("Limit".to_string(), "50".to_string()),
                ("Title".to_string(), "Recent Gifts".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_attribute_value_keeps_checksum_in_step() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        seed_swap_fixture(&changes).await;
        changes.add_block_attribute_value(BLOCK, LEGACY_TITLE, "Gifts").await.unwrap();

        let row = db
            .query_one(Statement::from_sql_and_values(
                db.get_database_backend(),
                r#"SELECT av."value_checksum" AS c FROM "attribute_value" av
                   JOIN "attribute" a ON a."id" = av."attribute_id"
                   WHERE a."guid" = ?"#,
                [LEGACY_TITLE.into()],
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get::<i32>("", "c").unwrap(), value_checksum("Gifts"));
    }

    #[tokio::test]
    async fn test_swap_block_type_moves_values_and_honours_exclusions() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        seed_swap_fixture(&changes).await;

        let moved = changes
            .swap_block_type(LEGACY, REPLACEMENT, &["EnableDebug"])
            .await
            .unwrap();
        assert_eq!(moved, 1);

        assert_eq!(
            values_for_block(&db, BLOCK).await,
            vec![
                ("Limit".to_string(), "50".to_string()),
                ("Title".to_string(), "Recent Gifts".to_string()),
            ]
        );

        let block_type = changes.id_by_guid(BlockType::Table, REPLACEMENT).await.unwrap();
        let row = db
            .query_one(Statement::from_sql_and_values(
                db.get_database_backend(),
                r#"SELECT "block_type_id" FROM "block" WHERE "guid" = ?"#,
                [BLOCK.into()],
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get::<i32>("", "block_type_id").ok(), block_type);

        // Nothing left on the legacy type, so a rerun is a no-op
        assert_eq!(
            changes.swap_block_type(LEGACY, REPLACEMENT, &["EnableDebug"]).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_delete_block_type_removes_dependents() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        seed_swap_fixture(&changes).await;

        assert!(changes.delete_block_type(LEGACY).await.unwrap());
        assert_eq!(changes.id_by_guid(Block::Table, BLOCK).await.unwrap(), None);
        assert_eq!(changes.id_by_guid(Attribute::Table, LEGACY_TITLE).await.unwrap(), None);
        // Replacement attribute values on the deleted block go too
        assert_eq!(values_for_block(&db, BLOCK).await, Vec::new());
        assert!(!changes.delete_block_type(LEGACY).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_block_needs_a_placement() {
        let db = migrated_db().await;
        let changes = ChangeSet::new(&db, "test");
        seed_swap_fixture(&changes).await;

        let err = changes
            .add_block(&BlockSpec {
                guid: "cccccccc-0000-4000-8000-000000000099",
                block_type_guid: LEGACY,
                page_guid: None,
                layout_guid: None,
                zone: "Main",
                name: "Floating",
                order: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbErr::Custom(_)));
    }
}
