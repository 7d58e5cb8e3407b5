//! Normalise boolean attribute values to `True` / `False`
//!
//! Older blocks stored booleans as `Yes`/`No`, `Y`/`N` or `1`/`0`. The table
//! is walked in keyset pages (`id > last ORDER BY id LIMIT n`) so memory use
//! stays flat no matter how many values exist.
//!
//! Down is empty: the original spelling is not kept.

use sea_orm_migration::prelude::*;
use tracing::{debug, info};

use super::translation_batch_size;
use crate::database::changes::{ChangeSet, value_checksum};
use crate::database::guids;
use crate::database::schema::{Attribute, AttributeValue, FieldType};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Canonical spelling for a legacy boolean, or `None` if `value` needs no change
pub fn translate_boolean(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "1" => Some("True"),
        "no" | "n" | "0" => Some("False"),
        _ => None,
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let changes = ChangeSet::new(manager.get_connection(), self.name());
        let translated = translate_values(&changes, translation_batch_size()).await?;
        info!(version = %self.name(), translated, "Translated boolean attribute values");
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

pub async fn translate_values<C: ConnectionTrait>(
    changes: &ChangeSet<'_, C>,
    batch_size: u64,
) -> Result<u64, DbErr> {
    let attribute_ids = boolean_attribute_ids(changes).await?;
    if attribute_ids.is_empty() {
        return Ok(0);
    }

    let mut last_id = 0;
    let mut translated = 0;
    loop {
        let select = Query::select()
            .columns([AttributeValue::Id, AttributeValue::Value])
            .from(AttributeValue::Table)
            .and_where(Expr::col(AttributeValue::Id).gt(last_id))
            .and_where(Expr::col(AttributeValue::AttributeId).is_in(attribute_ids.iter().copied()))
            .order_by(AttributeValue::Id, Order::Asc)
            .limit(batch_size)
            .to_owned();
        let rows = changes
            .connection()
            .query_all(changes.backend().build(&select))
            .await?;
        let Some(last_row) = rows.last() else {
            break;
        };
        last_id = last_row.try_get::<i32>("", "id")?;

        for row in &rows {
            let value: String = row.try_get("", "value")?;
            let Some(replacement) = translate_boolean(&value) else {
                continue;
            };
            let id: i32 = row.try_get("", "id")?;
            let update = Query::update()
                .table(AttributeValue::Table)
                .values([
                    (AttributeValue::Value, replacement.into()),
                    (AttributeValue::ValueChecksum, value_checksum(replacement).into()),
                ])
                .and_where(Expr::col(AttributeValue::Id).eq(id))
                .to_owned();
            translated += changes.exec(&update).await?;
        }
        debug!(version = %changes.version(), last_id, translated, "Translated batch");

        if (rows.len() as u64) < batch_size {
            break;
        }
    }
    Ok(translated)
}

async fn boolean_attribute_ids<C: ConnectionTrait>(
    changes: &ChangeSet<'_, C>,
) -> Result<Vec<i32>, DbErr> {
    let Some(field_type_id) = changes
        .id_by_guid(FieldType::Table, guids::field_type::BOOLEAN)
        .await?
    else {
        return Ok(Vec::new());
    };
    let select = Query::select()
        .column(Attribute::Id)
        .from(Attribute::Table)
        .and_where(Expr::col(Attribute::FieldTypeId).eq(field_type_id))
        .to_owned();
    let rows = changes
        .connection()
        .query_all(changes.backend().build(&select))
        .await?;
    rows.iter().map(|r| r.try_get::<i32>("", "id")).collect()
}
