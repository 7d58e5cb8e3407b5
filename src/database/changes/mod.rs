//! Idempotent change primitives over the CMS schema
//!
//! Every migration unit builds a [`ChangeSet`] over the connection the
//! framework hands it and calls these helpers in order. All "by GUID"
//! helpers are add-or-update: calling one twice with the same arguments
//! leaves the store exactly as one call did, so a unit that failed halfway
//! can simply be run again.

use sea_orm::sea_query::{Alias, DynIden, Expr, Iden, IntoIden, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, StatementBuilder};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};
use uuid::Uuid;

use super::executor::SqlExecutor;

mod blocks;
mod catalog;
mod pages;

pub use blocks::{AttributeSpec, BlockSpec, BlockTypeSpec};
pub use catalog::{
    CategorySpec, DefinedTypeSpec, DefinedValueSpec, EntityTypeSpec, FieldTypeSpec,
    LavaShortcodeSpec, ServiceJobSpec, SystemCommunicationSpec,
};
pub use pages::{LayoutSpec, PageSpec};

/// Result of an add-or-update call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    pub id: i32,
    pub created: bool,
}

/// Ordered, idempotent operations of one migration unit
pub struct ChangeSet<'c, C: ConnectionTrait> {
    conn: &'c C,
    version: String,
}

impl<'c, C: ConnectionTrait> ChangeSet<'c, C> {
    pub fn new(conn: &'c C, version: impl Into<String>) -> Self {
        Self {
            conn,
            version: version.into(),
        }
    }

    pub fn connection(&self) -> &'c C {
        self.conn
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    /// Raw SQL access on the same connection
    pub fn executor(&self) -> SqlExecutor<'c, C> {
        SqlExecutor::new(self.conn)
    }

    pub(crate) async fn exec<S: StatementBuilder>(&self, statement: &S) -> Result<u64, DbErr> {
        let statement = self.backend().build(statement);
        trace!(version = %self.version, sql = %statement.sql, "Executing change");
        Ok(self.conn.execute(statement).await?.rows_affected())
    }

    /// Primary key of the row with `guid`, if present
    pub(crate) async fn id_by_guid<T>(&self, table: T, guid: &str) -> Result<Option<i32>, DbErr>
    where
        T: Iden + 'static,
    {
        let guid = normalize_guid(guid)?;
        let select = Query::select()
            .column(Alias::new("id"))
            .from(table)
            .and_where(Expr::col(Alias::new("guid")).eq(guid))
            .to_owned();
        let row = self.conn.query_one(self.backend().build(&select)).await?;
        row.map(|r| r.try_get::<i32>("", "id")).transpose()
    }

    /// Like [`Self::id_by_guid`] but a missing row is an error
    pub(crate) async fn require_id<T>(&self, table: T, guid: &str) -> Result<i32, DbErr>
    where
        T: Iden + 'static,
    {
        let table_name = table.to_string();
        self.id_by_guid(table, guid).await?.ok_or_else(|| {
            DbErr::RecordNotFound(format!("{table_name} with guid {guid} does not exist"))
        })
    }

    /// Update the row with `guid` or insert it when missing
    pub(crate) async fn upsert_by_guid<T>(
        &self,
        table: T,
        guid: &str,
        values: Vec<(T, SimpleExpr)>,
    ) -> Result<Upserted, DbErr>
    where
        T: Iden + Copy + 'static,
    {
        let guid = normalize_guid(guid)?;

        if let Some(id) = self.id_by_guid(table, &guid).await? {
            if !values.is_empty() {
                let update = Query::update()
                    .table(table)
                    .values(values)
                    .and_where(Expr::col(Alias::new("guid")).eq(guid.as_str()))
                    .to_owned();
                self.exec(&update).await?;
            }
            debug!(version = %self.version, table = %table.to_string(), %guid, "Updated existing row");
            return Ok(Upserted { id, created: false });
        }

        let mut columns: Vec<DynIden> = Vec::with_capacity(values.len() + 1);
        let mut exprs: Vec<SimpleExpr> = Vec::with_capacity(values.len() + 1);
        columns.push(Alias::new("guid").into_iden());
        exprs.push(guid.as_str().into());
        for (column, expr) in values {
            columns.push(column.into_iden());
            exprs.push(expr);
        }

        let insert = Query::insert()
            .into_table(table)
            .columns(columns)
            .values_panic(exprs)
            .to_owned();
        self.exec(&insert).await?;

        let id = self.require_id(table, &guid).await?;
        debug!(version = %self.version, table = %table.to_string(), %guid, id, "Inserted row");
        Ok(Upserted { id, created: true })
    }

    /// Delete the row with `guid`; returns whether a row was removed
    pub(crate) async fn delete_by_guid<T>(&self, table: T, guid: &str) -> Result<bool, DbErr>
    where
        T: Iden + 'static,
    {
        let guid = normalize_guid(guid)?;
        let delete = Query::delete()
            .from_table(table)
            .and_where(Expr::col(Alias::new("guid")).eq(guid))
            .to_owned();
        Ok(self.exec(&delete).await? > 0)
    }
}

/// Canonical lowercase, hyphenated form; anything that is not a UUID is rejected
pub fn normalize_guid(guid: &str) -> Result<String, DbErr> {
    Uuid::parse_str(guid.trim())
        .map(|u| u.hyphenated().to_string())
        .map_err(|e| DbErr::Custom(format!("Invalid guid '{guid}': {e}")))
}

/// Seek key stored next to attribute values
///
/// First four bytes of the SHA-256 of the value, big-endian. Equal values
/// always share a checksum, so `checksum = ? AND value = ?` selects exactly
/// the rows `value = ?` would while letting the index do the seek.
pub fn value_checksum(value: &str) -> i32 {
    let digest = Sha256::digest(value.as_bytes());
    i32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
