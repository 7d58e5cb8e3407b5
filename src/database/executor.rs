//! Raw SQL execution for migration units
//!
//! Most units go through [`ChangeSet`](super::changes::ChangeSet), but some
//! changes are easier to express as literal SQL: view and routine
//! definitions, vendor-specific DDL, one-off scalar probes. [`SqlExecutor`]
//! covers those and also knows how to read and write per-session settings so
//! a definition can be created under a known configuration and the caller's
//! settings restored afterwards.
//!
//! Session settings live on a single connection. Run the executor on a
//! transaction (the runner applies every unit inside one) so reads, writes
//! and the definition itself hit the same session.

use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement, TryGetable, Value};
use tracing::{debug, warn};

/// One session setting to apply while a definition runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSetting {
    pub name: String,
    pub value: String,
}

impl SessionSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Thin statement runner over any SeaORM connection or transaction
pub struct SqlExecutor<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SqlExecutor<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.conn.get_database_backend()
    }

    /// Execute a statement that returns no rows; yields the affected row count
    pub async fn execute(&self, sql: &str) -> Result<u64, DbErr> {
        debug!(sql = %preview(sql), "Executing statement");
        let result = self.conn.execute_unprepared(sql).await?;
        Ok(result.rows_affected())
    }

    /// Execute a statement with bound values (`?` on SQLite/MySQL, `$n` on PostgreSQL)
    pub async fn execute_with_values<I>(&self, sql: &str, values: I) -> Result<u64, DbErr>
    where
        I: IntoIterator<Item = Value>,
    {
        debug!(sql = %preview(sql), "Executing parameterized statement");
        let statement = Statement::from_sql_and_values(self.backend(), sql, values);
        let result = self.conn.execute(statement).await?;
        Ok(result.rows_affected())
    }

    /// First column of the first row, or `None` when the query returns nothing
    pub async fn scalar<T: TryGetable>(&self, sql: &str) -> Result<Option<T>, DbErr> {
        debug!(sql = %preview(sql), "Executing scalar query");
        let row = self
            .conn
            .query_one(Statement::from_string(self.backend(), sql.to_string()))
            .await?;
        row.map(|r| r.try_get_by_index::<T>(0)).transpose()
    }

    /// Current value of a session setting, rendered as text
    pub async fn session_setting(&self, name: &str) -> Result<String, DbErr> {
        validate_setting_name(name)?;
        let backend = self.backend();
        let statement = match backend {
            DatabaseBackend::Sqlite => Statement::from_string(backend, format!("PRAGMA {name}")),
            DatabaseBackend::Postgres => Statement::from_sql_and_values(
                backend,
                "SELECT current_setting($1)",
                [name.into()],
            ),
            DatabaseBackend::MySql => {
                Statement::from_string(backend, format!("SELECT @@SESSION.{name}"))
            }
        };

        let row = self.conn.query_one(statement).await?.ok_or_else(|| {
            DbErr::RecordNotFound(format!("Session setting '{name}' is not readable"))
        })?;

        // PRAGMA and @@SESSION values come back as integers or text depending on the setting
        match row.try_get_by_index::<i64>(0) {
            Ok(number) => Ok(number.to_string()),
            Err(_) => row.try_get_by_index::<String>(0),
        }
    }

    pub async fn set_session_setting(&self, name: &str, value: &str) -> Result<(), DbErr> {
        validate_setting_name(name)?;
        let backend = self.backend();
        debug!(setting = name, value, "Setting session value");
        match backend {
            DatabaseBackend::Sqlite => {
                validate_pragma_value(value)?;
                self.conn
                    .execute_unprepared(&format!("PRAGMA {name} = {value}"))
                    .await?;
            }
            DatabaseBackend::Postgres => {
                self.conn
                    .query_one(Statement::from_sql_and_values(
                        backend,
                        "SELECT set_config($1, $2, false)",
                        [name.into(), value.into()],
                    ))
                    .await?;
            }
            DatabaseBackend::MySql => {
                self.conn
                    .execute(Statement::from_sql_and_values(
                        backend,
                        format!("SET SESSION {name} = ?"),
                        [value.into()],
                    ))
                    .await?;
            }
        }
        Ok(())
    }

    /// Run definition statements with `overrides` applied, then put the
    /// session back the way it was.
    ///
    /// The stored definition picks up whatever the session said at definition
    /// time. Originals are restored even when a statement fails; the
    /// statement's error is returned in preference to a restore error.
    pub async fn redefine_with_settings(
        &self,
        overrides: &[SessionSetting],
        statements: &[String],
    ) -> Result<(), DbErr> {
        let mut originals = Vec::with_capacity(overrides.len());
        for setting in overrides {
            let original = self.session_setting(&setting.name).await?;
            originals.push(SessionSetting::new(setting.name.clone(), original));
        }

        let outcome = self.apply_and_run(overrides, statements).await;

        let mut restore_error = None;
        for original in originals.iter().rev() {
            if let Err(e) = self
                .set_session_setting(&original.name, &original.value)
                .await
            {
                warn!(
                    setting = %original.name,
                    "Failed to restore session setting: {}", e
                );
                restore_error.get_or_insert(e);
            }
        }

        outcome?;
        match restore_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn apply_and_run(
        &self,
        overrides: &[SessionSetting],
        statements: &[String],
    ) -> Result<(), DbErr> {
        for setting in overrides {
            self.set_session_setting(&setting.name, &setting.value)
                .await?;
        }
        for statement in statements {
            self.execute(statement).await?;
        }
        Ok(())
    }
}

/// Setting names are interpolated into SQL on SQLite and MySQL
fn validate_setting_name(name: &str) -> Result<(), DbErr> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(DbErr::Custom(format!("Invalid session setting name: {name:?}")))
    }
}

fn validate_pragma_value(value: &str) -> Result<(), DbErr> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DbErr::Custom(format!("Invalid PRAGMA value: {value:?}")))
    }
}

fn preview(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 120 {
        let cut: String = flat.chars().take(117).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
