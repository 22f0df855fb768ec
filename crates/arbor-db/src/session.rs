//! Single-connection statement execution and row materialization.

use std::path::Path;

use arbor_orm::{ColumnType, FieldDef, Record, RecordError, TableSchema, Value};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use thiserror::Error;

/// Runtime tunables for the session's SQLite connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Busy timeout for the connection, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// A statement failed in the underlying driver.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record or filter violated its schema contract.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A stored reference points at a row that no longer exists.
    #[error("foreign key '{field}' on table '{table}' references missing row {id}")]
    DanglingReference {
        /// Table holding the reference.
        table: String,
        /// The foreign-key field name.
        field: String,
        /// The missing row identity.
        id: i64,
    },
}

/// The owner of the single storage connection through which all SQL is
/// executed.
///
/// Constructed once at process start with a storage path and used for the
/// process lifetime. Every operation blocks the caller until the driver
/// returns; a hung driver call hangs the caller.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if necessary) a file-backed database with default
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if the file cannot be opened or the
    /// connection pragmas fail.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Self::open_with(path, SessionSettings::default())
    }

    /// Opens a file-backed database with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if the file cannot be opened or the
    /// connection pragmas fail.
    pub fn open_with(path: impl AsRef<Path>, settings: SessionSettings) -> Result<Self, DbError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Self::init(conn, settings)
    }

    /// Opens an in-memory database, useful for tests and ephemeral use.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if the connection cannot be set up.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::init(Connection::open_in_memory()?, SessionSettings::default())
    }

    fn init(conn: Connection, settings: SessionSettings) -> Result<Self, DbError> {
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {};",
            settings.busy_timeout_ms
        ))?;
        tracing::debug!(
            busy_timeout_ms = settings.busy_timeout_ms,
            "database session opened"
        );
        Ok(Self { conn })
    }

    /// Creates the table for a schema. Idempotent: the generated DDL is
    /// `CREATE TABLE IF NOT EXISTS`, so calling it against an existing
    /// table is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] if the driver reports a DDL failure.
    pub fn create(&self, schema: &TableSchema) -> Result<(), DbError> {
        let sql = schema.create_sql();
        tracing::debug!(table = schema.table_name(), sql = %sql, "creating table");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Inserts a record and writes the storage-assigned identity back
    /// into it.
    ///
    /// On success `record.id()` is non-null and matches the persisted
    /// row. On failure the record is left without an id and nothing is
    /// persisted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Record`] if a foreign-key field holds an
    /// unsaved record, or [`DbError::Database`] on driver failure.
    pub fn save(&self, record: &mut Record) -> Result<(), DbError> {
        let schema = record.schema();
        let (sql, values) = schema.insert_sql(record)?;
        tracing::debug!(table = schema.table_name(), sql = %sql, "inserting record");
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        record.set_id(self.conn.last_insert_rowid());
        Ok(())
    }

    /// Persists the current field values of an already-saved record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Record`] if the record has no identity, or
    /// [`DbError::Database`] on driver failure.
    pub fn update(&self, record: &Record) -> Result<(), DbError> {
        let schema = record.schema();
        let (sql, values) = schema.update_sql(record)?;
        tracing::debug!(table = schema.table_name(), sql = %sql, "updating record");
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Deletes an already-saved record by identity. The in-memory record
    /// keeps its field values; further `update`/`delete` calls on it are
    /// caller error.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Record`] if the record has no identity, or
    /// [`DbError::Database`] on driver failure.
    pub fn delete(&self, record: &Record) -> Result<(), DbError> {
        let schema = record.schema();
        let id = record.id().ok_or_else(|| RecordError::MissingId {
            table: schema.table_name().to_string(),
        })?;
        let sql = schema.delete_sql();
        tracing::debug!(table = schema.table_name(), sql = %sql, id, "deleting record");
        self.conn.execute(&sql, params![id])?;
        Ok(())
    }

    /// Fetches every row of a schema's table as materialized records.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] on driver failure or
    /// [`DbError::DanglingReference`] if a stored reference cannot be
    /// resolved.
    pub fn all(&self, schema: &'static TableSchema) -> Result<Vec<Record>, DbError> {
        let (sql, _) = schema.select_all_sql();
        self.fetch(schema, &sql, &[])
    }

    /// Fetches the rows matching every supplied equality filter, in
    /// filter-supplied order. With no filters this behaves as [`all`].
    /// No matching rows is an empty `Vec`, never an error.
    ///
    /// [`all`]: Database::all
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Record`] if a filter names an unknown column,
    /// [`DbError::Database`] on driver failure, or
    /// [`DbError::DanglingReference`] if a stored reference cannot be
    /// resolved.
    pub fn get(
        &self,
        schema: &'static TableSchema,
        filters: &[(&str, Value)],
    ) -> Result<Vec<Record>, DbError> {
        if filters.is_empty() {
            return self.all(schema);
        }
        let (sql, _, values) = schema.select_where_sql(filters)?;
        self.fetch(schema, &sql, &values)
    }

    /// Lists the user tables known to the storage catalog, sorted by
    /// name. SQLite-internal `sqlite_*` tables are excluded.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Database`] on driver failure.
    pub fn tables(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name;",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }

    fn fetch(
        &self,
        schema: &'static TableSchema,
        sql: &str,
        bind: &[Value],
    ) -> Result<Vec<Record>, DbError> {
        tracing::debug!(table = schema.table_name(), sql = %sql, "selecting records");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(self.materialize(schema, row)?);
        }
        Ok(records)
    }

    /// Reconstructs one record from a result row: `id` from column 0,
    /// then one column per declared field in field order. Foreign keys
    /// are resolved recursively by fetching the referenced row, so the
    /// field carries a fully materialized record.
    fn materialize(&self, schema: &'static TableSchema, row: &Row<'_>) -> Result<Record, DbError> {
        let mut record = Record::new(schema);
        record.set_id(row.get(0)?);

        for (idx, field) in schema.fields().iter().enumerate() {
            let idx = idx + 1;
            match field.def() {
                FieldDef::Column(column) => {
                    let value = read_scalar(row, idx, column.column_type())?;
                    if !value.is_null() {
                        record.set(field.name(), value)?;
                    }
                }
                FieldDef::ForeignKey(fk) => {
                    let Some(ref_id) = row.get::<_, Option<i64>>(idx)? else {
                        continue;
                    };
                    let referenced = fk.referenced_schema();
                    let mut matches = self.get(referenced, &[("id", Value::Integer(ref_id))])?;
                    if matches.is_empty() {
                        return Err(DbError::DanglingReference {
                            table: schema.table_name().to_string(),
                            field: field.name().to_string(),
                            id: ref_id,
                        });
                    }
                    record.set_reference(field.name(), matches.remove(0))?;
                }
            }
        }
        Ok(record)
    }
}

/// Reads one scalar column through the typed getter matching its
/// declared semantic type. NULL maps to `Value::Null` for every type.
fn read_scalar(row: &Row<'_>, idx: usize, column_type: ColumnType) -> rusqlite::Result<Value> {
    Ok(match column_type {
        ColumnType::Integer => row
            .get::<_, Option<i64>>(idx)?
            .map_or(Value::Null, Value::Integer),
        ColumnType::Real => row
            .get::<_, Option<f64>>(idx)?
            .map_or(Value::Null, Value::Real),
        ColumnType::Text => row
            .get::<_, Option<String>>(idx)?
            .map_or(Value::Null, Value::Text),
        ColumnType::Binary => row
            .get::<_, Option<Vec<u8>>>(idx)?
            .map_or(Value::Null, Value::Blob),
        ColumnType::Boolean => row
            .get::<_, Option<bool>>(idx)?
            .map_or(Value::Null, Value::Boolean),
        ColumnType::Timestamp => row
            .get::<_, Option<DateTime<Utc>>>(idx)?
            .map_or(Value::Null, Value::Timestamp),
    })
}
