//! Declarative table schemas and SQL text generation.
//!
//! A [`TableSchema`] is the declarative unit: a named set of scalar
//! columns and foreign keys, built once through [`SchemaBuilder`] and
//! then immutable. Schemas are typically module-level `LazyLock`
//! statics, which is what lets a [`ForeignKey`] hold a plain `&'static`
//! reference to the schema it points at.
//!
//! All SQL text is generated by introspecting the declared field list.
//! Fields are stored sorted lexicographically by field name, so repeated
//! generation for the same declarations is byte-identical and the
//! positional parameter order is stable — generated SQL is directly
//! comparable in tests.

use crate::error::{RecordError, SchemaError};
use crate::record::{FieldValue, Record};
use crate::types::{ColumnType, DefaultValue};
use crate::value::Value;

/// A scalar column declaration: semantic type plus optional default
/// marker. Immutable after declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    column_type: ColumnType,
    default: Option<DefaultValue>,
}

impl Column {
    /// Declares a column of the given semantic type with no default.
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            default: None,
        }
    }

    /// Declares a column with a symbolic default marker.
    pub fn with_default(column_type: ColumnType, default: DefaultValue) -> Self {
        Self {
            column_type,
            default: Some(default),
        }
    }

    /// The declared semantic type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// The resolved SQLite type name.
    pub fn resolved_type(&self) -> &'static str {
        self.column_type.sql_name()
    }

    /// The SQL default clause, empty when no marker was declared.
    pub fn default_clause(&self) -> &'static str {
        self.default.map_or("", DefaultValue::sql_clause)
    }
}

/// A reference field pointing at another table schema.
///
/// The link is weak: the descriptor borrows the referenced schema (a
/// module-level static) and never owns it. The reference contributes a
/// `<name>_id INTEGER` column to the declaring table.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    references: &'static TableSchema,
}

impl ForeignKey {
    /// Declares a reference to the given schema.
    pub fn new(references: &'static TableSchema) -> Self {
        Self { references }
    }

    /// The schema this reference points at.
    pub fn referenced_schema(&self) -> &'static TableSchema {
        self.references
    }
}

impl PartialEq for ForeignKey {
    // Identity comparison: two references are equal when they point at
    // the same schema static.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.references, other.references)
    }
}

/// What a field is declared as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDef {
    /// A scalar column.
    Column(Column),
    /// A reference to another schema.
    ForeignKey(ForeignKey),
}

/// One named field on a schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    name: &'static str,
    def: FieldDef,
}

impl Field {
    /// The declared field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The field's declaration.
    pub fn def(&self) -> &FieldDef {
        &self.def
    }

    /// The storage column backing this field: the field name itself for
    /// columns, `<name>_id` for foreign keys.
    pub fn column_name(&self) -> String {
        match self.def {
            FieldDef::Column(_) => self.name.to_string(),
            FieldDef::ForeignKey(_) => format!("{}_id", self.name),
        }
    }
}

/// A declared record schema mapping to one SQLite table.
///
/// Every table carries an implicit `id INTEGER PRIMARY KEY AUTOINCREMENT`
/// first column; `id` is never declared explicitly.
///
/// ```
/// use std::sync::LazyLock;
/// use arbor_orm::{ColumnType, TableSchema};
///
/// static AUTHOR: LazyLock<TableSchema> = LazyLock::new(|| {
///     TableSchema::builder("Author")
///         .column("name", ColumnType::Text)
///         .column("age", ColumnType::Integer)
///         .build()
/// });
///
/// assert_eq!(
///     AUTHOR.create_sql(),
///     "CREATE TABLE IF NOT EXISTS author (id INTEGER PRIMARY KEY AUTOINCREMENT, \
///      age INTEGER, name TEXT);"
/// );
/// ```
#[derive(Debug, PartialEq)]
pub struct TableSchema {
    name: String,
    fields: Vec<Field>,
}

impl TableSchema {
    /// Starts a schema declaration. The schema name is lowercased to
    /// form the table name.
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_lowercase(),
            fields: Vec::new(),
        }
    }

    /// The storage table name.
    pub fn table_name(&self) -> &str {
        &self.name
    }

    /// Declared fields, sorted by field name.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .binary_search_by(|f| f.name.cmp(&name))
            .ok()
            .map(|idx| &self.fields[idx])
    }

    /// The ordered storage column list: `id` first, then one column per
    /// declared field.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.fields.len() + 1);
        names.push("id".to_string());
        names.extend(self.fields.iter().map(Field::column_name));
        names
    }

    fn has_column(&self, name: &str) -> bool {
        name == "id" || self.fields.iter().any(|f| f.column_name() == name)
    }

    /// Generates the idempotent create-table statement.
    pub fn create_sql(&self) -> String {
        let mut defs = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for field in &self.fields {
            match &field.def {
                FieldDef::Column(column) => {
                    let mut def = format!("{} {}", field.name, column.resolved_type());
                    if column.default.is_some() {
                        def.push(' ');
                        def.push_str(column.default_clause());
                    }
                    defs.push(def);
                }
                FieldDef::ForeignKey(_) => {
                    defs.push(format!("{}_id INTEGER", field.name));
                }
            }
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            self.name,
            defs.join(", ")
        )
    }

    /// Generates a sparse insert statement plus bind values for one
    /// record.
    ///
    /// Scalar columns are included only when the record holds a non-null
    /// value for them, so storage defaults apply to whatever is omitted.
    /// Foreign keys are always included, binding the referenced row's
    /// identity (NULL when the field was never set). A record with
    /// nothing to bind degenerates to `INSERT INTO <t> DEFAULT VALUES;`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnsavedReference`] if a foreign-key field
    /// holds a record without an identity.
    pub fn insert_sql(&self, record: &Record) -> Result<(String, Vec<Value>), RecordError> {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for field in &self.fields {
            match &field.def {
                FieldDef::Column(_) => {
                    if let Some(FieldValue::Scalar(value)) = record.get(field.name) {
                        if !value.is_null() {
                            columns.push(field.name.to_string());
                            values.push(value.clone());
                        }
                    }
                }
                FieldDef::ForeignKey(_) => {
                    columns.push(field.column_name());
                    values.push(self.reference_value(record, field.name)?);
                }
            }
        }

        if columns.is_empty() {
            return Ok((format!("INSERT INTO {} DEFAULT VALUES;", self.name), values));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.name,
            columns.join(", "),
            placeholders
        );
        Ok((sql, values))
    }

    /// Generates an update statement over every declared field, keyed by
    /// the record's identity. The instance id is appended as the final
    /// bind value for the WHERE clause; the `id` column itself is never
    /// part of the SET clause.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingId`] if the record was never saved,
    /// or [`RecordError::UnsavedReference`] for a reference without an
    /// identity.
    pub fn update_sql(&self, record: &Record) -> Result<(String, Vec<Value>), RecordError> {
        let id = record.id().ok_or_else(|| RecordError::MissingId {
            table: self.name.clone(),
        })?;

        let mut assignments = Vec::new();
        let mut values = Vec::new();
        for field in &self.fields {
            assignments.push(format!("{} = ?", field.column_name()));
            match &field.def {
                FieldDef::Column(_) => match record.get(field.name) {
                    Some(FieldValue::Scalar(value)) => values.push(value.clone()),
                    _ => values.push(Value::Null),
                },
                FieldDef::ForeignKey(_) => {
                    values.push(self.reference_value(record, field.name)?);
                }
            }
        }
        values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?;",
            self.name,
            assignments.join(", ")
        );
        Ok((sql, values))
    }

    /// Generates the select-all statement plus the ordered column list
    /// callers zip returned rows against.
    pub fn select_all_sql(&self) -> (String, Vec<String>) {
        let columns = self.column_names();
        let sql = format!("SELECT {} FROM {};", columns.join(", "), self.name);
        (sql, columns)
    }

    /// Generates a filtered select from equality pairs, in the order the
    /// filters were supplied. Bind values are returned separately.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`] if a filter names a column
    /// the schema does not have. Filter names are interpolated into the
    /// statement text, so unchecked caller strings never reach the SQL.
    pub fn select_where_sql(
        &self,
        filters: &[(&str, Value)],
    ) -> Result<(String, Vec<String>, Vec<Value>), RecordError> {
        let (sql, columns) = self.select_all_sql();
        if filters.is_empty() {
            return Ok((sql, columns, Vec::new()));
        }

        let mut clauses = Vec::with_capacity(filters.len());
        let mut values = Vec::with_capacity(filters.len());
        for (key, value) in filters {
            if !self.has_column(key) {
                return Err(RecordError::UnknownField {
                    table: self.name.clone(),
                    field: (*key).to_string(),
                });
            }
            clauses.push(format!("{key} = ?"));
            values.push(value.clone());
        }

        let sql = format!(
            "{} WHERE {};",
            sql.trim_end_matches(';'),
            clauses.join(" AND ")
        );
        Ok((sql, columns, values))
    }

    /// Generates the delete-by-identity statement; the caller binds the
    /// record's id.
    pub fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = ?;", self.name)
    }

    fn reference_value(&self, record: &Record, field: &'static str) -> Result<Value, RecordError> {
        match record.get(field) {
            Some(FieldValue::Reference(reference)) => {
                reference
                    .id()
                    .map(Value::Integer)
                    .ok_or_else(|| RecordError::UnsavedReference {
                        table: self.name.clone(),
                        field: field.to_string(),
                    })
            }
            _ => Ok(Value::Null),
        }
    }
}

/// Builder for [`TableSchema`] declarations.
///
/// Collects named fields, then validates and normalizes the declaration
/// at build time: fields are sorted lexicographically by name, duplicate
/// or reserved names are rejected, and so are two fields whose storage
/// columns collide.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Declares a scalar column.
    pub fn column(self, name: &'static str, column_type: ColumnType) -> Self {
        self.add(name, FieldDef::Column(Column::new(column_type)))
    }

    /// Declares a scalar column with a symbolic default marker.
    pub fn column_with_default(
        self,
        name: &'static str,
        column_type: ColumnType,
        default: DefaultValue,
    ) -> Self {
        self.add(name, FieldDef::Column(Column::with_default(column_type, default)))
    }

    /// Declares a foreign key to another schema.
    pub fn foreign_key(self, name: &'static str, references: &'static TableSchema) -> Self {
        self.add(name, FieldDef::ForeignKey(ForeignKey::new(references)))
    }

    fn add(mut self, name: &'static str, def: FieldDef) -> Self {
        self.fields.push(Field { name, def });
        self
    }

    /// Builds the schema.
    ///
    /// # Panics
    ///
    /// Panics on a declaration contract violation (duplicate field,
    /// reserved `id` field, storage column collision). Declarations live
    /// in module-level statics; a broken one is a programming mistake
    /// that should not be recoverable. Use [`SchemaBuilder::try_build`]
    /// to inspect the error instead.
    pub fn build(self) -> TableSchema {
        self.try_build()
            .unwrap_or_else(|e| panic!("invalid schema declaration: {e}"))
    }

    /// Builds the schema, returning declaration errors to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] for duplicate field names, an explicit
    /// `id` field, or two fields whose storage columns collide.
    pub fn try_build(self) -> Result<TableSchema, SchemaError> {
        let mut fields = self.fields;
        fields.sort_by(|a, b| a.name.cmp(b.name));

        for pair in fields.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(SchemaError::DuplicateField {
                    table: self.name,
                    name: pair[0].name.to_string(),
                });
            }
        }

        if fields.iter().any(|f| f.name == "id") {
            return Err(SchemaError::ReservedField { table: self.name });
        }

        let mut columns: Vec<(String, &'static str)> = fields
            .iter()
            .map(|f| (f.column_name(), f.name))
            .collect();
        columns.push(("id".to_string(), "id"));
        columns.sort();
        for pair in columns.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(SchemaError::ColumnCollision {
                    table: self.name,
                    first: pair[0].1.to_string(),
                    second: pair[1].1.to_string(),
                    column: pair[0].0.clone(),
                });
            }
        }

        Ok(TableSchema {
            name: self.name,
            fields,
        })
    }
}
