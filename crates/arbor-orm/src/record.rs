//! Record instances: one in-memory row bound to a schema.
//!
//! A [`Record`] stores its field values in an explicit map keyed by field
//! name — there is no attribute interception. Writes go through
//! [`Record::set`] / [`Record::set_reference`], which validate the field
//! name and value shape against the schema; reads come back through
//! typed getters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::RecordError;
use crate::schema::{FieldDef, TableSchema};
use crate::value::Value;

/// A foreign-key field value.
///
/// The id-or-object duality is an explicit tagged state: a reference is
/// either a bare row identity or a fully materialized record of the
/// referenced schema. Session reads produce [`ForeignValue::Resolved`];
/// either state can be written and saved, since SQL generation only
/// needs the identity.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignValue {
    /// Identity of the referenced row, not materialized.
    Unresolved(i64),
    /// Fully materialized referenced record.
    Resolved(Box<Record>),
}

impl ForeignValue {
    /// The referenced row identity, if one is known. A resolved record
    /// that was never saved has none.
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Unresolved(id) => Some(*id),
            Self::Resolved(record) => record.id(),
        }
    }

    /// The materialized record, when resolved.
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Resolved(record) => Some(record),
            Self::Unresolved(_) => None,
        }
    }
}

impl From<Record> for ForeignValue {
    fn from(record: Record) -> Self {
        Self::Resolved(Box::new(record))
    }
}

impl From<i64> for ForeignValue {
    fn from(id: i64) -> Self {
        Self::Unresolved(id)
    }
}

/// One field slot on a record: a scalar or a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A scalar column value.
    Scalar(Value),
    /// A foreign-key value.
    Reference(ForeignValue),
}

/// One in-memory row bound to a [`TableSchema`].
///
/// The identity is `None` until a session persists the record; after a
/// successful insert it holds the storage-assigned row id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: &'static TableSchema,
    id: Option<i64>,
    values: BTreeMap<&'static str, FieldValue>,
}

impl Record {
    /// Creates an empty record for the given schema.
    pub fn new(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            id: None,
            values: BTreeMap::new(),
        }
    }

    /// The schema this record belongs to.
    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// The persisted row identity, if the record has been saved.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Writes the row identity. Called by the session after a successful
    /// insert and during materialization.
    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    /// Sets a scalar field.
    ///
    /// Setting [`Value::Null`] clears the field, leaving it unset.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`] for a name the schema does
    /// not declare, [`RecordError::KindMismatch`] when the field is a
    /// foreign key, and [`RecordError::TypeMismatch`] when the value does
    /// not fit the declared column type.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self, RecordError> {
        let declared = self.field(field)?;
        let name = declared.name();
        let column = match declared.def() {
            FieldDef::Column(column) => *column,
            FieldDef::ForeignKey(_) => {
                return Err(RecordError::KindMismatch {
                    table: self.schema.table_name().to_string(),
                    field: name.to_string(),
                    declared: "foreign key",
                })
            }
        };

        let value = value.into();
        if !value.fits(column.column_type()) {
            return Err(RecordError::TypeMismatch {
                table: self.schema.table_name().to_string(),
                field: name.to_string(),
                expected: column.column_type(),
                got: value.kind(),
            });
        }

        if value.is_null() {
            self.values.remove(name);
        } else {
            self.values.insert(name, FieldValue::Scalar(value));
        }
        Ok(self)
    }

    /// Sets a foreign-key field, either from a referenced [`Record`]
    /// (resolved) or a bare row id (unresolved).
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`] for an undeclared name and
    /// [`RecordError::KindMismatch`] when the field is a scalar column.
    pub fn set_reference(
        &mut self,
        field: &str,
        value: impl Into<ForeignValue>,
    ) -> Result<&mut Self, RecordError> {
        let declared = self.field(field)?;
        let name = declared.name();
        if let FieldDef::Column(_) = declared.def() {
            return Err(RecordError::KindMismatch {
                table: self.schema.table_name().to_string(),
                field: name.to_string(),
                declared: "column",
            });
        }

        self.values
            .insert(name, FieldValue::Reference(value.into()));
        Ok(self)
    }

    /// The raw slot for a field, if set.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Integer value of a scalar field.
    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.get(field) {
            Some(FieldValue::Scalar(Value::Integer(v))) => Some(*v),
            _ => None,
        }
    }

    /// Real value of a scalar field.
    pub fn real(&self, field: &str) -> Option<f64> {
        match self.get(field) {
            Some(FieldValue::Scalar(Value::Real(v))) => Some(*v),
            _ => None,
        }
    }

    /// Text value of a scalar field.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Scalar(Value::Text(v))) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Blob value of a scalar field.
    pub fn blob(&self, field: &str) -> Option<&[u8]> {
        match self.get(field) {
            Some(FieldValue::Scalar(Value::Blob(v))) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Boolean value of a scalar field.
    pub fn boolean(&self, field: &str) -> Option<bool> {
        match self.get(field) {
            Some(FieldValue::Scalar(Value::Boolean(v))) => Some(*v),
            _ => None,
        }
    }

    /// Timestamp value of a scalar field.
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.get(field) {
            Some(FieldValue::Scalar(Value::Timestamp(v))) => Some(*v),
            _ => None,
        }
    }

    /// The materialized record behind a resolved foreign-key field.
    pub fn record(&self, field: &str) -> Option<&Record> {
        match self.get(field) {
            Some(FieldValue::Reference(reference)) => reference.record(),
            _ => None,
        }
    }

    /// The row identity behind a foreign-key field, in either state.
    pub fn reference_id(&self, field: &str) -> Option<i64> {
        match self.get(field) {
            Some(FieldValue::Reference(reference)) => reference.id(),
            _ => None,
        }
    }

    fn field(&self, name: &str) -> Result<&crate::schema::Field, RecordError> {
        self.schema
            .field(name)
            .ok_or_else(|| RecordError::UnknownField {
                table: self.schema.table_name().to_string(),
                field: name.to_string(),
            })
    }
}
