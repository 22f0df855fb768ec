//! Error types for schema declaration and record handling.

use thiserror::Error;

use crate::types::ColumnType;

/// Errors raised while a schema declaration is being built.
///
/// Every variant is a programming mistake in the declaration itself, not
/// a runtime condition: it surfaces once, when the schema is built.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two fields were declared under the same name.
    #[error("duplicate field '{name}' on table '{table}'")]
    DuplicateField {
        /// Table the declaration belongs to.
        table: String,
        /// The colliding field name.
        name: String,
    },

    /// The implicit `id` field was declared explicitly.
    #[error("field 'id' on table '{table}' is reserved for the primary key")]
    ReservedField {
        /// Table the declaration belongs to.
        table: String,
    },

    /// Two distinct fields map to the same storage column, e.g. a column
    /// named `author_id` next to a foreign key named `author`.
    #[error("fields '{first}' and '{second}' on table '{table}' both map to column '{column}'")]
    ColumnCollision {
        /// Table the declaration belongs to.
        table: String,
        /// First field involved in the collision.
        first: String,
        /// Second field involved in the collision.
        second: String,
        /// The shared storage column name.
        column: String,
    },
}

/// Errors raised while working with a record instance or generating SQL
/// from one.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The named field is not declared on the record's schema.
    #[error("table '{table}' has no field '{field}'")]
    UnknownField {
        /// Table of the record's schema.
        table: String,
        /// The unknown field name.
        field: String,
    },

    /// A scalar value does not match the declared column type.
    #[error("field '{field}' on table '{table}' is declared {expected:?}, got a {got} value")]
    TypeMismatch {
        /// Table of the record's schema.
        table: String,
        /// The field being assigned.
        field: String,
        /// The declared column type.
        expected: ColumnType,
        /// Variant name of the rejected value.
        got: &'static str,
    },

    /// A scalar was assigned to a foreign-key field, or a reference to a
    /// scalar column.
    #[error("field '{field}' on table '{table}' is a {declared} field")]
    KindMismatch {
        /// Table of the record's schema.
        table: String,
        /// The field being assigned.
        field: String,
        /// What the field was declared as (`"column"` or `"foreign key"`).
        declared: &'static str,
    },

    /// The record has never been saved, so it has no identity to address.
    #[error("record for table '{table}' has no id; save it first")]
    MissingId {
        /// Table of the record's schema.
        table: String,
    },

    /// A foreign-key field holds a record that has never been saved.
    #[error("foreign key '{field}' on table '{table}' references an unsaved record")]
    UnsavedReference {
        /// Table of the record's schema.
        table: String,
        /// The foreign-key field name.
        field: String,
    },
}
