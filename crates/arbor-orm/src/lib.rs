//! Declarative schema model and SQL generation for the arbor ORM.
//!
//! Programs declare record schemas as data — named scalar columns and
//! foreign keys collected through a builder — and this crate turns those
//! declarations into SQLite statement text: create, sparse insert,
//! update, select, filtered select, and delete, together with the
//! positional bind values for each. Execution lives in `arbor-db`; this
//! crate never touches a connection.
//!
//! # Design decisions
//!
//! - **Explicit registration instead of reflection**: a schema's field
//!   list is built once at declaration time and held sorted by field
//!   name. Repeated SQL generation is byte-identical, and parameter
//!   order is stable, which keeps generated text directly testable.
//! - **Schemas are statics**: a [`ForeignKey`] borrows the schema it
//!   points at for `'static`, so references need no ownership story —
//!   schemas are module-level `LazyLock` constants with independent
//!   lifetimes.
//! - **Tagged reference state**: a foreign-key value is always either an
//!   unresolved row identity or a fully materialized [`Record`], never
//!   an informal id-or-object union.
//! - **Declaration errors are fatal**: duplicate fields, an explicit
//!   `id`, or colliding storage columns are programming mistakes and are
//!   rejected when the schema is built.

mod error;
mod record;
mod schema;
mod types;
mod value;

pub use error::{RecordError, SchemaError};
pub use record::{FieldValue, ForeignValue, Record};
pub use schema::{Column, Field, FieldDef, ForeignKey, SchemaBuilder, TableSchema};
pub use types::{ColumnType, DefaultValue};
pub use value::Value;
