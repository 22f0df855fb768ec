//! Semantic column types and their SQLite storage mappings.
//!
//! The mapping is fixed and closed: every semantic type a schema can
//! declare has exactly one SQLite column type, and both mappings are
//! exhaustive `match`es, so an unmapped type cannot exist at runtime.

use serde::{Deserialize, Serialize};

/// Semantic type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// Double-precision float.
    Real,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Binary,
    /// Boolean, stored as an SQLite integer.
    Boolean,
    /// UTC timestamp, stored as an SQLite `DATETIME`.
    Timestamp,
}

impl ColumnType {
    /// Returns the SQLite column type name used in generated DDL.
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Binary => "BLOB",
            Self::Boolean => "INTEGER",
            Self::Timestamp => "DATETIME",
        }
    }
}

/// Symbolic default markers that resolve to a storage-native clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Populate with the current timestamp when the row is inserted.
    Now,
}

impl DefaultValue {
    /// Returns the SQL default clause for this marker.
    pub fn sql_clause(self) -> &'static str {
        match self {
            Self::Now => "DEFAULT CURRENT_TIMESTAMP",
        }
    }
}
