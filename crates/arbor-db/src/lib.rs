//! Database session layer for the arbor ORM.
//!
//! Owns the single SQLite connection, executes the SQL that `arbor-orm`
//! schemas generate, binds parameter values positionally, and
//! materializes result rows back into records — including recursive
//! foreign-key resolution, so a fetched record carries fully materialized
//! referenced records rather than bare ids.
//!
//! # Design decisions
//!
//! - **One connection, one writer**: the session exclusively owns its
//!   `rusqlite::Connection`. There is no pool, no statement cache, and no
//!   reconnect logic; callers needing concurrency serialize externally.
//! - **Autocommit durability**: the connection stays in SQLite's
//!   autocommit mode and the session never opens explicit transactions,
//!   so every mutating call (`save`, `update`, `delete`) is durable when
//!   it returns.
//! - **Errors propagate unchanged**: driver failures surface as
//!   [`DbError::Database`] with no retry or rollback beyond SQLite's own
//!   single-statement atomicity. Absence is not failure — a `get` with
//!   no matches returns an empty `Vec`.

mod session;

pub use session::{Database, DbError, SessionSettings};

#[cfg(test)]
mod tests;
