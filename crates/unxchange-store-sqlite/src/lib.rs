//! SQLite backend for the UnxChange convocatorias collection.
//!
//! Records are stored as JSON documents, one row each, tagged with the schema
//! version they were written with. Interest registrations live in a separate
//! membership table. Wraps [`tokio_rusqlite`] so all database access runs on a
//! dedicated thread without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
