//! Core types and trait definitions for the UnxChange convocatorias service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod convocatoria;
pub mod error;
pub mod interest;
pub mod legacy;
pub mod query;
pub mod role;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
