//! Data models for unisql.
//!
//! This module re-exports the taxonomy, dialect and bind parameter types shared by every adapter.

pub mod dialect;
pub mod error_kind;
pub mod query;

pub use dialect::Dialect;
pub use error_kind::{ErrorKind, UnknownErrorKind};
pub use query::QueryParam;
