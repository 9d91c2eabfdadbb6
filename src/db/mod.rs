//! Database access layer

pub mod executor;

pub use executor::{PostgresExecutor, QueryExecutor};
