//! Schema discovery

pub mod locator;

pub use locator::SchemaLocator;
