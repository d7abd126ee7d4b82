//! Key-value store adapters
//!
//! File- and table-backed implementations of the `KeyValueStore` port.

pub mod json_file;
pub mod postgres;

pub use json_file::JsonFileStore;
pub use postgres::PostgresStore;
