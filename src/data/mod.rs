//! Data ingestion and storage
//!
//! The nflverse provider client, the in-memory table model, the SQLite
//! destination store, and the tabular loader that ties them together.

pub mod loader;
pub mod provider;
pub mod store;
pub mod table;

pub use loader::{load, load_with_options, LoadOptions, LoadReport};
pub use provider::{Dataset, Provider};
pub use store::Store;
pub use table::{Column, ColumnType, Table, Value};
