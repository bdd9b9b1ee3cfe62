//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and insert payloads
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: `SuperheroStorage`, the query layer over the pool

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbImage, DbImageBlob, DbSuperhero, NewImage, SuperheroFields};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, SuperheroStorage, connect};
