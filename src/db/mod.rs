//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: all SQL, grouped on the `Storage` pool wrapper

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbCursor, DbLanguage, DbPost, DbPractice, DbUser, DbVocable, Translation};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};
