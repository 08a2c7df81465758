//! # sheetstore-store
//!
//! SQLite storage for the sheet handlers. The crate exposes a synchronous
//! [`Database`] handle that wraps a `rusqlite::Connection` and provides typed
//! CRUD helpers for cells, column names and images. Every statement binds
//! its values as parameters.

pub mod cells;
pub mod column_names;
pub mod database;
pub mod images;
pub mod migrations;
pub mod models;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
