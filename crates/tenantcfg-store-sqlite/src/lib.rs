//! SQLite backend for the tenant configuration store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every commit and revert is a single
//! `IMMEDIATE` transaction, entered only while holding that tenant's write
//! section.

mod encode;
mod locks;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteStore, StoreOptions};
