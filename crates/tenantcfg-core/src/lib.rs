//! Core types and trait definitions for the tenant configuration store.
//!
//! This crate is deliberately free of database and I/O dependencies.
//! Storage backends and tools depend on it; it depends on nothing of theirs.

pub mod error;
pub mod knowledge;
pub mod settings;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
