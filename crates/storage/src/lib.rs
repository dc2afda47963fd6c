//! Storage abstraction and implementations for Bidboard.
//!
//! This crate provides a trait-based entity store with an in-memory
//! implementation for caching and a JSON file implementation that also
//! persists the session token.

#![warn(missing_docs)]

pub mod trait_;
pub mod session;
pub mod memory_storage;
pub mod json_storage;

pub use trait_::{Storage, StorageError, Result};
pub use session::Session;
pub use memory_storage::MemoryStorage;
pub use json_storage::JsonStorage;
