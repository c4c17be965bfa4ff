//! In-memory document storage backend for docrest.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development,
//! testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Type-erased storage** - Stores documents as BSON for flexibility
//! - **Full query support** - Filtering with every filter operator, multi-key sorting,
//!   slicing, field exclusion and counting
//! - **Stable listing** - Unsorted queries return documents in insertion order
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!
//!     store
//!         .collection("users")
//!         .insert(vec![(DocumentId::from("alice"), Bson::Document(doc! { "username": "alice" }))])
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
