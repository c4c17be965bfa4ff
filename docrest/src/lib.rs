//! Main docrest crate providing schema-driven CRUD resources over document stores.
//!
//! This crate is the primary entry point for users of the docrest framework.
//! It re-exports the core types and functionality from the sub-crates and provides
//! convenient access to the different storage backends.
//!
//! # Features
//!
//! - **Schema-driven parsing** - Declare a schema once; request arguments, filters and
//!   coercions are derived from it
//! - **Composable behaviors** - Pick any of List, Create, Retrieve, Update and Delete per resource
//! - **Permission hooks** - Run checks before any store access, per resource or per verb
//! - **Multiple backends** - Support for in-memory and MongoDB storage with extensible trait system
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let users = Schema::builder("users")
//!         .id("username", IdKind::String)
//!         .field(FieldDescriptor::string("username"))
//!         .field(FieldDescriptor::int("age"))
//!         .field(FieldDescriptor::list("tags", FieldDescriptor::string("tag")))
//!         .build();
//!
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await.unwrap());
//!
//!     let resource = Resource::builder(users, store)
//!         .crud(List::new(ListOptions::default().order_by(["-age"])))
//!         .build();
//!
//!     // Create a user
//!     let created = resource
//!         .handle(Verb::Post, &RequestArgs::new().with_body(json!({ "username": "alice", "age": 30 })))
//!         .await;
//!     assert_eq!(created.status, 200);
//!
//!     // Filter with generated operator arguments
//!     let adults = resource
//!         .handle(Verb::Get, &RequestArgs::new().with_query("age__gte", "18"))
//!         .await;
//!
//!     println!("{}", adults.body);
//! }
//! ```
//!
//! # Permissions
//!
//! Hooks receive the resource name, the verb and the raw arguments and may deny
//! the request before anything is read or written:
//!
//! ```ignore
//! use docrest::prelude::*;
//!
//! let permissions = Permissions::per_verb()
//!     .on(Verb::Delete, |_ctx: &HookContext<'_>| Err(PermissionDenied::forbidden("read only")));
//!
//! let resource = Resource::builder(users, store)
//!     .permissions(permissions)
//!     .crud(List::default())
//!     .build();
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docrest_core::{
    backend, collection, document, error, page, query, request, resource, schema, store,
};

// Re-export BSON and JSON types for convenience
pub use bson;
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrest_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrest_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
