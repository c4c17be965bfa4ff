//! Schema-driven CRUD resources over document stores.
//!
//! This crate is the core of the docrest project and provides:
//!
//! - **Schemas** ([`schema`]) - Typed field declarations, the field kind taxonomy, argument
//!   synthesis, filter expansion, value coercion and request parsers
//! - **Resources** ([`resource`]) - Composable List/Create/Retrieve/Update/Delete behaviors
//!   with permission hooks
//! - **Requests** ([`request`]) - Verbs, raw request arguments and responses
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Query and filtering API** ([`query`]) - Filter expressions, ordering and slicing
//! - **Collections interface** ([`collection`]) - Per-collection store operations
//! - **Document store** ([`store`]) - The handle resources hold on a backend
//! - **Documents** ([`document`]) - Identifiers and BSON/JSON conversion
//! - **Pagination** ([`page`]) - Pagination settings and computed pages
//! - **Error handling** ([`error`]) - Store and resource error types
//!
//! # Example
//!
//! ```ignore
//! use docrest::prelude::*;
//!
//! let users = Schema::builder("users")
//!     .id("username", IdKind::String)
//!     .field(FieldDescriptor::string("username"))
//!     .field(FieldDescriptor::int("age"))
//!     .build();
//!
//! let resource = Resource::builder(users, DocumentStore::new(InMemoryStore::new()))
//!     .crud(List::default())
//!     .build();
//!
//! let created = resource
//!     .handle(Verb::Post, &RequestArgs::new().with_body(json!({ "username": "alice", "age": 30 })))
//!     .await;
//! assert_eq!(created.status, 200);
//! ```

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod page;
pub mod query;
pub mod request;
pub mod resource;
pub mod schema;
pub mod store;
