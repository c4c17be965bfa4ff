//! Convenient re-exports of commonly used types from docrest.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docrest::prelude::*;
//! ```
//!
//! This provides access to:
//! - Schemas, field descriptors and parsers
//! - Resources, behaviors and permission hooks
//! - Store backends and builders
//! - Query construction and filtering
//! - Error types

pub use docrest_core::{
    collection::Collection,
    store::DocumentStore,
    document::{DocumentId, IdKind},
    backend::{StoreBackend, StoreBackendBuilder},
    query::{Query, QueryVisitor, Expr, Sort, SortDirection, FieldOp, QueryBuilder, Filter},
    page::{Page, PaginationConfig, PaginationParams},
    request::{RequestArgs, Response, Verb},
    schema::{
        DocumentRef, DocumentType, FieldDescriptor, FieldType, Kind, Schema,
        argument::{ArgumentSpec, Coercer, CustomCoercer, Source},
        filter::FilterOperator,
        parser::{Parser, ResourceParsers},
    },
    resource::{
        Behavior, Create, CreatedHook, Delete, HookContext, List, ListOptions, ObjectHook,
        Permissions, Resource, ResourceBuilder, ResourceContext, Retrieve, Update,
    },
    error::{DocumentStoreError, DocumentStoreResult, PermissionDenied, ResourceError, ResourceResult},
};
pub use docrest_memory::InMemoryStore;

pub use bson::{Bson, doc};
pub use serde_json::{Value, json};
