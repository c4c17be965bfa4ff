//! Error types and result types for store and resource operations.
//!
//! Two layers are covered here:
//!
//! - [`DocumentStoreError`] / [`DocumentStoreResult<T>`] for the storage backends,
//! - [`ResourceError`] / [`ResourceResult<T>`] for argument parsing, coercion and
//!   the CRUD behaviors built on top of a store.

use bson::error::Error as BsonError;
use serde_json::{Error as SerdeJsonError, Value, json};
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The document violates schema constraints or has invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A query could not be evaluated or translated by the backend.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

/// Failure raised by a permission hook.
///
/// Hooks pick their own status and message; the resource passes both through untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PermissionDenied {
    pub status: u16,
    pub message: String,
}

impl PermissionDenied {
    /// A `403 Forbidden` denial.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self { status: 403, message: message.into() }
    }

    /// A `401 Unauthorized` denial.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self { status: 401, message: message.into() }
    }
}

/// Errors produced while mapping a request onto a document resource.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A required argument is missing or an argument has the wrong shape.
    #[error("{0}")]
    Validation(String),
    /// The identifier (or a reference target) does not exist.
    #[error("{0}")]
    NotFound(String),
    /// A serialized composite or geometry payload could not be parsed.
    #[error("{0}")]
    MalformedInput(String),
    /// A permission hook rejected the request.
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    /// The store rejected a write.
    #[error("{0}")]
    Persistence(String),
    /// No composed behavior answers the requested verb.
    #[error("method {0} is not allowed")]
    MethodNotAllowed(String),
    /// The store failed while reading.
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}

/// A specialized `Result` type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

impl ResourceError {
    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ResourceError::Validation(_)
            | ResourceError::MalformedInput(_)
            | ResourceError::Persistence(_) => 400,
            ResourceError::NotFound(_) => 404,
            ResourceError::MethodNotAllowed(_) => 405,
            ResourceError::PermissionDenied(denied) => denied.status,
            ResourceError::Store(DocumentStoreError::InvalidQuery(_)) => 400,
            ResourceError::Store(_) => 500,
        }
    }

    /// Error body in the `{msg, error}` shape.
    pub fn to_body(&self) -> Value {
        json!({ "msg": self.to_string(), "error": 1 })
    }
}
