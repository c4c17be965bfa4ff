//! Storage backend abstraction for document resources.
//!
//! This module defines the trait that abstracts over the storage implementations,
//! allowing resources to work with any backend (in-memory, MongoDB, ...).
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for the operations the
//! resource layer needs: inserting, replacing, deleting and fetching documents by
//! identifier, querying with filters/ordering/exclusion/slicing, and counting.
//! Implementations are required to be thread-safe (`Send + Sync`).
//!
//! # Examples
//!
//! ```ignore
//! use docrest::backend::StoreBackend;
//! use docrest::document::DocumentId;
//! use bson::{Bson, doc};
//!
//! let backend = MyBackendImpl::new();
//!
//! let id = DocumentId::from("alice");
//! let doc = Bson::Document(doc! { "username": "alice", "age": 30 });
//! backend.insert_documents(vec![(id, doc)], "users").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Bson;
use std::{fmt::Debug, sync::Arc};

use crate::{
    document::DocumentId,
    error::DocumentStoreResult,
    query::{Expr, Query},
};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. Backends are expected to make single-document writes atomic; no
/// isolation is required between separate calls (a `count_documents` followed by a
/// `query_documents` may observe different data).
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Write rejections should be reported with a message suitable for a client.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents into a collection.
    ///
    /// The collection is created on first insert. Inserting an identifier that already
    /// exists must fail with
    /// [`DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists).
    async fn insert_documents(
        &self,
        documents: Vec<(DocumentId, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Replaces existing documents in a collection.
    ///
    /// Replacing an identifier that does not exist must fail with
    /// [`DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound).
    async fn update_documents(
        &self,
        documents: Vec<(DocumentId, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Deletes documents from a collection by their identifiers.
    async fn delete_documents(
        &self,
        ids: Vec<DocumentId>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Retrieves documents from a collection by their identifiers.
    ///
    /// Identifiers that don't exist are omitted from the result; a missing collection
    /// yields an empty result.
    async fn get_documents(
        &self,
        ids: Vec<DocumentId>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Queries documents in a collection.
    ///
    /// Applies the filter, then the sort keys in order, then the offset and limit, and
    /// finally removes the excluded fields from each returned document.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Counts the documents matching a filter (all documents when `filter` is `None`).
    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<usize>;
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_documents(
        &self,
        documents: Vec<(DocumentId, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (*self)
            .insert_documents(documents, collection)
            .await
    }

    async fn update_documents(
        &self,
        documents: Vec<(DocumentId, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (*self)
            .update_documents(documents, collection)
            .await
    }

    async fn delete_documents(
        &self,
        ids: Vec<DocumentId>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (*self)
            .delete_documents(ids, collection)
            .await
    }

    async fn get_documents(
        &self,
        ids: Vec<DocumentId>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self)
            .get_documents(ids, collection)
            .await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self)
            .query_documents(query, collection)
            .await
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<usize> {
        (*self)
            .count_documents(filter, collection)
            .await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend,
{
    async fn insert_documents(
        &self,
        documents: Vec<(DocumentId, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (**self)
            .insert_documents(documents, collection)
            .await
    }

    async fn update_documents(
        &self,
        documents: Vec<(DocumentId, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (**self)
            .update_documents(documents, collection)
            .await
    }

    async fn delete_documents(
        &self,
        ids: Vec<DocumentId>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (**self)
            .delete_documents(ids, collection)
            .await
    }

    async fn get_documents(
        &self,
        ids: Vec<DocumentId>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (**self)
            .get_documents(ids, collection)
            .await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (**self)
            .query_documents(query, collection)
            .await
    }

    async fn count_documents(
        &self,
        filter: Option<Expr>,
        collection: &str,
    ) -> DocumentStoreResult<usize> {
        (**self)
            .count_documents(filter, collection)
            .await
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
