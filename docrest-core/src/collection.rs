//! Collection handle for document store operations.
//!
//! A [`Collection`] pairs a collection name with a backend reference and exposes the
//! operations the resource layer performs on a single collection.
//!
//! # Example
//!
//! ```ignore
//! use docrest::document::DocumentId;
//! use bson::{Bson, doc};
//!
//! # async fn example(store: &docrest::store::DocumentStore<impl docrest::backend::StoreBackend>) -> docrest::error::DocumentStoreResult<()> {
//! let users = store.collection("users");
//! users.insert(vec![(DocumentId::from("alice"), Bson::Document(doc! { "username": "alice" }))]).await?;
//! let alice = users.find_one(&DocumentId::from("alice")).await?;
//! # Ok(()) }
//! ```

use bson::Bson;

use crate::{
    backend::StoreBackend,
    document::DocumentId,
    error::DocumentStoreResult,
    query::{Expr, Query},
};

/// A named collection with a reference to a storage backend.
///
/// All documents are represented as BSON values.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts new documents into the collection.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if an identifier
    /// already exists or the backend fails.
    pub async fn insert(&self, documents: Vec<(DocumentId, Bson)>) -> DocumentStoreResult<()> {
        self.backend
            .insert_documents(documents, self.name())
            .await
    }

    /// Replaces existing documents in the collection.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if a document
    /// does not exist or the backend fails.
    pub async fn update(&self, documents: Vec<(DocumentId, Bson)>) -> DocumentStoreResult<()> {
        self.backend
            .update_documents(documents, self.name())
            .await
    }

    /// Deletes documents from the collection by their identifiers.
    pub async fn delete(&self, ids: Vec<DocumentId>) -> DocumentStoreResult<()> {
        self.backend
            .delete_documents(ids, self.name())
            .await
    }

    /// Retrieves documents by their identifiers, omitting the ones that don't exist.
    pub async fn get(&self, ids: Vec<DocumentId>) -> DocumentStoreResult<Vec<Bson>> {
        self.backend
            .get_documents(ids, self.name())
            .await
    }

    /// Retrieves a single document by identifier.
    pub async fn find_one(&self, id: &DocumentId) -> DocumentStoreResult<Option<Bson>> {
        Ok(self
            .get(vec![id.clone()])
            .await?
            .into_iter()
            .next())
    }

    /// Queries documents in the collection using a structured query.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<Bson>> {
        self.backend
            .query_documents(query, self.name())
            .await
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, filter: Option<Expr>) -> DocumentStoreResult<usize> {
        self.backend
            .count_documents(filter, self.name())
            .await
    }
}
