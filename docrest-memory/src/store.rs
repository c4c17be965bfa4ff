//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that stores documents as BSON
//! values in HashMaps behind async-safe read-write locks.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document};

use docrest_core::{
    document::DocumentId,
    query::{Expr, Query, SortDirection},
    error::{DocumentStoreError, DocumentStoreResult},
    backend::{StoreBackend, StoreBackendBuilder},
};

use crate::evaluator::{DocumentEvaluator, Comparable};

/// One collection: document key -> (insertion sequence, document).
#[derive(Debug, Default)]
struct CollectionMap {
    next_seq: u64,
    documents: HashMap<String, (u64, Bson)>,
}

impl CollectionMap {
    /// Documents in insertion order.
    fn ordered(&self) -> Vec<&Bson> {
        let mut entries: Vec<&(u64, Bson)> = self.documents.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries
            .into_iter()
            .map(|(_, doc)| doc)
            .collect()
    }

    fn matching(&self, filter: Option<&Expr>) -> DocumentStoreResult<Vec<Bson>> {
        let ordered = self.ordered();
        match filter {
            Some(filter) => DocumentEvaluator::filter_documents(ordered, filter),
            None => Ok(ordered.into_iter().cloned().collect()),
        }
    }
}

type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait to provide a fully functional
/// document store that operates entirely in memory using async-aware read-write locks.
/// Documents are indexed by the textual form of their identifier and listed in
/// insertion order unless the query sorts them.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries scan all documents in a collection (no indexing). For small to medium
/// datasets (< 100k documents), this is typically acceptable. For larger datasets,
/// consider using a persistent backend like MongoDB.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest::backend::StoreBackend;
/// use docrest::document::DocumentId;
/// use bson::{Bson, doc};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     let id = DocumentId::from("alice");
///     let doc = Bson::Document(doc! { "username": "alice", "age": 30 });
///     store.insert_documents(vec![(id.clone(), doc)], "users").await?;
///
///     let docs = store.get_documents(vec![id], "users").await?;
///     assert_eq!(docs.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// The main storage map: collection_name -> documents
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docrest_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder().build().await.unwrap();
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn as_document<'a>(doc: &'a Bson, collection: &str) -> DocumentStoreResult<&'a Document> {
    doc.as_document()
        .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("expected a document in {collection}, got {doc}")))
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(DocumentId, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        for (id, doc) in documents {
            as_document(&doc, collection)?;
            let key = id.to_string();

            if collection_map.documents.contains_key(&key) {
                return Err(DocumentStoreError::DocumentAlreadyExists(key, collection.to_string()));
            }

            let seq = collection_map.next_seq;
            collection_map.next_seq += 1;
            collection_map.documents.insert(key, (seq, doc));
        }

        Ok(())
    }

    async fn update_documents(&self, documents: Vec<(DocumentId, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(DocumentStoreError::CollectionNotFound(collection.to_string())),
        };

        for (id, doc) in documents {
            as_document(&doc, collection)?;
            let key = id.to_string();

            match collection_map.documents.get_mut(&key) {
                Some((_, existing)) => *existing = doc,
                None => return Err(DocumentStoreError::DocumentNotFound(key, collection.to_string())),
            }
        }

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<DocumentId>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(DocumentStoreError::CollectionNotFound(collection.to_string())),
        };

        for id in ids {
            let key = id.to_string();

            if collection_map.documents.remove(&key).is_none() {
                return Err(DocumentStoreError::DocumentNotFound(key, collection.to_string()));
            }
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<DocumentId>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(
            ids
                .iter()
                .filter_map(|id| collection_map.documents.get(&id.to_string()))
                .map(|(_, doc)| doc.clone())
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut docs = collection_map.matching(query.filter.as_ref())?;

        if !query.sort.is_empty() {
            // Stable sort, so ties keep insertion order
            docs.sort_by(|a, b| {
                let (Some(a), Some(b)) = (a.as_document(), b.as_document()) else {
                    return std::cmp::Ordering::Equal;
                };

                query
                    .sort
                    .iter()
                    .map(|sort| {
                        let left = a.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);
                        let right = b.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);

                        match sort.direction {
                            SortDirection::Asc => left.sort_cmp(&right),
                            SortDirection::Desc => right.sort_cmp(&left),
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        Ok(
            docs
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .map(|mut doc| {
                    if let Some(fields) = doc.as_document_mut() {
                        for excluded in &query.exclude {
                            fields.remove(excluded);
                        }
                    }
                    doc
                })
                .collect()
        )
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<usize> {
        let store = self.store.read().await;

        match store.get(collection) {
            Some(collection_map) => Ok(collection_map.matching(filter.as_ref())?.len()),
            None => Ok(0),
        }
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest::backend::StoreBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
