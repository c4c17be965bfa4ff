use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, Bson, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use docrest_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::DocumentId,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query, QueryVisitor, Sort, SortDirection},
};

use crate::{sanitizer::KeySanitizer, query::MongoQueryTranslator};


/// Field MongoDB keys documents by. Identifiers are stored there and stripped on read.
const ID_FIELD: &str = "_id";

#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    /// Disconnects the underlying client.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&KeySanitizer::sanitize(collection_name))
    }

    fn filter(expr: Option<&Expr>) -> DocumentStoreResult<Document> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }

    fn ids_filter(ids: &[DocumentId]) -> Document {
        doc! {
            ID_FIELD: {
                "$in": ids
                    .iter()
                    .map(DocumentId::to_bson)
                    .collect::<Vec<_>>()
            }
        }
    }

    async fn find(&self, collection: &str, filter: Document, options: FindOptions) -> DocumentStoreResult<Vec<Bson>> {
        self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .into_iter()
            .map(|doc| restore_document(&doc))
            .collect()
    }
}

pub(crate) fn prepare_document(id: &DocumentId, document: &Bson) -> DocumentStoreResult<Document> {
    let fields = KeySanitizer::sanitize_value(document)
        .as_document()
        .cloned()
        .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("expected a document, got {document}")))?;

    Ok(Document::from_iter(
        std::iter::once((ID_FIELD.to_string(), id.to_bson())).chain(fields),
    ))
}

pub(crate) fn restore_document(document: &Document) -> DocumentStoreResult<Bson> {
    Ok(KeySanitizer::restore_value(&Bson::Document(
        Document::from_iter(
            document
                .clone()
                .into_iter()
                .filter(|(k, _)| k != ID_FIELD)
        )
    )))
}

pub(crate) fn sort_document(sort: &[Sort]) -> Option<Document> {
    if sort.is_empty() {
        return None;
    }

    Some(Document::from_iter(sort.iter().map(|sort| {
        (
            KeySanitizer::sanitize(&sort.field),
            Bson::Int32(match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            }),
        )
    })))
}

pub(crate) fn projection_document(exclude: &[String]) -> Option<Document> {
    if exclude.is_empty() {
        return None;
    }

    Some(Document::from_iter(
        exclude
            .iter()
            .map(|field| (KeySanitizer::sanitize(field), Bson::Int32(0))),
    ))
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<(DocumentId, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        self.get_collection(collection)
            .insert_many(
                documents
                    .iter()
                    .map(|(id, doc)| prepare_document(id, doc))
                    .collect::<DocumentStoreResult<Vec<Document>>>()?,
            )
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn update_documents(&self, documents: Vec<(DocumentId, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let handle = self.get_collection(collection);

        for (id, doc) in documents {
            let result = handle
                .replace_one(doc! { ID_FIELD: id.to_bson() }, prepare_document(&id, &doc)?)
                .await
                .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

            if result.matched_count == 0 {
                return Err(DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()));
            }
        }

        Ok(())
    }

    async fn delete_documents(&self, ids: Vec<DocumentId>, collection: &str) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .delete_many(Self::ids_filter(&ids))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<DocumentId>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        self.find(collection, Self::ids_filter(&ids), FindOptions::default()).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        options.sort = sort_document(&query.sort);
        options.projection = projection_document(&query.exclude);

        self.find(collection, Self::filter(query.filter.as_ref())?, options).await
    }

    async fn count_documents(&self, filter: Option<Expr>, collection: &str) -> DocumentStoreResult<usize> {
        let count = self.get_collection(collection)
            .count_documents(Self::filter(filter.as_ref())?)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(count as usize)
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
