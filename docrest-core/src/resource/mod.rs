//! Composable CRUD resources over a document store.
//!
//! A [`Resource`] pairs a [`Schema`] with a store and the behaviors it was composed
//! from ([`List`], [`Create`], [`Retrieve`], [`Update`], [`Delete`]). Its parsers are
//! generated once when the resource is built. Each request then runs the permission
//! hooks, parses and coerces its arguments and delegates to the store.
//!
//! # Example
//!
//! ```ignore
//! use docrest::prelude::*;
//!
//! let posts = Resource::builder(post_schema, store)
//!     .exclude(["secret"])
//!     .read_only(["created_by"])
//!     .list(List::new(ListOptions::default().order_by(["-views"])))
//!     .create()
//!     .retrieve()
//!     .update()
//!     .delete()
//!     .build();
//!
//! let response = posts.handle(Verb::Get, &RequestArgs::new().with_query("page", "1")).await;
//! ```

pub mod create;
pub mod delete;
pub mod list;
pub mod permission;
pub mod retrieve;
pub mod update;

use async_trait::async_trait;
use bson::{Bson, Document};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, error, warn};

use crate::{
    backend::StoreBackend,
    collection::Collection,
    document::{DocumentId, to_json},
    error::{DocumentStoreError, PermissionDenied, ResourceError, ResourceResult},
    request::{RequestArgs, Response, Verb},
    schema::{DocumentType, FieldDescriptor, Kind, Schema, parser::{Parser, ResourceParsers}},
    store::DocumentStore,
};

pub use create::{Create, CreatedHook};
pub use delete::Delete;
pub use list::{List, ListOptions};
pub use permission::{Hook, HookContext, ObjectHook, ObjectPermissions, Permissions};
pub use retrieve::Retrieve;
pub use update::Update;

/// One CRUD capability of a resource.
#[async_trait]
pub trait Behavior<B: StoreBackend>: Send + Sync + Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The verbs this behavior answers.
    fn verbs(&self) -> &'static [Verb];

    /// Handles one request, returning the response body.
    async fn handle(
        &self,
        ctx: &ResourceContext<B>,
        verb: Verb,
        args: &RequestArgs,
    ) -> ResourceResult<Value>;
}

/// Everything the behaviors of one resource share.
#[derive(Debug)]
pub struct ResourceContext<B: StoreBackend> {
    schema: Schema,
    fields: Vec<(FieldDescriptor, Kind)>,
    parsers: Arc<ResourceParsers>,
    store: DocumentStore<B>,
    permissions: Permissions,
    object_permissions: ObjectPermissions,
    exclude: Vec<String>,
    read_only: Vec<String>,
}

impl<B: StoreBackend> ResourceContext<B> {
    /// The resource name, which is its collection name.
    pub fn name(&self) -> &str {
        &self.schema.collection
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn parsers(&self) -> &ResourceParsers {
        &self.parsers
    }

    pub fn store(&self) -> &DocumentStore<B> {
        &self.store
    }

    pub fn collection(&self) -> Collection<'_, B> {
        self.store.collection(&self.schema.collection)
    }

    /// Supported non-identifier fields with their kinds, in declaration order.
    pub fn fields(&self) -> &[(FieldDescriptor, Kind)] {
        &self.fields
    }

    pub fn excluded(&self) -> &[String] {
        &self.exclude
    }

    pub fn is_read_only(&self, field: &str) -> bool {
        self.read_only
            .iter()
            .any(|name| name == field)
    }

    /// Runs the permission hooks for `verb`.
    pub fn authorize(&self, verb: Verb, args: &RequestArgs) -> ResourceResult<()> {
        let hook_ctx = HookContext { resource: self.name(), verb, args };
        self.permissions
            .check(&hook_ctx)
            .map_err(ResourceError::from)
    }

    /// Runs the object hooks against the loaded `record`, stopping at the first denial.
    pub fn authorize_object(&self, verb: Verb, args: &RequestArgs, record: &Document) -> ResourceResult<()> {
        let hook_ctx = HookContext { resource: self.name(), verb, args };
        self.object_permissions
            .check(&hook_ctx, record)
            .map_err(ResourceError::from)
    }

    /// The identifier named by the request.
    ///
    /// # Errors
    ///
    /// [`ResourceError::Validation`] when it is absent or has the wrong shape.
    pub fn identifier(&self, args: &RequestArgs) -> ResourceResult<DocumentId> {
        let id_field = &self.schema.id_field;
        let value = match self.parsers.fields.get(id_field) {
            Some(spec) => spec.extract(args)?,
            None => None,
        };

        match value {
            Some(value) => self.to_id(&value),
            None => Err(ResourceError::Validation(format!("{id_field} is required"))),
        }
    }

    /// Converts a parsed identifier value into an id of the collection's kind.
    pub fn to_id(&self, value: &Bson) -> ResourceResult<DocumentId> {
        match DocumentId::from_bson(value) {
            Some(id) if id.kind() == self.schema.id_kind => Ok(id),
            Some(DocumentId::String(raw)) => self
                .schema
                .id_kind
                .parse(&raw)
                .map_err(ResourceError::Validation),
            _ => Err(ResourceError::Validation(format!(
                "{value} is not a valid {}",
                self.schema.id_field
            ))),
        }
    }

    /// Loads the record with identifier `id`.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] when there is no such record.
    pub async fn fetch(&self, id: &DocumentId) -> ResourceResult<Document> {
        match self.collection().find_one(id).await? {
            Some(Bson::Document(record)) => Ok(record),
            Some(other) => Err(DocumentStoreError::InvalidDocument(format!(
                "expected a document in {}, got {other}",
                self.name()
            ))
            .into()),
            None => Err(ResourceError::NotFound(format!(
                "could not find {} with {}={}",
                self.name(),
                self.schema.id_field,
                id
            ))),
        }
    }

    /// Serializes a record for a response, without the excluded fields.
    pub fn present(&self, record: Bson) -> ResourceResult<Value> {
        let record = match record {
            Bson::Document(mut doc) => {
                for field in &self.exclude {
                    doc.remove(field);
                }
                Bson::Document(doc)
            }
            other => other,
        };

        Ok(to_json(&record)?)
    }
}

/// A schema-driven resource composed of CRUD behaviors.
#[derive(Debug)]
pub struct Resource<B: StoreBackend> {
    context: ResourceContext<B>,
    list: Option<List>,
    create: Option<Create>,
    retrieve: Option<Retrieve>,
    update: Option<Update>,
    delete: Option<Delete>,
}

impl<B: StoreBackend + 'static> Resource<B> {
    pub fn builder(schema: Schema, store: DocumentStore<B>) -> ResourceBuilder<B> {
        ResourceBuilder::new(schema, store)
    }

    pub fn context(&self) -> &ResourceContext<B> {
        &self.context
    }

    /// Verbs answered by at least one behavior.
    pub fn verbs(&self) -> Vec<Verb> {
        let mut verbs: Vec<Verb> = Vec::new();
        for behavior in self.behaviors() {
            for verb in behavior.verbs() {
                if !verbs.contains(verb) {
                    verbs.push(*verb);
                }
            }
        }
        verbs
    }

    fn behaviors(&self) -> impl Iterator<Item = &dyn Behavior<B>> {
        let list = self.list.as_ref().map(|b| b as &dyn Behavior<B>);
        let create = self.create.as_ref().map(|b| b as &dyn Behavior<B>);
        let retrieve = self.retrieve.as_ref().map(|b| b as &dyn Behavior<B>);
        let update = self.update.as_ref().map(|b| b as &dyn Behavior<B>);
        let delete = self.delete.as_ref().map(|b| b as &dyn Behavior<B>);

        [list, create, retrieve, update, delete]
            .into_iter()
            .flatten()
    }

    /// Picks the behavior answering `verb`.
    ///
    /// GET goes to Retrieve when the identifier is present, otherwise to List, and
    /// falls back to Retrieve (which then reports the missing identifier).
    fn route(&self, verb: Verb, args: &RequestArgs) -> Option<&dyn Behavior<B>> {
        if verb == Verb::Get {
            let id_field = &self.context.schema.id_field;
            let has_id = match self.context.parsers.fields.get(id_field) {
                Some(spec) => spec.keys().any(|key| args.contains(key)),
                None => args.contains(id_field),
            };
            return match (&self.retrieve, &self.list) {
                (Some(retrieve), _) if has_id => Some(retrieve as &dyn Behavior<B>),
                (_, Some(list)) => Some(list as &dyn Behavior<B>),
                (Some(retrieve), None) => Some(retrieve as &dyn Behavior<B>),
                (None, None) => None,
            };
        }

        self.behaviors()
            .find(|behavior| behavior.verbs().contains(&verb))
    }

    /// Handles a request and returns its body or error.
    pub async fn dispatch(&self, verb: Verb, args: &RequestArgs) -> ResourceResult<Value> {
        let behavior = self
            .route(verb, args)
            .ok_or_else(|| ResourceError::MethodNotAllowed(verb.to_string()))?;

        debug!(resource = self.context.name(), %verb, behavior = behavior.name(), "Dispatch");
        behavior
            .handle(&self.context, verb, args)
            .await
    }

    /// Handles a request, rendering errors as `{msg, error}` bodies.
    pub async fn handle(&self, verb: Verb, args: &RequestArgs) -> Response {
        match self.dispatch(verb, args).await {
            Ok(body) => Response::ok(body),
            Err(e) => {
                let status = e.status();
                if status >= 500 {
                    error!(resource = self.context.name(), %verb, status, error = %e, "Request failed");
                } else {
                    warn!(resource = self.context.name(), %verb, status, error = %e, "Request rejected");
                }
                Response { status, body: e.to_body() }
            }
        }
    }
}

/// Builder for [`Resource`].
///
/// Behaviors are opt-in; a resource answers only the verbs of the behaviors it was
/// given.
#[derive(Debug)]
pub struct ResourceBuilder<B: StoreBackend> {
    schema: Schema,
    store: DocumentStore<B>,
    exclude: Vec<String>,
    read_only: Vec<String>,
    permissions: Permissions,
    object_permissions: ObjectPermissions,
    field_overrides: Option<Parser>,
    list: Option<List>,
    create: Option<Create>,
    retrieve: Option<Retrieve>,
    update: Option<Update>,
    delete: Option<Delete>,
}

impl<B: StoreBackend + 'static> ResourceBuilder<B> {
    pub fn new(schema: Schema, store: DocumentStore<B>) -> Self {
        Self {
            schema,
            store,
            exclude: Vec::new(),
            read_only: Vec::new(),
            permissions: Permissions::None,
            object_permissions: ObjectPermissions::default(),
            field_overrides: None,
            list: None,
            create: None,
            retrieve: None,
            update: None,
            delete: None,
        }
    }

    /// Starts a builder for the schema of `D`.
    pub fn for_document<D: DocumentType>(store: DocumentStore<B>) -> Self {
        Self::new(D::schema(), store)
    }

    /// Fields never included in responses.
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Fields updates never rewrite.
    pub fn read_only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_only
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Appends a hook checked against the record that Retrieve, Update or Delete
    /// loaded, before it is returned or changed.
    pub fn object_permission<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HookContext<'_>, &Document) -> Result<(), PermissionDenied> + Send + Sync + 'static,
    {
        self.object_permissions.push(hook);
        self
    }

    /// Arguments replacing (or adding to) the generated primary field arguments.
    pub fn field_overrides(mut self, overrides: Parser) -> Self {
        self.field_overrides = Some(overrides);
        self
    }

    pub fn list(mut self, list: List) -> Self {
        self.list = Some(list);
        self
    }

    pub fn create(self) -> Self {
        self.create_with(Create::new())
    }

    /// Enables a configured Create, such as one with a post-create hook.
    pub fn create_with(mut self, create: Create) -> Self {
        self.create = Some(create);
        self
    }

    pub fn retrieve(mut self) -> Self {
        self.retrieve = Some(Retrieve);
        self
    }

    pub fn update(mut self) -> Self {
        self.update = Some(Update);
        self
    }

    pub fn delete(mut self) -> Self {
        self.delete = Some(Delete);
        self
    }

    /// Enables all five behaviors.
    pub fn crud(self, list: List) -> Self {
        self.list(list)
            .create()
            .retrieve()
            .update()
            .delete()
    }

    /// Generates the parsers and assembles the resource.
    pub fn build(self) -> Resource<B> {
        let mut parsers = ResourceParsers::builder(&self.schema).exclude(&self.exclude);
        if let Some(list) = &self.list {
            parsers = parsers.pagination(list.options().pagination.clone());
        }
        if let Some(overrides) = self.field_overrides {
            parsers = parsers.field_overrides(overrides);
        }
        let parsers = Arc::new(parsers.build());

        let fields = self
            .schema
            .fields
            .iter()
            .filter(|field| field.name != self.schema.id_field)
            .map(|field| (field.clone(), field.kind()))
            .filter(|(_, kind)| kind.is_supported())
            .collect();

        debug!(
            resource = %self.schema.collection,
            fields = parsers.fields.len(),
            filters = parsers.filters.len(),
            "Built resource parsers"
        );

        Resource {
            context: ResourceContext {
                schema: self.schema,
                fields,
                parsers,
                store: self.store,
                permissions: self.permissions,
                object_permissions: self.object_permissions,
                exclude: self.exclude,
                read_only: self.read_only,
            },
            list: self.list,
            create: self.create,
            retrieve: self.retrieve,
            update: self.update,
            delete: self.delete,
        }
    }
}
