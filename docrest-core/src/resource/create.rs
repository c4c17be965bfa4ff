//! The Create behavior.

use async_trait::async_trait;
use bson::{Bson, Document};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{debug, info};

use super::{Behavior, HookContext, ResourceContext};
use crate::{
    backend::StoreBackend,
    error::{ResourceError, ResourceResult},
    request::{RequestArgs, Verb},
    schema::coerce::coerce,
};

/// Called with each record right after it is inserted.
pub type CreatedHook = Arc<dyn Fn(&HookContext<'_>, &Document) + Send + Sync>;

/// Answers POST by building and inserting a new record.
///
/// Object id and UUID identifiers are generated when the request doesn't carry one;
/// other identifier kinds must be supplied. A required field with neither a value nor
/// a default is a validation error.
///
/// # Example
///
/// ```ignore
/// let create = Create::new().after(|ctx, record| {
///     tracing::info!(resource = ctx.resource, ?record, "Audit");
/// });
/// ```
#[derive(Clone, Default)]
pub struct Create {
    after: Option<CreatedHook>,
}

impl Create {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook run once the record is stored. It sees the full record,
    /// excluded fields included, and cannot fail the request.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HookContext<'_>, &Document) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Create {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Create")
            .field("after", &self.after.as_ref().map(|_| ".."))
            .finish()
    }
}

#[async_trait]
impl<B: StoreBackend + 'static> Behavior<B> for Create {
    fn name(&self) -> &'static str {
        "create"
    }

    fn verbs(&self) -> &'static [Verb] {
        &[Verb::Post]
    }

    async fn handle(
        &self,
        ctx: &ResourceContext<B>,
        verb: Verb,
        args: &RequestArgs,
    ) -> ResourceResult<Value> {
        ctx.authorize(verb, args)?;

        let parsed = ctx.parsers().fields.parse(args)?;
        debug!(resource = ctx.name(), arguments = ?parsed, "Create");

        let id_field = &ctx.schema().id_field;
        let id = match parsed.get(id_field) {
            Some(value) => ctx.to_id(value)?,
            None => ctx
                .schema()
                .id_kind
                .generate()
                .ok_or_else(|| ResourceError::Validation(format!("{id_field} is required")))?,
        };

        let mut record = Document::new();
        record.insert(id_field.clone(), id.to_bson());

        for (field, kind) in ctx.fields() {
            match parsed.get(&field.name) {
                Some(value) => {
                    let value = coerce(kind, value.clone(), ctx.store()).await?;
                    record.insert(field.name.clone(), value);
                }
                None if field.required => {
                    return Err(ResourceError::Validation(format!("{} is required", field.name)));
                }
                None => {}
            }
        }

        ctx.collection()
            .insert(vec![(id.clone(), Bson::Document(record.clone()))])
            .await
            .map_err(|e| ResourceError::Persistence(e.to_string()))?;

        info!(resource = ctx.name(), %id, "Created");
        if let Some(after) = &self.after {
            after(&HookContext { resource: ctx.name(), verb, args }, &record);
        }
        ctx.present(Bson::Document(record))
    }
}
