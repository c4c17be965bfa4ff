//! The Update behavior.

use async_trait::async_trait;
use bson::Bson;
use serde_json::Value;
use tracing::{debug, info};

use super::{Behavior, ResourceContext};
use crate::{
    backend::StoreBackend,
    error::{ResourceError, ResourceResult},
    request::{RequestArgs, Verb},
    schema::coerce::coerce,
};

/// Answers PUT and PATCH with a partial update.
///
/// Only fields present with a non-null value are coerced and written. The
/// identifier and the read-only fields are never rewritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct Update;

#[async_trait]
impl<B: StoreBackend + 'static> Behavior<B> for Update {
    fn name(&self) -> &'static str {
        "update"
    }

    fn verbs(&self) -> &'static [Verb] {
        &[Verb::Put, Verb::Patch]
    }

    async fn handle(
        &self,
        ctx: &ResourceContext<B>,
        verb: Verb,
        args: &RequestArgs,
    ) -> ResourceResult<Value> {
        ctx.authorize(verb, args)?;

        let id = ctx.identifier(args)?;
        let mut record = ctx.fetch(&id).await?;
        ctx.authorize_object(verb, args, &record)?;

        let parsed = ctx.parsers().fields.parse_present(args)?;
        debug!(resource = ctx.name(), %id, arguments = ?parsed, "Update");

        for (field, kind) in ctx.fields() {
            if ctx.is_read_only(&field.name) {
                continue;
            }
            if let Some(value) = parsed.get(&field.name) {
                let value = coerce(kind, value.clone(), ctx.store()).await?;
                record.insert(field.name.clone(), value);
            }
        }

        ctx.collection()
            .update(vec![(id.clone(), Bson::Document(record.clone()))])
            .await
            .map_err(|e| ResourceError::Persistence(e.to_string()))?;

        info!(resource = ctx.name(), %id, "Updated");
        ctx.present(Bson::Document(record))
    }
}
