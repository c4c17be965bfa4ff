//! The Delete behavior.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::{Behavior, ResourceContext};
use crate::{
    backend::StoreBackend,
    error::{ResourceError, ResourceResult},
    request::{RequestArgs, Verb},
};

/// Answers DELETE, replying `{"msg": "ok"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

#[async_trait]
impl<B: StoreBackend + 'static> Behavior<B> for Delete {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn verbs(&self) -> &'static [Verb] {
        &[Verb::Delete]
    }

    async fn handle(
        &self,
        ctx: &ResourceContext<B>,
        verb: Verb,
        args: &RequestArgs,
    ) -> ResourceResult<Value> {
        ctx.authorize(verb, args)?;

        let id = ctx.identifier(args)?;
        let record = ctx.fetch(&id).await?;
        ctx.authorize_object(verb, args, &record)?;

        ctx.collection()
            .delete(vec![id.clone()])
            .await
            .map_err(|e| ResourceError::Persistence(e.to_string()))?;

        info!(resource = ctx.name(), %id, "Deleted");
        Ok(json!({ "msg": "ok" }))
    }
}
