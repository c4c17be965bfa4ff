//! The Retrieve behavior.

use async_trait::async_trait;
use bson::Bson;
use serde_json::Value;

use super::{Behavior, ResourceContext};
use crate::{
    backend::StoreBackend,
    error::ResourceResult,
    request::{RequestArgs, Verb},
};

/// Answers GET with an identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Retrieve;

#[async_trait]
impl<B: StoreBackend + 'static> Behavior<B> for Retrieve {
    fn name(&self) -> &'static str {
        "retrieve"
    }

    fn verbs(&self) -> &'static [Verb] {
        &[Verb::Get]
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

        ctx.present(Bson::Document(record))
    }
}
