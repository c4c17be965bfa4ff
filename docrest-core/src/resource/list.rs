//! The List behavior: filtered, ordered and optionally paginated listing.

use async_trait::async_trait;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{Behavior, ResourceContext};
use crate::{
    backend::StoreBackend,
    error::{ResourceError, ResourceResult},
    page::{Page, PaginationConfig, PaginationParams},
    query::{Expr, Filter, Query},
    request::{RequestArgs, Verb},
    schema::{filter::filter_expr, parser::Parser},
};

/// Listing settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Ordering keys, most significant first; `-field` sorts descending.
    #[serde(default)]
    pub order_by: Vec<String>,
}

impl ListOptions {
    pub fn order_by<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }
}

/// Answers GET without an identifier.
///
/// A page size of zero lists without pagination, capped by `max_count`.
#[derive(Debug, Clone, Default)]
pub struct List {
    options: ListOptions,
    filter_overrides: Option<Parser>,
    fixed_filter: Option<Expr>,
}

impl List {
    pub fn new(options: ListOptions) -> Self {
        Self { options, filter_overrides: None, fixed_filter: None }
    }

    /// Extra filter arguments, parsed with their defaults applied.
    ///
    /// An override shadows the generated filter of the same name, which is then
    /// never read. Names of the form `<field>__<suffix>` become that operator,
    /// other names an equality match.
    pub fn with_filter_overrides(mut self, overrides: Parser) -> Self {
        self.filter_overrides = Some(overrides);
        self
    }

    /// A server-side filter combined with every request's filters. Requests can
    /// narrow the listing but never widen it.
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.fixed_filter = Some(filter);
        self
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    fn filters<B: StoreBackend>(
        &self,
        ctx: &ResourceContext<B>,
        args: &RequestArgs,
    ) -> ResourceResult<Option<Expr>> {
        let overrides = self.filter_overrides.as_ref();
        let mut parsed = Document::new();

        for spec in ctx.parsers().filters.iter() {
            if overrides.is_some_and(|overrides| overrides.get(&spec.name).is_some()) {
                continue;
            }
            if let Some(value) = spec.extract(args)?.filter(|value| !matches!(value, Bson::Null)) {
                parsed.insert(spec.name.clone(), value);
            }
        }
        if let Some(overrides) = overrides {
            for (name, value) in overrides.parse(args)? {
                parsed.insert(name, value);
            }
        }

        debug!(resource = ctx.name(), filters = ?parsed, "List filters");

        let mut exprs: Vec<Expr> = self
            .fixed_filter
            .iter()
            .cloned()
            .chain(parsed.into_iter().map(|(name, value)| filter_expr(&name, value)))
            .collect();

        Ok(match exprs.len() {
            0 => None,
            1 => exprs.pop(),
            _ => Some(Filter::and(exprs)),
        })
    }
}

fn page_number(parsed: &Document, key: &str, default: usize) -> ResourceResult<usize> {
    match parsed.get(key) {
        Some(Bson::Int64(n)) => {
            usize::try_from(*n).map_err(|_| ResourceError::Validation(format!("{key} must not be negative")))
        }
        Some(other) => Err(ResourceError::Validation(format!("{key}: {other} is not a valid integer"))),
        None => Ok(default),
    }
}

#[async_trait]
impl<B: StoreBackend + 'static> Behavior<B> for List {
    fn name(&self) -> &'static str {
        "list"
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

        let filter = self.filters(ctx, args)?;
        let base = Query::builder()
            .order_by(&self.options.order_by)
            .exclude(ctx.excluded().iter().cloned());
        let base = match &filter {
            Some(expr) => base.filter(expr.clone()),
            None => base,
        };

        let config = &self.options.pagination;
        let collection = ctx.collection();

        let params = if config.enabled {
            let paging = ctx.parsers().page.parse(args)?;
            Some(PaginationParams::new(
                page_number(&paging, &config.page_key, 0)?,
                page_number(&paging, &config.page_size_key, config.page_size_default)?,
            ))
        } else {
            None
        };

        let Some(params) = params.filter(|params| params.page_size > 0) else {
            let query = match config.max_count {
                0 => base.build(),
                max => base.limit(max).build(),
            };
            let data = collection
                .query(query)
                .await?
                .into_iter()
                .map(|record| ctx.present(record))
                .collect::<ResourceResult<Vec<_>>>()?;

            return Ok(json!({ "data": data }));
        };

        // Count and page read separately; concurrent writes may shift the window.
        let total = collection.count(filter).await?;

        let data = match params.window(total) {
            Some((start, end)) if end > start => collection
                .query(base.offset(start).limit(end - start).build())
                .await?
                .into_iter()
                .map(|record| ctx.present(record))
                .collect::<ResourceResult<Vec<_>>>()?,
            _ => Vec::new(),
        };

        debug!(
            resource = ctx.name(),
            total,
            page = params.page,
            page_size = params.page_size,
            returned = data.len(),
            "Listed"
        );

        Ok(Page::builder(data)
            .with_total(total)
            .with_page(params.page)
            .with_page_size(params.page_size)
            .build()
            .into_body(&config.page_key, &config.page_size_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ListOptions = serde_json::from_value(json!({ "order_by": ["-age"] })).unwrap();

        assert_eq!(options.order_by, vec!["-age".to_string()]);
        assert_eq!(options.pagination, PaginationConfig::default());
    }

    #[test]
    fn negative_pages_are_rejected() {
        let parsed = bson::doc! { "page": -1_i64 };

        assert!(matches!(page_number(&parsed, "page", 0), Err(ResourceError::Validation(_))));
        assert_eq!(page_number(&bson::doc! {}, "page", 4).unwrap(), 4);
    }
}
