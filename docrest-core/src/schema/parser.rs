//! Request parsers and the per-resource parser set.
//!
//! A [`Parser`] is an ordered, name-unique list of [`ArgumentSpec`]s. A resource builds
//! its [`ResourceParsers`] once and shares them read-only afterwards.

use bson::{Bson, Document};

use super::{
    Schema,
    argument::{ArgumentSpec, Coercer, synthesize},
    filter::expand,
};
use crate::{error::ResourceResult, page::PaginationConfig, request::RequestArgs};

/// An ordered set of request arguments, unique by name.
///
/// Adding an argument whose name is already present replaces the earlier one in
/// place, which is how caller overrides take effect.
///
/// # Example
///
/// ```ignore
/// use docrest::schema::{argument::{ArgumentSpec, Coercer}, parser::Parser};
///
/// let parser = Parser::new()
///     .with(ArgumentSpec::new("q", Coercer::String))
///     .with(ArgumentSpec::new("limit", Coercer::Integer).with_default(20_i64));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    arguments: Vec<ArgumentSpec>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `spec`, replacing an argument of the same name.
    pub fn add(&mut self, spec: ArgumentSpec) -> &mut Self {
        match self
            .arguments
            .iter_mut()
            .find(|existing| existing.name == spec.name)
        {
            Some(existing) => *existing = spec,
            None => self.arguments.push(spec),
        }
        self
    }

    pub fn with(mut self, spec: ArgumentSpec) -> Self {
        self.add(spec);
        self
    }

    /// Adds every argument of `other`, in order, with [`Parser::add`] semantics.
    pub fn merge(&mut self, other: &Parser) -> &mut Self {
        for spec in other.iter() {
            self.add(spec.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments
            .iter()
            .find(|spec| spec.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.arguments.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .map(|spec| spec.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Parses every argument, falling back to argument defaults.
    ///
    /// The result holds, in parser order, each argument that was supplied or has a
    /// default. Absent arguments without a default are left out.
    pub fn parse(&self, args: &RequestArgs) -> ResourceResult<Document> {
        self.parse_with(args, true)
    }

    /// Parses only the arguments actually supplied, ignoring defaults.
    pub fn parse_present(&self, args: &RequestArgs) -> ResourceResult<Document> {
        self.parse_with(args, false)
    }

    fn parse_with(&self, args: &RequestArgs, defaults: bool) -> ResourceResult<Document> {
        let mut parsed = Document::new();

        for spec in &self.arguments {
            let value = match spec.extract(args)? {
                Some(value) => Some(value),
                None if defaults => spec.default.clone(),
                None => None,
            };

            if let Some(value) = value.filter(|value| !matches!(value, Bson::Null)) {
                parsed.insert(spec.name.clone(), value);
            }
        }

        Ok(parsed)
    }
}

/// The parsers of one resource: primary fields, filters and pagination.
#[derive(Debug, Clone)]
pub struct ResourceParsers {
    /// The identifier argument followed by one argument per supported field.
    pub fields: Parser,
    /// The generated filter arguments of every field except the identifier and
    /// excluded fields.
    pub filters: Parser,
    /// Page number and page size.
    pub page: Parser,
}

impl ResourceParsers {
    pub fn builder(schema: &Schema) -> ResourceParsersBuilder<'_> {
        ResourceParsersBuilder::new(schema)
    }
}

/// Builder for [`ResourceParsers`].
#[derive(Debug)]
pub struct ResourceParsersBuilder<'a> {
    schema: &'a Schema,
    field_overrides: Option<Parser>,
    pagination: PaginationConfig,
    exclude: Vec<String>,
}

/// Request key accepted for the identifier argument when the identifier field has
/// another name.
pub const ID_ALIAS: &str = "id";

impl<'a> ResourceParsersBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            field_overrides: None,
            pagination: PaginationConfig::default(),
            exclude: Vec::new(),
        }
    }

    /// Arguments replacing (or adding to) the generated primary field arguments.
    pub fn field_overrides(mut self, overrides: Parser) -> Self {
        self.field_overrides = Some(overrides);
        self
    }

    /// Pagination keys and defaults for the page parser.
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Fields that get no filter arguments.
    pub fn exclude(mut self, fields: &[String]) -> Self {
        self.exclude = fields.to_vec();
        self
    }

    pub fn build(self) -> ResourceParsers {
        let schema = self.schema;

        // The identifier shape comes from the collection, not from a declared field.
        let mut identifier = ArgumentSpec::new(schema.id_field.clone(), Coercer::Identifier(schema.id_kind));
        if schema.id_field != ID_ALIAS && schema.field(ID_ALIAS).is_none() {
            identifier = identifier.with_alias(ID_ALIAS);
        }
        let mut fields = Parser::new().with(identifier);
        for field in schema
            .fields
            .iter()
            .filter(|field| field.name != schema.id_field)
        {
            for spec in synthesize(&field.name, field) {
                fields.add(spec);
            }
        }
        if let Some(overrides) = &self.field_overrides {
            fields.merge(overrides);
        }

        let mut filters = Parser::new();
        for field in schema.fields.iter().filter(|field| {
            field.name != schema.id_field && !self.exclude.contains(&field.name)
        }) {
            for spec in expand(&field.name, field) {
                filters.add(spec.argument);
            }
        }

        let page_size_default = i64::try_from(self.pagination.page_size_default).unwrap_or(i64::MAX);
        let page = Parser::new()
            .with(ArgumentSpec::new(self.pagination.page_key.clone(), Coercer::Integer).with_default(0_i64))
            .with(
                ArgumentSpec::new(self.pagination.page_size_key.clone(), Coercer::Integer)
                    .with_default(page_size_default),
            );

        ResourceParsers { fields, filters, page }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::IdKind,
        error::ResourceError,
        schema::{DocumentRef, FieldDescriptor, FieldType},
    };
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder("posts")
            .field(FieldDescriptor::string("title").required())
            .field(FieldDescriptor::int("views").with_default(0_i64))
            .field(FieldDescriptor::list("tags", FieldDescriptor::string("tag")))
            .field(FieldDescriptor::reference("author", DocumentRef::new("users", "username", IdKind::String)))
            .field(FieldDescriptor::new("created", FieldType::DateTime))
            .build()
    }

    #[test]
    fn duplicate_names_replace_in_place() {
        let mut parser = Parser::new()
            .with(ArgumentSpec::new("a", Coercer::String))
            .with(ArgumentSpec::new("b", Coercer::String));
        parser.add(ArgumentSpec::new("a", Coercer::Integer));

        assert_eq!(parser.names().collect::<Vec<_>>(), ["a", "b"]);
        assert!(matches!(parser.get("a").map(|spec| &spec.coercer), Some(Coercer::Integer)));
    }

    #[test]
    fn field_parser_starts_with_the_identifier() {
        let parsers = ResourceParsers::builder(&schema()).build();

        assert_eq!(
            parsers.fields.names().collect::<Vec<_>>(),
            ["id", "title", "views", "tags", "author"]
        );
        assert!(matches!(
            parsers.fields.get("id").map(|spec| &spec.coercer),
            Some(Coercer::Identifier(IdKind::ObjectId))
        ));
    }

    #[test]
    fn filter_parser_follows_field_order() {
        let parsers = ResourceParsers::builder(&schema()).build();
        let names: Vec<_> = parsers.filters.names().collect();

        assert_eq!(names.len(), 9 + 5 + 4 + 2);
        assert_eq!(names[0], "title__exact");
        assert_eq!(names[9], "views__ne");
        assert_eq!(names[14], "tags__in");
        assert_eq!(names[19], "author__nin");
    }

    #[test]
    fn overrides_replace_generated_arguments() {
        let overrides = Parser::new().with(ArgumentSpec::new("views", Coercer::String));
        let parsers = ResourceParsers::builder(&schema())
            .field_overrides(overrides)
            .build();

        let parsed = parsers
            .fields
            .parse_present(&RequestArgs::new().with_query("views", "many"))
            .unwrap();
        assert_eq!(parsed.get_str("views").unwrap(), "many");
    }

    #[test]
    fn defaults_apply_only_when_asked() {
        let parsers = ResourceParsers::builder(&schema()).build();
        let args = RequestArgs::new().with_body(json!({ "title": "hello", "tags": ["a", "b"] }));

        let full = parsers.fields.parse(&args).unwrap();
        assert_eq!(full.get_i64("views").unwrap(), 0);
        assert_eq!(full.get_array("tags").unwrap().len(), 2);

        let present = parsers.fields.parse_present(&args).unwrap();
        assert!(!present.contains_key("views"));
        assert!(!present.contains_key("id"));
    }

    #[test]
    fn page_parser_uses_configured_keys() {
        let config = PaginationConfig {
            page_size_key: "size".to_string(),
            page_size_default: 25,
            ..PaginationConfig::default()
        };
        let parsers = ResourceParsers::builder(&schema()).pagination(config).build();

        let parsed = parsers.page.parse(&RequestArgs::new().with_query("page", "2")).unwrap();
        assert_eq!(parsed.get_i64("page").unwrap(), 2);
        assert_eq!(parsed.get_i64("size").unwrap(), 25);
    }

    #[test]
    fn coercion_errors_surface() {
        let parsers = ResourceParsers::builder(&schema()).build();
        let result = parsers
            .filters
            .parse_present(&RequestArgs::new().with_query("views__gt", "lots"));

        assert!(matches!(result, Err(ResourceError::Validation(_))));
    }

    #[test]
    fn identifier_and_excluded_fields_get_no_filters() {
        let schema = Schema::builder("users")
            .id("username", IdKind::String)
            .field(FieldDescriptor::string("username"))
            .field(FieldDescriptor::int("age"))
            .field(FieldDescriptor::string("password"))
            .build();
        let parsers = ResourceParsers::builder(&schema)
            .exclude(&["password".to_string()])
            .build();

        let names: Vec<_> = parsers.filters.names().collect();
        assert_eq!(names, ["age__ne", "age__lt", "age__lte", "age__gt", "age__gte"]);
        assert!(parsers.fields.get("password").is_some());
    }

    #[test]
    fn renamed_identifiers_answer_to_id() {
        let schema = Schema::builder("users")
            .id("username", IdKind::String)
            .field(FieldDescriptor::string("username"))
            .build();
        let parsers = ResourceParsers::builder(&schema).build();

        let parsed = parsers
            .fields
            .parse_present(&RequestArgs::new().with_query("id", "alice"))
            .unwrap();
        assert_eq!(parsed.get_str("username").unwrap(), "alice");

        let plain = ResourceParsers::builder(&self::schema()).build();
        assert!(plain.fields.get("id").unwrap().aliases.is_empty());
    }
}
