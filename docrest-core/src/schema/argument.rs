//! Request argument specifications and their synthesis from schema fields.

use bson::Bson;
use serde_json::Value;
use std::{fmt, sync::Arc};

use super::{FieldDescriptor, Kind, NumberKind, StringKind};
use crate::{
    document::{IdKind, from_json},
    error::{ResourceError, ResourceResult},
    request::RequestArgs,
};

/// A caller-supplied coercion function. The error message is reported as a validation
/// error prefixed with the argument name.
pub type CustomCoercer = Arc<dyn Fn(&Value) -> Result<Bson, String> + Send + Sync>;

/// Where an argument value may be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Body,
    Query,
}

/// Converts one raw request value into a typed value.
#[derive(Clone)]
pub enum Coercer {
    /// Text; numbers and booleans are accepted in their textual form.
    String,
    /// 24 character hex object id.
    ObjectId,
    Integer,
    Float,
    /// `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`.
    Boolean,
    /// An identifier of the given shape.
    Identifier(IdKind),
    /// A JSON object, or its serialized text.
    Document,
    /// A GeoJSON object or coordinate array, or its serialized text.
    Geometry,
    /// A JSON array (or its serialized text), coerced element-wise.
    List(Box<Coercer>),
    /// Any value, unchanged.
    Passthrough,
    /// A regular expression, checked for syntax and kept as text.
    Pattern,
    Custom(CustomCoercer),
}

impl fmt::Debug for Coercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coercer::String => f.write_str("String"),
            Coercer::ObjectId => f.write_str("ObjectId"),
            Coercer::Integer => f.write_str("Integer"),
            Coercer::Float => f.write_str("Float"),
            Coercer::Boolean => f.write_str("Boolean"),
            Coercer::Identifier(kind) => f.debug_tuple("Identifier").field(kind).finish(),
            Coercer::Document => f.write_str("Document"),
            Coercer::Geometry => f.write_str("Geometry"),
            Coercer::List(inner) => f.debug_tuple("List").field(inner).finish(),
            Coercer::Passthrough => f.write_str("Passthrough"),
            Coercer::Pattern => f.write_str("Pattern"),
            Coercer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Coercer {
    /// The coercer for values of `kind`, or `None` for unsupported kinds.
    pub fn for_kind(kind: &Kind) -> Option<Coercer> {
        let coercer = match kind {
            Kind::String(StringKind::Text) => Coercer::String,
            Kind::String(StringKind::ObjectId) => Coercer::ObjectId,
            Kind::Number(NumberKind::Integer) => Coercer::Integer,
            Kind::Number(NumberKind::Float) => Coercer::Float,
            Kind::Boolean => Coercer::Boolean,
            Kind::Reference(target) => Coercer::Identifier(target.id_kind),
            Kind::Composite => Coercer::Document,
            Kind::Geometry => Coercer::Geometry,
            Kind::List(inner) => {
                Coercer::List(Box::new(Coercer::for_kind(inner).unwrap_or(Coercer::Passthrough)))
            }
            Kind::Dynamic => Coercer::Passthrough,
            Kind::Unsupported => return None,
        };
        Some(coercer)
    }

    /// Applies this coercer to the raw value of argument `name`.
    ///
    /// # Errors
    ///
    /// [`ResourceError::MalformedInput`] for unparseable serialized payloads and
    /// [`ResourceError::Validation`] for any other shape mismatch.
    pub fn apply(&self, name: &str, raw: &Value) -> ResourceResult<Bson> {
        let invalid = |what: &str| ResourceError::Validation(format!("{name}: {raw} is not a valid {what}"));

        match self {
            Coercer::String => match raw {
                Value::String(s) => Ok(Bson::String(s.clone())),
                Value::Number(n) => Ok(Bson::String(n.to_string())),
                Value::Bool(b) => Ok(Bson::String(b.to_string())),
                _ => Err(invalid("string")),
            },
            Coercer::ObjectId => IdKind::ObjectId
                .parse_value(raw)
                .map(|id| id.to_bson())
                .map_err(|msg| ResourceError::Validation(format!("{name}: {msg}"))),
            Coercer::Identifier(kind) => kind
                .parse_value(raw)
                .map(|id| id.to_bson())
                .map_err(|msg| ResourceError::Validation(format!("{name}: {msg}"))),
            Coercer::Integer => parse_integer(raw)
                .map(Bson::Int64)
                .ok_or_else(|| invalid("integer")),
            Coercer::Float => parse_float(raw)
                .map(Bson::Double)
                .ok_or_else(|| invalid("number")),
            Coercer::Boolean => parse_bool(raw)
                .map(Bson::Boolean)
                .ok_or_else(|| invalid("boolean")),
            Coercer::Document => match parse_payload(name, raw)? {
                value @ Value::Object(_) => to_bson(name, &value),
                _ => Err(ResourceError::MalformedInput(format!("{name}: expected a JSON object"))),
            },
            Coercer::Geometry => match parse_payload(name, raw)? {
                value @ (Value::Object(_) | Value::Array(_)) => to_bson(name, &value),
                _ => Err(ResourceError::MalformedInput(format!(
                    "{name}: expected a GeoJSON object or coordinates"
                ))),
            },
            Coercer::List(inner) => match parse_payload(name, raw)? {
                Value::Array(items) => items
                    .iter()
                    .map(|item| inner.apply(name, item))
                    .collect::<ResourceResult<Vec<_>>>()
                    .map(Bson::Array),
                _ => Err(invalid("list")),
            },
            Coercer::Passthrough => to_bson(name, raw),
            Coercer::Pattern => match raw {
                Value::String(s) => regex::Regex::new(s)
                    .map(|_| Bson::String(s.clone()))
                    .map_err(|e| ResourceError::Validation(format!("{name}: invalid pattern: {e}"))),
                _ => Err(invalid("pattern")),
            },
            Coercer::Custom(coerce) => {
                coerce(raw).map_err(|msg| ResourceError::Validation(format!("{name}: {msg}")))
            }
        }
    }
}

fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite()),
        _ => None,
    }
}

fn parse_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Serialized text is parsed as JSON, structured values pass through.
fn parse_payload(name: &str, raw: &Value) -> ResourceResult<Value> {
    match raw {
        Value::String(text) => serde_json::from_str(text)
            .map_err(|e| ResourceError::MalformedInput(format!("{name}: {e}"))),
        other => Ok(other.clone()),
    }
}

fn to_bson(name: &str, value: &Value) -> ResourceResult<Bson> {
    from_json(value).map_err(|e| ResourceError::Validation(format!("{name}: {e}")))
}

/// One typed request argument.
///
/// # Example
///
/// ```ignore
/// use docrest::schema::argument::{ArgumentSpec, Coercer};
///
/// let tags = ArgumentSpec::new("tags", Coercer::String).multivalued();
/// let page = ArgumentSpec::new("page", Coercer::Integer).with_default(0_i64);
/// ```
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub name: String,
    pub coercer: Coercer,
    /// Value used when the argument is absent and defaults are applied.
    pub default: Option<Bson>,
    /// Locations searched, in order.
    pub sources: Vec<Source>,
    /// Whether the argument collects every supplied value into a list.
    pub multivalued: bool,
    /// Alternative request keys, searched after `name` within each source.
    pub aliases: Vec<String>,
}

impl ArgumentSpec {
    /// A single-valued argument read from the body, then the query string.
    pub fn new(name: impl Into<String>, coercer: Coercer) -> Self {
        Self {
            name: name.into(),
            coercer,
            default: None,
            sources: vec![Source::Body, Source::Query],
            multivalued: false,
            aliases: Vec::new(),
        }
    }

    pub fn multivalued(mut self) -> Self {
        self.multivalued = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Bson>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The request keys this argument answers to.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Reads and coerces this argument from `args`.
    ///
    /// A single-valued argument takes the first value found, searching the sources
    /// in order. A multivalued argument collects the values of every source: body
    /// arrays contribute their elements and repeated query keys contribute each
    /// occurrence. Absent and null values yield `Ok(None)`; defaults are not applied.
    pub fn extract(&self, args: &RequestArgs) -> ResourceResult<Option<Bson>> {
        let Some(raw) = self.raw_values(args) else {
            return Ok(None);
        };

        if self.multivalued {
            let values = raw
                .iter()
                .map(|value| self.coercer.apply(&self.name, value))
                .collect::<ResourceResult<Vec<_>>>()?;
            return Ok(Some(Bson::Array(values)));
        }

        match raw.first() {
            Some(value) => self.coercer.apply(&self.name, value).map(Some),
            None => Ok(None),
        }
    }

    fn raw_values(&self, args: &RequestArgs) -> Option<Vec<Value>> {
        let mut found: Option<Vec<Value>> = None;

        for source in &self.sources {
            let values: Option<Vec<Value>> = match source {
                Source::Body => match self.keys().find_map(|key| args.body_value(key)) {
                    None | Some(Value::Null) => None,
                    Some(Value::Array(items)) if self.multivalued => Some(
                        items
                            .iter()
                            .filter(|item| !item.is_null())
                            .cloned()
                            .collect(),
                    ),
                    Some(value) => Some(vec![value.clone()]),
                },
                Source::Query => self.keys().find_map(|key| {
                    let values: Vec<Value> = args
                        .query_values(key)
                        .map(|value| Value::String(value.to_string()))
                        .collect();
                    (!values.is_empty()).then_some(values)
                }),
            };

            if let Some(values) = values {
                found
                    .get_or_insert_with(Vec::new)
                    .extend(values);
                if !self.multivalued {
                    break;
                }
            }
        }

        found
    }
}

/// Derives the request arguments of a schema field.
///
/// Every supported kind yields exactly one argument named `name`; list and dynamic
/// fields are multivalued. Unsupported fields yield none. The field default becomes
/// the argument default.
pub fn synthesize(name: &str, field: &FieldDescriptor) -> Vec<ArgumentSpec> {
    let kind = field.kind();

    let spec = match &kind {
        Kind::Unsupported => return Vec::new(),
        Kind::List(inner) => ArgumentSpec::new(
            name,
            Coercer::for_kind(inner).unwrap_or(Coercer::Passthrough),
        )
        .multivalued(),
        Kind::Dynamic => ArgumentSpec::new(name, Coercer::Passthrough).multivalued(),
        other => match Coercer::for_kind(other) {
            Some(coercer) => ArgumentSpec::new(name, coercer),
            None => return Vec::new(),
        },
    };

    let spec = match &field.default {
        Some(default) => spec.with_default(default.clone()),
        None => spec,
    };

    vec![spec]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DocumentRef, FieldType};
    use bson::oid::ObjectId;
    use std::sync::Arc;
    use serde_json::json;

    fn extract(spec: &ArgumentSpec, args: &RequestArgs) -> ResourceResult<Option<Bson>> {
        spec.extract(args)
    }

    #[test]
    fn scalar_text_becomes_typed() {
        let spec = &synthesize("age", &FieldDescriptor::int("age"))[0];
        let args = RequestArgs::new().with_query("age", "42");

        assert_eq!(extract(spec, &args).unwrap(), Some(Bson::Int64(42)));
    }

    #[test]
    fn bad_scalar_is_a_validation_error() {
        let spec = &synthesize("age", &FieldDescriptor::int("age"))[0];
        let args = RequestArgs::new().with_query("age", "forty");

        assert!(matches!(extract(spec, &args), Err(ResourceError::Validation(_))));
    }

    #[test]
    fn booleans_accept_common_spellings() {
        let spec = ArgumentSpec::new("on", Coercer::Boolean);

        for (raw, expected) in [("yes", true), ("0", false), ("TRUE", true), ("off", false)] {
            let args = RequestArgs::new().with_query("on", raw);
            assert_eq!(extract(&spec, &args).unwrap(), Some(Bson::Boolean(expected)), "{raw}");
        }
    }

    #[test]
    fn list_arguments_keep_element_order() {
        let spec = &synthesize("scores", &FieldDescriptor::list("scores", FieldDescriptor::int("s")))[0];
        assert!(spec.multivalued);

        let args = RequestArgs::new()
            .with_query("scores", "1")
            .with_query("scores", "2")
            .with_query("scores", "3");
        assert_eq!(
            extract(spec, &args).unwrap(),
            Some(Bson::Array(vec![Bson::Int64(1), Bson::Int64(2), Bson::Int64(3)]))
        );

        let args = RequestArgs::new().with_body(json!({ "scores": ["3", 2, "1"] }));
        assert_eq!(
            extract(spec, &args).unwrap(),
            Some(Bson::Array(vec![Bson::Int64(3), Bson::Int64(2), Bson::Int64(1)]))
        );
    }

    #[test]
    fn body_wins_for_single_values() {
        let spec = ArgumentSpec::new("name", Coercer::String);
        let args = RequestArgs::new()
            .with_body(json!({ "name": "body" }))
            .with_query("name", "query");

        assert_eq!(extract(&spec, &args).unwrap(), Some(Bson::String("body".into())));
    }

    #[test]
    fn composite_payload_is_parsed() {
        let spec = &synthesize("meta", &FieldDescriptor::dict("meta"))[0];

        let args = RequestArgs::new().with_query("meta", r#"{"a": 1}"#);
        match extract(spec, &args).unwrap() {
            Some(Bson::Document(doc)) => assert!(doc.contains_key("a")),
            other => panic!("unexpected {other:?}"),
        }

        let args = RequestArgs::new().with_query("meta", "{not json");
        assert!(matches!(extract(spec, &args), Err(ResourceError::MalformedInput(_))));
    }

    #[test]
    fn geometry_accepts_coordinates() {
        let spec = &synthesize("at", &FieldDescriptor::point("at"))[0];
        let args = RequestArgs::new().with_body(json!({ "at": { "type": "Point", "coordinates": [1.5, 2.0] } }));

        assert!(matches!(extract(spec, &args).unwrap(), Some(Bson::Document(_))));
    }

    #[test]
    fn references_take_the_target_id_shape() {
        let target = DocumentRef::new("authors", "id", IdKind::ObjectId);
        let spec = &synthesize("author", &FieldDescriptor::reference("author", target))[0];
        let oid = ObjectId::new();

        let args = RequestArgs::new().with_query("author", oid.to_hex());
        assert_eq!(extract(spec, &args).unwrap(), Some(Bson::ObjectId(oid)));

        let args = RequestArgs::new().with_query("author", "nope");
        assert!(matches!(extract(spec, &args), Err(ResourceError::Validation(_))));
    }

    #[test]
    fn dynamic_fields_are_multivalued_passthrough() {
        let spec = &synthesize("extra", &FieldDescriptor::dynamic("extra"))[0];
        let args = RequestArgs::new().with_body(json!({ "extra": "x" }));

        assert_eq!(extract(spec, &args).unwrap(), Some(Bson::Array(vec![Bson::String("x".into())])));
    }

    #[test]
    fn unsupported_fields_yield_nothing() {
        assert!(synthesize("at", &FieldDescriptor::new("at", FieldType::DateTime)).is_empty());
    }

    #[test]
    fn defaults_carry_over_but_are_not_extracted() {
        let field = FieldDescriptor::int("level").with_default(1_i64);
        let spec = &synthesize("level", &field)[0];

        assert_eq!(spec.default, Some(Bson::Int64(1)));
        assert_eq!(extract(spec, &RequestArgs::new()).unwrap(), None);
    }

    #[test]
    fn custom_coercer_errors_name_the_argument() {
        let upper: CustomCoercer = Arc::new(|raw: &Value| match raw.as_str() {
            Some(s) if !s.is_empty() => Ok(Bson::String(s.to_uppercase())),
            _ => Err("must be a non-empty string".to_string()),
        });
        let spec = ArgumentSpec::new("code", Coercer::Custom(upper));

        let args = RequestArgs::new().with_query("code", "ab");
        assert_eq!(extract(&spec, &args).unwrap(), Some(Bson::String("AB".into())));

        let args = RequestArgs::new().with_body(json!({ "code": 3 }));
        match extract(&spec, &args) {
            Err(ResourceError::Validation(msg)) => assert_eq!(msg, "code: must be a non-empty string"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn patterns_are_checked_but_kept_as_text() {
        let spec = ArgumentSpec::new("name__match", Coercer::Pattern);

        let args = RequestArgs::new().with_query("name__match", "^a.*z$");
        assert_eq!(extract(&spec, &args).unwrap(), Some(Bson::String("^a.*z$".into())));

        let args = RequestArgs::new().with_query("name__match", "(");
        assert!(matches!(extract(&spec, &args), Err(ResourceError::Validation(_))));
    }

    #[test]
    fn aliases_are_searched_after_the_name() {
        let spec = ArgumentSpec::new("username", Coercer::String).with_alias("id");
        assert_eq!(spec.keys().collect::<Vec<_>>(), ["username", "id"]);

        let args = RequestArgs::new().with_query("id", "alice");
        assert_eq!(extract(&spec, &args).unwrap(), Some(Bson::String("alice".into())));

        let args = RequestArgs::new()
            .with_query("id", "alias")
            .with_query("username", "name");
        assert_eq!(extract(&spec, &args).unwrap(), Some(Bson::String("name".into())));
    }
}
