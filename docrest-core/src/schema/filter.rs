//! Filter operator expansion.
//!
//! Each supported field kind expands into a fixed list of suffixed filter arguments,
//! named `<field>__<suffix>`. A parsed filter argument translates back into a query
//! [`Expr`] through [`filter_expr`].

use bson::Bson;
use std::fmt;

use super::{
    FieldDescriptor, Kind,
    argument::{ArgumentSpec, Coercer},
};
use crate::query::{Expr, FieldOp};

/// Separator between the field name and the operator suffix.
pub const SEPARATOR: &str = "__";

/// Suffixed filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Match,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    All,
    Size,
}

impl FilterOperator {
    pub const STRING: [FilterOperator; 9] = [
        FilterOperator::Exact,
        FilterOperator::IExact,
        FilterOperator::Contains,
        FilterOperator::IContains,
        FilterOperator::StartsWith,
        FilterOperator::IStartsWith,
        FilterOperator::EndsWith,
        FilterOperator::IEndsWith,
        FilterOperator::Match,
    ];

    pub const NUMBER: [FilterOperator; 5] = [
        FilterOperator::Ne,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Gt,
        FilterOperator::Gte,
    ];

    pub const LIST: [FilterOperator; 4] = [
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::All,
        FilterOperator::Size,
    ];

    pub const REFERENCE: [FilterOperator; 2] = [FilterOperator::In, FilterOperator::NotIn];

    /// The operators valid for fields of `kind`.
    pub fn for_kind(kind: &Kind) -> &'static [FilterOperator] {
        match kind {
            Kind::String(_) => &Self::STRING,
            Kind::Number(_) => &Self::NUMBER,
            Kind::List(_) => &Self::LIST,
            Kind::Reference(_) => &Self::REFERENCE,
            Kind::Boolean
            | Kind::Composite
            | Kind::Geometry
            | Kind::Dynamic
            | Kind::Unsupported => &[],
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            FilterOperator::Exact => "exact",
            FilterOperator::IExact => "iexact",
            FilterOperator::Contains => "contains",
            FilterOperator::IContains => "icontains",
            FilterOperator::StartsWith => "startswith",
            FilterOperator::IStartsWith => "istartswith",
            FilterOperator::EndsWith => "endswith",
            FilterOperator::IEndsWith => "iendswith",
            FilterOperator::Match => "match",
            FilterOperator::Ne => "ne",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "nin",
            FilterOperator::All => "all",
            FilterOperator::Size => "size",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let op = match suffix {
            "exact" => FilterOperator::Exact,
            "iexact" => FilterOperator::IExact,
            "contains" => FilterOperator::Contains,
            "icontains" => FilterOperator::IContains,
            "startswith" => FilterOperator::StartsWith,
            "istartswith" => FilterOperator::IStartsWith,
            "endswith" => FilterOperator::EndsWith,
            "iendswith" => FilterOperator::IEndsWith,
            "match" => FilterOperator::Match,
            "ne" => FilterOperator::Ne,
            "lt" => FilterOperator::Lt,
            "lte" => FilterOperator::Lte,
            "gt" => FilterOperator::Gt,
            "gte" => FilterOperator::Gte,
            "in" => FilterOperator::In,
            "nin" => FilterOperator::NotIn,
            "all" => FilterOperator::All,
            "size" => FilterOperator::Size,
            _ => return None,
        };
        Some(op)
    }

    /// The query operator this filter translates to.
    pub fn field_op(&self) -> FieldOp {
        match self {
            FilterOperator::Exact => FieldOp::Eq,
            FilterOperator::IExact => FieldOp::IExact,
            FilterOperator::Contains => FieldOp::Contains,
            FilterOperator::IContains => FieldOp::IContains,
            FilterOperator::StartsWith => FieldOp::StartsWith,
            FilterOperator::IStartsWith => FieldOp::IStartsWith,
            FilterOperator::EndsWith => FieldOp::EndsWith,
            FilterOperator::IEndsWith => FieldOp::IEndsWith,
            FilterOperator::Match => FieldOp::Regex,
            FilterOperator::Ne => FieldOp::Ne,
            FilterOperator::Lt => FieldOp::Lt,
            FilterOperator::Lte => FieldOp::Lte,
            FilterOperator::Gt => FieldOp::Gt,
            FilterOperator::Gte => FieldOp::Gte,
            FilterOperator::In => FieldOp::AnyOf,
            FilterOperator::NotIn => FieldOp::NoneOf,
            FilterOperator::All => FieldOp::All,
            FilterOperator::Size => FieldOp::Size,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One generated filter argument.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// The schema field being filtered.
    pub field: String,
    pub operator: FilterOperator,
    /// The request argument carrying the filter value.
    pub argument: ArgumentSpec,
}

impl FilterSpec {
    /// The argument name, `<field>__<suffix>`.
    pub fn name(&self) -> &str {
        &self.argument.name
    }

    pub fn to_expr(&self, value: Bson) -> Expr {
        Expr::field(self.field.clone(), self.operator.field_op(), value)
    }
}

/// Expands a schema field into its filter specifications.
///
/// The output depends only on the field kind: operators come in the fixed order of
/// [`FilterOperator::for_kind`]. Membership filters of list and reference fields are
/// multivalued and coerce each element like the field's element; `size` takes an
/// integer and `match` a syntactically valid pattern.
pub fn expand(name: &str, field: &FieldDescriptor) -> Vec<FilterSpec> {
    let kind = field.kind();

    let element = match &kind {
        Kind::List(inner) => Coercer::for_kind(inner).unwrap_or(Coercer::Passthrough),
        other => match Coercer::for_kind(other) {
            Some(coercer) => coercer,
            None => return Vec::new(),
        },
    };

    FilterOperator::for_kind(&kind)
        .iter()
        .map(|&operator| {
            let arg_name = format!("{name}{SEPARATOR}{}", operator.suffix());
            let argument = match operator {
                FilterOperator::Size => ArgumentSpec::new(arg_name, Coercer::Integer),
                FilterOperator::Match => ArgumentSpec::new(arg_name, Coercer::Pattern),
                FilterOperator::In | FilterOperator::NotIn | FilterOperator::All => {
                    ArgumentSpec::new(arg_name, element.clone()).multivalued()
                }
                _ => ArgumentSpec::new(arg_name, element.clone()),
            };

            FilterSpec { field: name.to_string(), operator, argument }
        })
        .collect()
}

/// Translates a parsed filter argument into a query expression.
///
/// Names of the form `<field>__<suffix>` with a known suffix map to that operator on
/// `field`; any other name is an equality match on the field of that name.
pub fn filter_expr(name: &str, value: Bson) -> Expr {
    if let Some((field, suffix)) = name.rsplit_once(SEPARATOR) {
        if let Some(operator) = FilterOperator::from_suffix(suffix) {
            if !field.is_empty() {
                return Expr::field(field.to_string(), operator.field_op(), value);
            }
        }
    }

    Expr::field(name.to_string(), FieldOp::Eq, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::IdKind,
        schema::{DocumentRef, FieldType},
    };

    fn suffixes(name: &str, field: &FieldDescriptor) -> Vec<String> {
        expand(name, field)
            .iter()
            .map(|spec| spec.name().to_string())
            .collect()
    }

    #[test]
    fn string_fields_expand_to_text_operators() {
        assert_eq!(
            suffixes("name", &FieldDescriptor::string("name")),
            [
                "name__exact",
                "name__iexact",
                "name__contains",
                "name__icontains",
                "name__startswith",
                "name__istartswith",
                "name__endswith",
                "name__iendswith",
                "name__match",
            ]
        );
    }

    #[test]
    fn match_filters_take_a_pattern() {
        let specs = expand("name", &FieldDescriptor::string("name"));
        let pattern = specs.iter().find(|spec| spec.operator == FilterOperator::Match).unwrap();

        assert!(matches!(pattern.argument.coercer, Coercer::Pattern));
        assert!(matches!(specs[0].argument.coercer, Coercer::String));
    }

    #[test]
    fn number_fields_expand_to_comparisons() {
        assert_eq!(
            suffixes("age", &FieldDescriptor::int("age")),
            ["age__ne", "age__lt", "age__lte", "age__gt", "age__gte"]
        );
    }

    #[test]
    fn list_and_reference_fields_expand_to_membership() {
        let tags = expand("tags", &FieldDescriptor::list("tags", FieldDescriptor::string("t")));
        let names: Vec<_> = tags.iter().map(FilterSpec::name).collect();
        assert_eq!(names, ["tags__in", "tags__nin", "tags__all", "tags__size"]);
        assert!(tags[0].argument.multivalued);
        assert!(matches!(tags[3].argument.coercer, Coercer::Integer));
        assert!(!tags[3].argument.multivalued);

        let author = FieldDescriptor::reference("author", DocumentRef::new("users", "id", IdKind::Integer));
        let specs = expand("author", &author);
        assert_eq!(specs.len(), 2);
        assert!(matches!(specs[0].argument.coercer, Coercer::Identifier(IdKind::Integer)));
    }

    #[test]
    fn other_kinds_expand_to_nothing() {
        for field_type in [
            FieldType::Boolean,
            FieldType::Dict,
            FieldType::Point,
            FieldType::Dynamic,
            FieldType::DateTime,
        ] {
            assert!(expand("f", &FieldDescriptor::new("f", field_type)).is_empty(), "{field_type:?}");
        }
    }

    #[test]
    fn expansion_ignores_the_field_name() {
        let field = FieldDescriptor::float("x");
        let a: Vec<_> = expand("a", &field).iter().map(|s| s.operator).collect();
        let b: Vec<_> = expand("b_long_name", &field).iter().map(|s| s.operator).collect();

        assert_eq!(a, b);
    }

    #[test]
    fn names_translate_to_expressions() {
        match filter_expr("age__gte", Bson::Int64(3)) {
            Expr::Field { field, op, .. } => {
                assert_eq!(field, "age");
                assert_eq!(op, FieldOp::Gte);
            }
            other => panic!("unexpected {other:?}"),
        }

        match filter_expr("owner__id__in", Bson::Array(vec![])) {
            Expr::Field { field, op, .. } => {
                assert_eq!(field, "owner__id");
                assert_eq!(op, FieldOp::AnyOf);
            }
            other => panic!("unexpected {other:?}"),
        }

        match filter_expr("status", Bson::String("open".into())) {
            Expr::Field { field, op, .. } => {
                assert_eq!(field, "status");
                assert_eq!(op, FieldOp::Eq);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
