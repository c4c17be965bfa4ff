//! Query expression evaluation for in-memory document filtering.
//!
//! This module provides the evaluation engine for query expressions,
//! enabling filtering and comparison operations on BSON documents.

use std::{
    cmp::Ordering,
    collections::{HashMap, hash_map::Entry},
};
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use regex::{Regex, RegexBuilder};

use docrest_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so that `Int32`, `Int64` and `Double`
/// values compare with each other.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    /// Binary payloads, including UUIDs
    Binary(&'a [u8]),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Binary(binary) => Comparable::Binary(&binary.bytes),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Binary(_) => 5,
            Comparable::ObjectId(_) => 6,
            Comparable::Bool(_) => 7,
            Comparable::DateTime(_) => 8,
        }
    }

    /// Total order used for sorting: values of different types order by type, values
    /// of one type that don't compare are equal.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }

    fn as_str(&self) -> Option<&'a str> {
        match self {
            Comparable::String(s) => Some(*s),
            _ => None,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Binary(a), Comparable::Binary(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().partial_cmp(&b.bytes()),
            (Comparable::Binary(a), Comparable::Binary(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}


/// Pattern source and case flag for the case-insensitive and regex string operators.
fn pattern_source(op: &FieldOp, needle: &str) -> (String, bool) {
    let escaped = regex::escape(needle);
    match op {
        FieldOp::IExact => (format!("^{escaped}$"), true),
        FieldOp::IContains => (escaped, true),
        FieldOp::IStartsWith => (format!("^{escaped}"), true),
        FieldOp::IEndsWith => (format!("{escaped}$"), true),
        _ => (needle.to_string(), false),
    }
}

/// Compiled patterns keyed by source and case flag.
type PatternCache = HashMap<(String, bool), Regex>;

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
    patterns: PatternCache,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document, patterns: PatternCache::new() }
    }

    /// Compiles a pattern once per evaluator and reuses it afterwards.
    fn pattern(&mut self, op: &FieldOp, needle: &str) -> DocumentStoreResult<&Regex> {
        match self.patterns.entry(pattern_source(op, needle)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let (source, insensitive) = entry.key();
                let regex = RegexBuilder::new(source)
                    .case_insensitive(*insensitive)
                    .build()
                    .map_err(|e| DocumentStoreError::InvalidQuery(format!("invalid pattern '{needle}': {e}")))?;
                Ok(entry.insert(regex))
            }
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Keeps the documents matching `expr`, preserving their order.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Bson>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut matched = Vec::new();
        let mut patterns = PatternCache::new();

        for doc in documents {
            let fields = doc
                .as_document()
                .ok_or_else(|| DocumentStoreError::InvalidDocument(format!("expected a document, got {doc}")))?;

            // The compiled patterns carry over from one document to the next.
            let mut evaluator = DocumentEvaluator { document: fields, patterns };
            let keep = evaluator.evaluate(expr);
            patterns = evaluator.patterns;

            if keep? {
                matched.push(doc.clone());
            }
        }

        Ok(matched)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        let exists = !matches!(self.document.get(field), None | Some(Bson::Null));
        Ok(exists == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            // A missing field matches only the negative operators.
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        match op {
            FieldOp::Eq => Ok(match &left {
                Comparable::Array(items) if !matches!(right, Comparable::Array(_)) => {
                    items.iter().any(|item| item == &right)
                }
                _ => left == right,
            }),
            FieldOp::Ne => Ok(match &left {
                Comparable::Array(items) if !matches!(right, Comparable::Array(_)) => {
                    !items.iter().any(|item| item == &right)
                }
                _ => left != right,
            }),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                match left.partial_cmp(&right) {
                    Some(ordering) => Ok(match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    }),
                    None => Ok(false),
                }
            },
            FieldOp::Contains => match left {
                Comparable::Array(array) => Ok(array.iter().any(|item| item == &right)),
                Comparable::String(haystack) => Ok(right.as_str().is_some_and(|needle| haystack.contains(needle))),
                _ => Ok(false),
            },
            FieldOp::NotContains => match left {
                Comparable::Array(array) => Ok(!array.iter().any(|item| item == &right)),
                Comparable::String(haystack) => Ok(!right.as_str().is_some_and(|needle| haystack.contains(needle))),
                _ => Ok(true),
            },
            FieldOp::StartsWith => match (left.as_str(), right.as_str()) {
                (Some(haystack), Some(needle)) => Ok(haystack.starts_with(needle)),
                _ => Ok(false),
            },
            FieldOp::EndsWith => match (left.as_str(), right.as_str()) {
                (Some(haystack), Some(needle)) => Ok(haystack.ends_with(needle)),
                _ => Ok(false),
            },
            FieldOp::IExact | FieldOp::IContains | FieldOp::IStartsWith | FieldOp::IEndsWith | FieldOp::Regex => {
                match (left.as_str(), right.as_str()) {
                    (Some(haystack), Some(needle)) => Ok(self.pattern(op, needle)?.is_match(haystack)),
                    _ => Ok(false),
                }
            },
            FieldOp::AnyOf => Ok(match (left, right) {
                (Comparable::Array(array), Comparable::Array(values)) => {
                    values.iter().any(|val| array.iter().any(|item| item == val))
                },
                (Comparable::Array(array), single_value) => array.iter().any(|item| item == &single_value),
                (single_value, Comparable::Array(values)) => values.iter().any(|val| val == &single_value),
                (a, b) => a == b,
            }),
            FieldOp::NoneOf => Ok(match (left, right) {
                (Comparable::Array(array), Comparable::Array(values)) => {
                    !values.iter().any(|val| array.iter().any(|item| item == val))
                },
                (Comparable::Array(array), single_value) => !array.iter().any(|item| item == &single_value),
                (single_value, Comparable::Array(values)) => !values.iter().any(|val| val == &single_value),
                (a, b) => a != b,
            }),
            FieldOp::All => Ok(match (left, right) {
                (Comparable::Array(array), Comparable::Array(values)) => {
                    values.iter().all(|val| array.iter().any(|item| item == val))
                },
                (Comparable::Array(array), single_value) => array.iter().any(|item| item == &single_value),
                _ => false,
            }),
            FieldOp::Size => match (field_value, value) {
                (Bson::Array(items), Bson::Int32(n)) => Ok(i64::try_from(items.len()).ok() == Some(i64::from(*n))),
                (Bson::Array(items), Bson::Int64(n)) => Ok(i64::try_from(items.len()).ok() == Some(*n)),
                (_, Bson::Int32(_) | Bson::Int64(_)) => Ok(false),
                _ => Err(DocumentStoreError::InvalidQuery(format!("size of {field} must be an integer, got {value}"))),
            },
        }
    }
}
