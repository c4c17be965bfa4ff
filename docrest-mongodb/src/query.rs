//! Query translation from the docrest AST to MongoDB query syntax.
//!
//! This module translates docrest's abstract query expressions into
//! MongoDB BSON documents for execution by the MongoDB query engine.

use bson::{Document, Bson, doc};

use docrest_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::DocumentStoreError,
};

use crate::sanitizer::KeySanitizer;


/// Translates docrest query expressions into MongoDB query documents.
///
/// This struct implements the [`QueryVisitor`] trait to convert abstract
/// query expressions into MongoDB's native BSON query syntax. Field names are
/// sanitized the same way stored keys are.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    fn pattern(op: &FieldOp, value: &Bson) -> Result<Document, DocumentStoreError> {
        let Bson::String(s) = value else {
            return Err(DocumentStoreError::InvalidQuery(format!("{op:?} operator requires a string value")));
        };
        let escaped = regex::escape(s);

        Ok(match op {
            FieldOp::Contains => doc! { "$regex": escaped },
            FieldOp::StartsWith => doc! { "$regex": format!("^{escaped}") },
            FieldOp::EndsWith => doc! { "$regex": format!("{escaped}$") },
            FieldOp::IExact => doc! { "$regex": format!("^{escaped}$"), "$options": "i" },
            FieldOp::IContains => doc! { "$regex": escaped, "$options": "i" },
            FieldOp::IStartsWith => doc! { "$regex": format!("^{escaped}"), "$options": "i" },
            FieldOp::IEndsWith => doc! { "$regex": format!("{escaped}$"), "$options": "i" },
            _ => doc! { "$regex": s.as_str() },
        })
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // $not is only valid per field, so negate whole expressions with $nor
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        let field = KeySanitizer::sanitize(field);

        Ok(if should_exist {
            doc! { field: { "$exists": true, "$ne": Bson::Null } }
        } else {
            doc! { "$or": [
                { field.clone(): { "$exists": false } },
                { field: Bson::Null },
            ] }
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            KeySanitizer::sanitize(field): match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(_) => Self::pattern(op, value)?,
                    Bson::Array(arr) => doc! { "$all": arr },
                    other => doc! { "$eq": other },
                },
                FieldOp::NotContains => match value {
                    Bson::String(_) => doc! { "$not": Self::pattern(&FieldOp::Contains, value)? },
                    Bson::Array(arr) => doc! { "$nin": arr },
                    other => doc! { "$ne": other },
                },
                FieldOp::StartsWith
                | FieldOp::EndsWith
                | FieldOp::IExact
                | FieldOp::IContains
                | FieldOp::IStartsWith
                | FieldOp::IEndsWith
                | FieldOp::Regex => Self::pattern(op, value)?,
                FieldOp::AnyOf => doc! { "$in": value },
                FieldOp::NoneOf => doc! { "$nin": value },
                FieldOp::All => doc! { "$all": value },
                FieldOp::Size => match value {
                    Bson::Int32(_) | Bson::Int64(_) => doc! { "$size": value },
                    _ => return Err(DocumentStoreError::InvalidQuery("size operator requires an integer value".to_string())),
                },
            }
        })
    }
}
